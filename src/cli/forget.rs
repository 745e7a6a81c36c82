//! Clear the remembered selection.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::CliConfig;
use super::common::CommandContext;

#[derive(Args, Debug)]
pub struct ForgetCommand {}

impl ForgetCommand {
    pub async fn execute(self, config: &CliConfig) -> Result<()> {
        let ctx = CommandContext::load(config, None).await?;
        let store = ctx.choices();

        if store.clear().await? {
            println!("{}", format!("Removed {}", store.path().display()).green());
        } else {
            println!("No remembered selection");
        }
        Ok(())
    }
}
