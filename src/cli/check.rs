//! One-shot update check.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::CliConfig;
use super::common::{CommandContext, report_outcome};

/// Run one update cycle.
///
/// Exits successfully when there is no update, when the update is declined,
/// and after an update is applied (the relaunch command, if configured, is
/// started first).
#[derive(Args, Debug)]
pub struct CheckCommand {
    /// Install without asking; remembered selections are ignored
    #[arg(short, long)]
    pub yes: bool,

    /// Version of the running application
    #[arg(long, value_name = "VERSION")]
    pub current_version: Option<String>,
}

impl CheckCommand {
    pub async fn execute(self, config: &CliConfig) -> Result<()> {
        let ctx = CommandContext::load(config, self.current_version).await?;
        let flow = ctx.flow(self.yes, config.show_progress())?;

        println!(
            "{}",
            format!("Checking for updates (current version {})...", flow.current_version()).cyan()
        );

        report_outcome(flow.check_for_updates().await)
    }
}
