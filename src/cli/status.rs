//! Show current and latest versions.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::CliConfig;
use super::common::CommandContext;

/// Fetch the latest release and compare it with the running version.
///
/// Never prompts, downloads or installs.
#[derive(Args, Debug)]
pub struct StatusCommand {
    /// Version of the running application
    #[arg(long, value_name = "VERSION")]
    pub current_version: Option<String>,
}

impl StatusCommand {
    pub async fn execute(self, config: &CliConfig) -> Result<()> {
        let ctx = CommandContext::load(config, self.current_version).await?;
        let flow = ctx.flow(true, false)?;
        let update = &ctx.global.update;

        let release = flow.latest_release().await?;

        println!("Current version: {}", flow.current_version().yellow());
        println!("Latest version:  {}", release.tag_name.green());
        println!("Ordering:        {}", update.version_ordering);
        match release.installer_url(&update.installer_extension) {
            Some(url) => println!("Installer:       {url}"),
            None => println!(
                "Installer:       {}",
                format!("none (no asset ending in {})", update.installer_extension).red()
            ),
        }

        if let Some(choice) = ctx.choices().load().await? {
            println!(
                "Remembered:      {} {} ({})",
                if choice.accepted { "install" } else { "skip" },
                choice.version,
                choice.decided_at.format("%Y-%m-%d %H:%M UTC")
            );
        }

        if flow.is_newer(&release.tag_name) {
            println!(
                "{}",
                format!("Update available: {} -> {}", flow.current_version(), release.tag_name)
                    .green()
                    .bold()
            );
            println!("Run `kvm-updater check` to install it");
        } else {
            println!("{}", "Up to date".green());
        }

        Ok(())
    }
}
