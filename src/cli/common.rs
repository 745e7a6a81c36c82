//! Shared setup for CLI commands

use anyhow::{Result, bail};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::cli::CliConfig;
use crate::config::GlobalConfig;
use crate::update::{
    CheckOutcome, ChoiceStore, StaticPrompt, TerminalPrompt, UpdateFlow, UpdatePrompt,
};

/// Loaded configuration plus the per-command overrides.
#[derive(Debug)]
pub struct CommandContext {
    /// Resolved path of `config.toml` (it may not exist)
    pub config_path: PathBuf,
    /// Parsed configuration, or defaults
    pub global: GlobalConfig,
    /// `--current-version` override
    pub current_version: Option<String>,
}

impl CommandContext {
    pub async fn load(cli: &CliConfig, current_version: Option<String>) -> Result<Self> {
        let config_path = GlobalConfig::resolve_path(cli.config_path.clone())?;
        let global = GlobalConfig::load_with_optional(Some(config_path.clone())).await?;

        Ok(Self {
            config_path,
            global,
            current_version,
        })
    }

    #[must_use]
    pub fn choices(&self) -> ChoiceStore {
        GlobalConfig::choice_store(&self.config_path)
    }

    /// Build a flow for this command.
    ///
    /// With `assume_yes` every prompt is answered "install" and remembered
    /// selections are ignored.
    pub fn flow(&self, assume_yes: bool, show_progress: bool) -> Result<UpdateFlow> {
        let prompt: Arc<dyn UpdatePrompt> = if assume_yes {
            Arc::new(StaticPrompt::accept())
        } else {
            Arc::new(TerminalPrompt::new())
        };

        let mut flow = UpdateFlow::new(&self.global.update, prompt)?.with_progress(show_progress);
        if !assume_yes {
            flow = flow.with_choice_store(self.choices());
        }
        if let Some(version) = &self.current_version {
            flow = flow.with_current_version(version.clone());
        }
        Ok(flow)
    }
}

/// Print a finished cycle for the user.
///
/// Failures are returned as errors so `main` can render them. An applied
/// update starts the relaunch command, if configured.
pub fn report_outcome(outcome: CheckOutcome) -> Result<()> {
    match outcome {
        CheckOutcome::NoUpdate {
            current,
            latest,
        } => {
            println!(
                "{}",
                format!("You are on the latest version ({current}, latest release {latest})")
                    .green()
            );
            Ok(())
        }
        CheckOutcome::Declined {
            latest,
        } => {
            println!("{}", format!("Update to {latest} skipped").yellow());
            Ok(())
        }
        CheckOutcome::UpdateApplied(request) => {
            println!("{}", format!("Updated to {}", request.version).green().bold());
            request.relaunch()
        }
        CheckOutcome::Busy => bail!("An update check is already running"),
        CheckOutcome::CheckFailed(e)
        | CheckOutcome::DownloadFailed(e)
        | CheckOutcome::InstallFailed(e) => Err(e.into()),
    }
}

/// Log a cycle that finished in the background.
pub fn log_outcome(outcome: &CheckOutcome) {
    match outcome {
        CheckOutcome::NoUpdate {
            current,
            ..
        } => info!("No update available ({})", current),
        CheckOutcome::Declined {
            latest,
        } => info!("Update to {} skipped", latest),
        CheckOutcome::Busy => info!("Previous update check still running"),
        CheckOutcome::UpdateApplied(request) => info!("Updated to {}", request.version),
        CheckOutcome::CheckFailed(e)
        | CheckOutcome::DownloadFailed(e)
        | CheckOutcome::InstallFailed(e) => warn!("Update cycle failed: {}", e),
    }
}
