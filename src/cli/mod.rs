//! Command-line interface for kvm-updater.
//!
//! # Commands
//!
//! - `check` - run one update cycle, prompting in the terminal
//! - `watch` - check now and then periodically until interrupted
//! - `status` - show current and latest version without installing
//! - `forget` - clear the remembered "install / skip" selection
//!
//! # Global Options
//!
//! - `--verbose` / `--quiet` - log level (`debug` / `error`)
//! - `--config <path>` - configuration file (also `KVM_UPDATER_CONFIG`)
//! - `--no-progress` - hide the download progress bar
//!
//! # Examples
//!
//! ```bash
//! kvm-updater check
//! kvm-updater --no-progress check --yes
//! kvm-updater --config ./updater.toml status
//! kvm-updater --verbose watch
//! ```

mod check;
pub mod common;
mod forget;
mod status;
mod watch;


use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Settings derived from the global flags, shared by every command.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter override. `None` keeps `RUST_LOG` (or `info`).
    pub log_level: Option<String>,

    /// Hide download progress.
    pub no_progress: bool,

    /// Explicit configuration file.
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    #[must_use]
    pub fn with_no_progress(mut self, no_progress: bool) -> Self {
        self.no_progress = no_progress;
        self
    }

    #[must_use]
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Whether downloads should draw a progress bar.
    #[must_use]
    pub const fn show_progress(&self) -> bool {
        !self.no_progress
    }

    /// The filter the subscriber will use.
    #[must_use]
    pub fn env_filter(&self) -> EnvFilter {
        match &self.log_level {
            Some(level) => EnvFilter::new(level),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        }
    }

    /// Install the global `tracing` subscriber on stderr.
    ///
    /// Does nothing if a subscriber is already installed.
    pub fn init_logging(&self) {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(self.env_filter())
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// Check for, download and silently install monitor-controller-kvm updates.
#[derive(Parser, Debug)]
#[command(
    name = "kvm-updater",
    about = "Check for and install monitor-controller-kvm updates",
    version,
    author,
    long_about = "kvm-updater polls the monitor-controller-kvm release feed, asks before installing, \
                  downloads the installer to a temporary directory and runs it silently."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true, env = "KVM_UPDATER_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Hide download progress
    #[arg(long, global = true)]
    no_progress: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one update check, prompting before install
    Check(check::CheckCommand),

    /// Check now and then periodically until interrupted
    Watch(watch::WatchCommand),

    /// Show the current and latest version
    Status(status::StatusCommand),

    /// Clear the remembered install/skip selection
    Forget(forget::ForgetCommand),
}

impl Cli {
    /// Set up logging and run the selected command.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        config.init_logging();
        self.execute_with_config(config).await
    }

    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            Some("error".to_string())
        } else {
            None
        };

        let no_progress =
            self.no_progress || std::env::var_os(crate::utils::progress::NO_PROGRESS_ENV).is_some();

        CliConfig {
            log_level,
            no_progress,
            config_path: self.config.clone(),
        }
    }

    /// Run the selected command without touching the logging setup.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        match self.command {
            Commands::Check(cmd) => cmd.execute(&config).await,
            Commands::Watch(cmd) => cmd.execute(&config).await,
            Commands::Status(cmd) => cmd.execute(&config).await,
            Commands::Forget(cmd) => cmd.execute(&config).await,
        }
    }
}
