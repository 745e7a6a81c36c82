//! Long-running periodic checks.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::CliConfig;
use super::common::{CommandContext, log_outcome};
use crate::update::{CheckOutcome, UpdateScheduler};

/// Upper bound on waiting for a running cycle after Ctrl-C.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

enum WatchEvent {
    Interrupted,
    Outcome(Option<CheckOutcome>),
}

/// Check now (if `check_on_startup`) and then every `check_interval`.
///
/// Stops on Ctrl-C or once an update has been applied.
#[derive(Args, Debug)]
pub struct WatchCommand {
    /// Install without asking; remembered selections are ignored
    #[arg(short, long)]
    pub yes: bool,

    /// Version of the running application
    #[arg(long, value_name = "VERSION")]
    pub current_version: Option<String>,

    /// Seconds between checks, overriding `check_interval`
    #[arg(long, value_name = "SECONDS")]
    pub interval: Option<u64>,
}

impl WatchCommand {
    pub async fn execute(self, config: &CliConfig) -> Result<()> {
        let ctx = CommandContext::load(config, self.current_version).await?;
        let flow = Arc::new(ctx.flow(self.yes, config.show_progress())?);

        let mut scheduler = UpdateScheduler::new(Arc::clone(&flow), &ctx.global.update);
        if let Some(seconds) = self.interval {
            scheduler = scheduler.with_interval((seconds > 0).then(|| Duration::from_secs(seconds)));
        }

        println!(
            "{}",
            format!("Watching for updates to {} (Ctrl-C to stop)", flow.current_version()).cyan()
        );

        let mut handle = scheduler.spawn();
        let interrupt = tokio::signal::ctrl_c();
        tokio::pin!(interrupt);

        loop {
            let event = tokio::select! {
                _ = &mut interrupt => WatchEvent::Interrupted,
                outcome = handle.next_outcome() => WatchEvent::Outcome(outcome),
            };

            match event {
                WatchEvent::Interrupted => {
                    info!("Interrupted, stopping update checks");
                    if tokio::time::timeout(SHUTDOWN_GRACE, handle.shutdown()).await.is_err() {
                        warn!("Update cycle still running after {:?}, exiting anyway", SHUTDOWN_GRACE);
                        // A prompt blocked on stdin would keep the runtime from shutting down.
                        std::process::exit(0);
                    }
                    return Ok(());
                }
                WatchEvent::Outcome(None) => {
                    info!("No further update checks scheduled");
                    return handle.shutdown().await;
                }
                WatchEvent::Outcome(Some(CheckOutcome::UpdateApplied(request))) => {
                    handle.shutdown().await?;
                    println!("{}", format!("Updated to {}", request.version).green().bold());
                    return request.relaunch();
                }
                WatchEvent::Outcome(Some(outcome)) => log_outcome(&outcome),
            }
        }
    }
}
