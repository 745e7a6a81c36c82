//! Periodic update checks on a background task.
//!
//! The scheduler runs one cycle immediately (when `check_on_startup` is set)
//! and then one per interval. Ticks that fall due while a cycle is still
//! running are skipped rather than queued. Outcomes are sent back to the host
//! over a channel.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

use crate::update::config::UpdateConfig;
use crate::update::flow::{CheckOutcome, UpdateFlow};

const OUTCOME_CHANNEL_CAPACITY: usize = 8;

pub struct UpdateScheduler {
    flow: Arc<UpdateFlow>,
    interval: Option<Duration>,
    check_on_startup: bool,
}

impl UpdateScheduler {
    pub fn new(flow: Arc<UpdateFlow>, config: &UpdateConfig) -> Self {
        Self {
            flow,
            interval: config.interval(),
            check_on_startup: config.check_on_startup,
        }
    }

    /// Override the interval. `None` disables periodic checks.
    #[must_use]
    pub const fn with_interval(mut self, interval: Option<Duration>) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub const fn with_check_on_startup(mut self, check_on_startup: bool) -> Self {
        self.check_on_startup = check_on_startup;
        self
    }

    /// Start the background task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(self) -> SchedulerHandle {
        let (outcome_tx, outcome_rx) = mpsc::channel(OUTCOME_CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(self.run(outcome_tx, shutdown_rx));

        SchedulerHandle {
            outcomes: outcome_rx,
            shutdown: Some(shutdown_tx),
            task,
        }
    }

    async fn run(self, outcomes: mpsc::Sender<CheckOutcome>, mut shutdown: oneshot::Receiver<()>) {
        if self.check_on_startup && !self.run_once(&outcomes).await {
            return;
        }

        let Some(period) = self.interval else {
            debug!("Periodic update checks disabled");
            return;
        };

        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    debug!("Update scheduler shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    if !self.run_once(&outcomes).await {
                        break;
                    }
                }
            }
        }
    }

    /// Run one cycle and deliver its outcome. Returns `false` when the
    /// scheduler should stop.
    async fn run_once(&self, outcomes: &mpsc::Sender<CheckOutcome>) -> bool {
        let outcome = self.flow.check_for_updates().await;
        let applied = matches!(outcome, CheckOutcome::UpdateApplied(_));

        if outcomes.send(outcome).await.is_err() {
            debug!("Outcome receiver dropped, stopping update scheduler");
            return false;
        }
        if applied {
            debug!("Update applied, stopping update scheduler");
        }
        !applied
    }
}

/// Host side of a running [`UpdateScheduler`].
pub struct SchedulerHandle {
    outcomes: mpsc::Receiver<CheckOutcome>,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Wait for the next cycle outcome. `None` once the scheduler has stopped.
    pub async fn next_outcome(&mut self) -> Option<CheckOutcome> {
        self.outcomes.recv().await
    }

    /// Ask the scheduler to stop and wait for it.
    ///
    /// A cycle that is already running finishes first.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        // Drain so a cycle blocked on a full channel can finish.
        self.outcomes.close();
        while self.outcomes.recv().await.is_some() {}

        self.task.await.context("Update scheduler task panicked")
    }
}
