//! kvm-updater - update checker for monitor-controller-kvm
//!
//! Periodically reads a release feed, asks the user before installing, and
//! downloads and silently runs the release installer. A successful install
//! produces a [`update::ShutdownRequest`] for the host instead of ending the
//! process from inside the library.
//!
//! # Modules
//!
//! - [`update`] - the update cycle, scheduler, feed client and installer runner
//! - [`version`] - semantic and lexical tag comparison
//! - [`config`] - global configuration (`~/.kvm-updater/config.toml`)
//! - [`core`] - error types and user-facing error rendering
//! - [`cli`] - the `kvm-updater` command-line interface
//! - [`utils`] - progress bars
//!
//! # Embedding
//!
//! ```rust,no_run
//! use kvm_updater::config::GlobalConfig;
//! use kvm_updater::update::{CheckOutcome, TerminalPrompt, UpdateFlow, UpdateScheduler};
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = GlobalConfig::load().await?;
//! let flow = Arc::new(UpdateFlow::new(&config.update, Arc::new(TerminalPrompt::new()))?);
//!
//! let mut scheduler = UpdateScheduler::new(flow, &config.update).spawn();
//! while let Some(outcome) = scheduler.next_outcome().await {
//!     if let CheckOutcome::UpdateApplied(request) = outcome {
//!         request.relaunch()?;
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod update;
pub mod utils;
pub mod version;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
