//! Update checks against the release feed and silent installer runs.
//!
//! # Architecture Overview
//!
//! - **[`UpdateFlow`]**: one check → confirm → download → install cycle
//! - **[`UpdateScheduler`]**: runs the flow at startup and on an interval
//! - **[`ReleaseClient`]**: fetches [`ReleaseInfo`] from the feed
//! - **[`InstallerRunner`]**: runs the downloaded installer with its silent flag
//! - **[`UpdatePrompt`]**: asks the user, with a "remember my selection" toggle
//! - **[`ChoiceStore`]**: persists remembered selections per version
//! - **[`UpdateConfig`]**: the `[update]` section of the global config
//!
//! ## Cycle
//!
//! ```text
//! Idle ─▶ Checking ─┬─▶ NoUpdate
//!                   ├─▶ CheckFailed
//!                   └─▶ ConfirmPending ─┬─▶ Declined
//!                                       └─▶ Downloading ─┬─▶ DownloadFailed
//!                                                        └─▶ Installing ─┬─▶ InstallFailed
//!                                                                        └─▶ UpdateApplied
//! ```
//!
//! A cycle never terminates the process. On success it returns a
//! [`ShutdownRequest`] and the host decides how to close and whether to
//! relaunch.
//!
//! ## Version Ordering
//!
//! Tags are compared with semver ordering after stripping a `v` prefix, so
//! `v2.10.0` is newer than `v2.9.0`. `version_ordering = "lexical"` restores
//! plain string ordering for compatibility with older releases of the host.
//!
//! # Usage
//!
//! ```bash
//! kvm-updater check            # one cycle, prompts in the terminal
//! kvm-updater check --yes      # one cycle, installs without prompting
//! kvm-updater status           # current vs latest, no prompt
//! kvm-updater watch            # check now and every 30 minutes
//! kvm-updater forget           # clear the remembered selection
//! ```

pub mod config;
pub mod download;
pub mod flow;
pub mod installer;
pub mod preferences;
pub mod prompt;
pub mod release;
pub mod scheduler;

pub use config::UpdateConfig;
pub use download::{DOWNLOAD_CHUNK_SIZE, InstallerDownload};
pub use flow::{CheckOutcome, ShutdownRequest, UpdateFlow};
pub use installer::InstallerRunner;
pub use preferences::{ChoiceStore, RememberedChoice};
pub use prompt::{PromptRequest, PromptResponse, StaticPrompt, TerminalPrompt, UpdatePrompt};
pub use release::{Asset, ReleaseClient, ReleaseInfo};
pub use scheduler::{SchedulerHandle, UpdateScheduler};
