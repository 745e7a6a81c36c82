use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use crate::core::UpdaterError;
use crate::update::config::UpdateConfig;
use crate::update::download::{self, InstallerDownload};
use crate::update::installer::InstallerRunner;
use crate::update::preferences::ChoiceStore;
use crate::update::prompt::{PromptRequest, UpdatePrompt};
use crate::update::release::{ReleaseClient, ReleaseInfo};
use crate::version::{VersionComparator, VersionOrdering};

/// How one update cycle ended.
///
/// Every variant except [`CheckOutcome::UpdateApplied`] leaves the host
/// running; the next scheduled tick starts a fresh cycle.
#[derive(Debug)]
pub enum CheckOutcome {
    /// Another cycle was still running on this flow.
    Busy,
    /// The feed could not be read, was malformed, or had no installer asset.
    CheckFailed(UpdaterError),
    /// The current version is the same as or newer than the release.
    NoUpdate {
        current: String,
        latest: String,
    },
    /// The user (or a remembered choice) declined the update.
    Declined {
        latest: String,
    },
    /// The installer could not be downloaded.
    DownloadFailed(UpdaterError),
    /// The installer ran but did not succeed.
    InstallFailed(UpdaterError),
    /// The installer succeeded; the host should shut down.
    UpdateApplied(ShutdownRequest),
}

impl CheckOutcome {
    /// Short name used in logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Busy => "busy",
            Self::CheckFailed(_) => "check-failed",
            Self::NoUpdate { .. } => "no-update",
            Self::Declined { .. } => "declined",
            Self::DownloadFailed(_) => "download-failed",
            Self::InstallFailed(_) => "install-failed",
            Self::UpdateApplied(_) => "update-applied",
        }
    }

    /// The shutdown request, if the update was applied.
    #[must_use]
    pub const fn shutdown_request(&self) -> Option<&ShutdownRequest> {
        match self {
            Self::UpdateApplied(request) => Some(request),
            _ => None,
        }
    }

    /// The error that ended the cycle, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&UpdaterError> {
        match self {
            Self::CheckFailed(e) | Self::DownloadFailed(e) | Self::InstallFailed(e) => Some(e),
            _ => None,
        }
    }
}

/// "Update applied, shutdown requested."
///
/// Returned to the host instead of exiting the process, so the host can close
/// its own state first and then call [`ShutdownRequest::relaunch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownRequest {
    /// Version that was installed.
    pub version: String,
    /// Command to start detached once the host has shut down.
    pub relaunch: Option<PathBuf>,
}

impl ShutdownRequest {
    /// Spawn the relaunch command, if any, without waiting for it.
    pub fn relaunch(&self) -> Result<()> {
        let Some(command) = &self.relaunch else {
            return Ok(());
        };

        info!("Relaunching {}", command.display());
        let mut cmd = std::process::Command::new(command);
        cmd.stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null());

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const DETACHED_PROCESS: u32 = 0x0000_0008;
            cmd.creation_flags(DETACHED_PROCESS);
        }

        cmd.spawn().with_context(|| format!("Failed to relaunch {}", command.display()))?;
        Ok(())
    }
}

/// Releases the in-progress flag when a cycle ends, on every path.
struct CycleGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> CycleGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).ok().map(|_| Self {
            flag,
        })
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// The check → confirm → download → install → shutdown sequence.
///
/// `UpdateFlow` owns everything one cycle needs: the feed client, the
/// installer runner, the prompt and the remembered-choice store. A cycle is
/// started with [`check_for_updates`](Self::check_for_updates) and always ends
/// in a [`CheckOutcome`]; errors are logged and folded into the outcome.
///
/// Only one cycle runs at a time. A second call while a cycle is active
/// returns [`CheckOutcome::Busy`] immediately.
///
/// # Examples
///
/// ```rust,no_run
/// use kvm_updater::update::{CheckOutcome, StaticPrompt, UpdateConfig, UpdateFlow};
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let flow = UpdateFlow::new(&UpdateConfig::default(), Arc::new(StaticPrompt::accept()))?;
///
/// if let CheckOutcome::UpdateApplied(request) = flow.check_for_updates().await {
///     // close windows, flush state...
///     request.relaunch()?;
/// }
/// # Ok(())
/// # }
/// ```
pub struct UpdateFlow {
    client: ReleaseClient,
    runner: InstallerRunner,
    prompt: Arc<dyn UpdatePrompt>,
    choices: Option<ChoiceStore>,
    current_version: String,
    installer_extension: String,
    ordering: VersionOrdering,
    relaunch_command: Option<PathBuf>,
    show_progress: bool,
    in_progress: AtomicBool,
}

impl UpdateFlow {
    /// Build a flow from configuration and a prompt implementation.
    pub fn new(config: &UpdateConfig, prompt: Arc<dyn UpdatePrompt>) -> Result<Self, UpdaterError> {
        Ok(Self {
            client: ReleaseClient::new(config)?,
            runner: InstallerRunner::from_config(config),
            prompt,
            choices: None,
            current_version: config.effective_current_version(),
            installer_extension: config.installer_extension.clone(),
            ordering: config.version_ordering,
            relaunch_command: config.relaunch_command.clone(),
            show_progress: false,
            in_progress: AtomicBool::new(false),
        })
    }

    /// Persist "remember my selection" answers in `store`.
    #[must_use]
    pub fn with_choice_store(mut self, store: ChoiceStore) -> Self {
        self.choices = Some(store);
        self
    }

    /// Show a download progress bar.
    #[must_use]
    pub const fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Override the version the running application reports.
    #[must_use]
    pub fn with_current_version(mut self, version: impl Into<String>) -> Self {
        self.current_version = version.into();
        self
    }

    #[must_use]
    pub fn current_version(&self) -> &str {
        &self.current_version
    }

    #[must_use]
    pub fn feed_url(&self) -> &str {
        self.client.feed_url()
    }

    /// Whether a cycle is running right now.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    /// Whether `tag` is newer than the current version under the configured ordering.
    #[must_use]
    pub fn is_newer(&self, tag: &str) -> bool {
        VersionComparator::is_newer(&self.current_version, tag, self.ordering)
    }

    /// Fetch the latest release without prompting or installing.
    pub async fn latest_release(&self) -> Result<ReleaseInfo, UpdaterError> {
        self.client.fetch_latest().await
    }

    /// Run one full update cycle.
    pub async fn check_for_updates(&self) -> CheckOutcome {
        let Some(_guard) = CycleGuard::acquire(&self.in_progress) else {
            debug!("Update check already in progress, skipping");
            return CheckOutcome::Busy;
        };

        let outcome = self.run_cycle().await;
        debug!("Update cycle finished: {}", outcome.label());
        outcome
    }

    async fn run_cycle(&self) -> CheckOutcome {
        let release = match self.client.fetch_latest().await {
            Ok(release) => release,
            Err(e) => {
                warn!("Failed to retrieve version to update: {}", e);
                return CheckOutcome::CheckFailed(e);
            }
        };

        let Some(installer_url) = release.installer_url(&self.installer_extension) else {
            let e = UpdaterError::NoInstallerAsset {
                tag: release.tag_name.clone(),
                extension: self.installer_extension.clone(),
            };
            warn!("Failed to retrieve installer url from response: {}", e);
            return CheckOutcome::CheckFailed(e);
        };

        if !self.is_newer(&release.tag_name) {
            debug!(
                "Already on latest version ({} >= {}, {} ordering)",
                self.current_version, release.tag_name, self.ordering
            );
            return CheckOutcome::NoUpdate {
                current: self.current_version.clone(),
                latest: release.tag_name,
            };
        }

        info!(
            "Asking the user to update from {} to {}",
            self.current_version, release.tag_name
        );

        match self.confirm_update(&release.tag_name).await {
            Ok(true) => {}
            Ok(false) => {
                info!("Update to {} declined", release.tag_name);
                return CheckOutcome::Declined {
                    latest: release.tag_name,
                };
            }
            Err(e) => {
                warn!("Update prompt failed, treating as declined: {:#}", e);
                return CheckOutcome::Declined {
                    latest: release.tag_name,
                };
            }
        }

        self.update_application(installer_url, &release.tag_name).await
    }

    /// Ask the user whether to install `latest_version`.
    ///
    /// A remembered answer for exactly this version is reused without
    /// prompting. When the user ticks "remember my selection", the answer is
    /// stored for this version.
    pub async fn confirm_update(&self, latest_version: &str) -> Result<bool> {
        if let Some(store) = &self.choices
            && let Some(accepted) = store.lookup(latest_version).await
        {
            info!(
                "Using remembered choice for {}: {}",
                latest_version,
                if accepted { "install" } else { "skip" }
            );
            return Ok(accepted);
        }

        let prompt = Arc::clone(&self.prompt);
        let request = PromptRequest {
            current_version: self.current_version.clone(),
            latest_version: latest_version.to_string(),
        };
        let response = tokio::task::spawn_blocking(move || prompt.confirm(&request))
            .await
            .context("Update prompt task failed")??;

        if response.remember
            && let Some(store) = &self.choices
            && let Err(e) = store.remember(latest_version, response.accepted).await
        {
            warn!("Failed to remember update choice: {:#}", e);
        }

        Ok(response.accepted)
    }

    /// Download and run the installer at `url`.
    ///
    /// The temporary download directory is removed before this returns,
    /// whatever the result.
    pub async fn update_application(&self, url: &str, version: &str) -> CheckOutcome {
        let download = match self.download_installer(url).await {
            Ok(download) => download,
            Err(e) => {
                warn!("An error occurred while downloading the file: {}", e);
                return CheckOutcome::DownloadFailed(e);
            }
        };

        let result = self.run_installer(download.path()).await;

        if let Err(e) = download.close() {
            warn!("Failed to remove temporary download directory: {}", e);
        }

        match result {
            Ok(()) => CheckOutcome::UpdateApplied(self.close_and_relaunch(version)),
            Err(e) => CheckOutcome::InstallFailed(e),
        }
    }

    /// Stream the installer into a scoped temporary directory.
    pub async fn download_installer(&self, url: &str) -> Result<InstallerDownload, UpdaterError> {
        download::download_installer(&self.client, url, self.show_progress).await
    }

    /// Run the installer silently and wait for it.
    pub async fn run_installer(&self, path: &Path) -> Result<(), UpdaterError> {
        self.runner.run(path).await
    }

    /// Build the shutdown request handed back to the host.
    #[must_use]
    pub fn close_and_relaunch(&self, version: &str) -> ShutdownRequest {
        info!("Update to {} applied, requesting shutdown", version);
        ShutdownRequest {
            version: version.to_string(),
            relaunch: self.relaunch_command.clone(),
        }
    }
}
