//! Silent installer execution.

use crate::core::UpdaterError;
use crate::update::config::UpdateConfig;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, error, info};

/// `ETXTBSY`: the executable is still open for writing somewhere.
#[cfg(unix)]
const EXECUTABLE_FILE_BUSY: i32 = 26;

const SPAWN_ATTEMPTS: u32 = 5;

/// Runs a downloaded installer and waits for it to exit.
///
/// Success means exit code 0. Every failure is logged and returned as an
/// installer error; nothing here panics or terminates the host process.
#[derive(Debug, Clone)]
pub struct InstallerRunner {
    args: Vec<String>,
    timeout: Duration,
}

impl InstallerRunner {
    pub fn new(args: Vec<String>, timeout: Duration) -> Self {
        Self {
            args,
            timeout,
        }
    }

    pub fn from_config(config: &UpdateConfig) -> Self {
        Self::new(config.installer_args.clone(), config.installer_timeout())
    }

    /// Run the installer at `path` with the configured arguments.
    ///
    /// # Errors
    ///
    /// - [`UpdaterError::InstallerNotFound`] if `path` does not exist
    /// - [`UpdaterError::InstallerSpawnFailed`] if the process cannot start
    /// - [`UpdaterError::InstallerTimeout`] if it runs longer than the timeout
    ///   (the process is killed)
    /// - [`UpdaterError::InstallerFailed`] on a non-zero exit
    pub async fn run(&self, path: &Path) -> Result<(), UpdaterError> {
        let installer = path.display().to_string();

        if !path.exists() {
            error!("Installer not found at: {}", installer);
            return Err(UpdaterError::InstallerNotFound {
                path: installer,
            });
        }

        info!("Running installer {} {}", installer, self.args.join(" "));

        let mut child = self.spawn(path).await.map_err(|e| {
            error!("An error occurred while starting the installer {}: {}", installer, e);
            UpdaterError::InstallerSpawnFailed {
                path: installer.clone(),
                reason: e.to_string(),
            }
        })?;

        let status = match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                error!("Failed to wait for installer {}: {}", installer, e);
                return Err(UpdaterError::InstallerSpawnFailed {
                    path: installer,
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                error!("Installer {} did not finish within {:?}, killing it", installer, self.timeout);
                if let Err(e) = child.kill().await {
                    debug!("Failed to kill installer: {}", e);
                }
                return Err(UpdaterError::InstallerTimeout {
                    path: installer,
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        if status.success() {
            info!("Installer successfully updated application");
            Ok(())
        } else {
            error!("Installer failed with return code: {:?}", status.code());
            Err(UpdaterError::InstallerFailed {
                path: installer,
                code: status.code(),
            })
        }
    }

    async fn spawn(&self, path: &Path) -> std::io::Result<tokio::process::Child> {
        let mut attempt = 1;
        loop {
            match Command::new(path).args(&self.args).kill_on_drop(true).spawn() {
                Err(e) if is_executable_busy(&e) && attempt < SPAWN_ATTEMPTS => {
                    debug!("Installer busy on attempt {}, retrying", attempt);
                    attempt += 1;
                    tokio::time::sleep(Duration::from_millis(50 * u64::from(attempt))).await;
                }
                result => return result,
            }
        }
    }
}

#[cfg(unix)]
fn is_executable_busy(e: &std::io::Error) -> bool {
    e.raw_os_error() == Some(EXECUTABLE_FILE_BUSY)
}

#[cfg(not(unix))]
fn is_executable_busy(_e: &std::io::Error) -> bool {
    false
}
