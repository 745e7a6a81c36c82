use crate::version::VersionOrdering;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Release feed queried when no `feed_url` is configured.
pub const DEFAULT_FEED_URL: &str =
    "https://api.github.com/repos/dbtdsilva/monitor-controller-kvm/releases/latest";

/// Configuration settings for the update checker.
///
/// `UpdateConfig` controls where releases are looked up, how often, how the
/// installer is selected and run, and how tags are compared.
///
/// # TOML Example
/// ```toml
/// [update]
/// feed_url = "https://api.github.com/repos/dbtdsilva/monitor-controller-kvm/releases/latest"
/// check_on_startup = true
/// check_interval = 1800
/// installer_extension = ".exe"
/// installer_args = ["/silent"]
/// version_ordering = "semantic"
/// request_timeout = 30
/// installer_timeout = 900
/// ```
///
/// # Examples
///
/// ```rust,no_run
/// use kvm_updater::update::config::UpdateConfig;
///
/// let config = UpdateConfig::default();
/// assert_eq!(config.check_interval, 1800);
/// assert_eq!(config.installer_args, vec!["/silent".to_string()]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateConfig {
    /// Endpoint returning the latest release as JSON.
    #[serde(default = "default_feed_url")]
    pub feed_url: String,

    /// Whether the scheduler runs a check immediately when it starts.
    ///
    /// # Default: `true`
    #[serde(default = "default_check_on_startup")]
    pub check_on_startup: bool,

    /// Interval between periodic checks in seconds.
    ///
    /// # Default: `1800` (30 minutes)
    ///
    /// `0` disables periodic checks; only the startup check runs.
    #[serde(default = "default_check_interval")]
    pub check_interval: u64,

    /// Suffix an asset name must end with to be picked as the installer.
    #[serde(default = "default_installer_extension")]
    pub installer_extension: String,

    /// Arguments passed to the installer. The default runs it silently.
    #[serde(default = "default_installer_args")]
    pub installer_args: Vec<String>,

    /// Ordering used to decide whether the release tag is newer.
    #[serde(default)]
    pub version_ordering: VersionOrdering,

    /// Timeout in seconds for each HTTP request (metadata and download).
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Timeout in seconds for the installer process to exit.
    #[serde(default = "default_installer_timeout")]
    pub installer_timeout: u64,

    /// Overrides the version reported by the running application.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_version: Option<String>,

    /// Command spawned detached after an applied update, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relaunch_command: Option<PathBuf>,

    /// `User-Agent` sent with every request. GitHub rejects requests without one.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            feed_url: default_feed_url(),
            check_on_startup: default_check_on_startup(),
            check_interval: default_check_interval(),
            installer_extension: default_installer_extension(),
            installer_args: default_installer_args(),
            version_ordering: VersionOrdering::default(),
            request_timeout: default_request_timeout(),
            installer_timeout: default_installer_timeout(),
            current_version: None,
            relaunch_command: None,
            user_agent: default_user_agent(),
        }
    }
}

fn default_feed_url() -> String {
    DEFAULT_FEED_URL.to_string()
}

const fn default_check_on_startup() -> bool {
    true
}

const fn default_check_interval() -> u64 {
    1800 // 30 minutes
}

fn default_installer_extension() -> String {
    ".exe".to_string()
}

fn default_installer_args() -> Vec<String> {
    vec!["/silent".to_string()]
}

const fn default_request_timeout() -> u64 {
    30
}

const fn default_installer_timeout() -> u64 {
    900
}

fn default_user_agent() -> String {
    format!("kvm-updater/{}", env!("CARGO_PKG_VERSION"))
}

impl UpdateConfig {
    /// Create a new `UpdateConfig` with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Version the running application reports: the configured override or
    /// the crate version.
    #[must_use]
    pub fn effective_current_version(&self) -> String {
        self.current_version.clone().unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string())
    }

    /// Periodic check interval, `None` when periodic checks are disabled.
    #[must_use]
    pub const fn interval(&self) -> Option<Duration> {
        if self.check_interval == 0 {
            None
        } else {
            Some(Duration::from_secs(self.check_interval))
        }
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    #[must_use]
    pub const fn installer_timeout(&self) -> Duration {
        Duration::from_secs(self.installer_timeout)
    }

    /// Whether this configuration equals the defaults. Used to keep saved
    /// config files minimal.
    #[must_use]
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}
