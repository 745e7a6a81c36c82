//! Global configuration for kvm-updater.
//!
//! The configuration file lives at `~/.kvm-updater/config.toml`
//! (`%LOCALAPPDATA%\kvm-updater\config.toml` on Windows). Its location can be
//! overridden with `--config` or the `KVM_UPDATER_CONFIG` environment
//! variable. A missing file yields the defaults.
//!
//! ```toml
//! [update]
//! feed_url = "https://api.github.com/repos/dbtdsilva/monitor-controller-kvm/releases/latest"
//! check_interval = 1800
//! installer_args = ["/silent"]
//! version_ordering = "semantic"
//! ```
//!
//! The remembered "install / skip" selection is stored next to this file in
//! `.update_choice`.

use crate::update::config::UpdateConfig;
use crate::update::preferences::ChoiceStore;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Environment variable overriding the configuration file location.
pub const CONFIG_PATH_ENV: &str = "KVM_UPDATER_CONFIG";

/// Contents of `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Release feed, scheduling and installer settings.
    #[serde(default, skip_serializing_if = "UpdateConfig::is_default")]
    pub update: UpdateConfig,
}

impl GlobalConfig {
    /// Load from the resolved default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load() -> Result<Self> {
        Self::load_with_optional(None).await
    }

    /// Load from `path` if given, otherwise from [`GlobalConfig::resolve_path`].
    ///
    /// A missing file is not an error.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = Self::resolve_path(path)?;
        if path.exists() {
            Self::load_from(&path).await
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or has
    /// values of the wrong type.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Pick the config file: explicit path, then `KVM_UPDATER_CONFIG`, then
    /// the platform default.
    pub fn resolve_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            return Ok(path);
        }
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(path));
        }
        Self::default_path()
    }

    /// Platform default location of `config.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home (or local data, on Windows) directory
    /// cannot be determined.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("kvm-updater")
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(".kvm-updater")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Store for remembered selections that sits next to `config_path`.
    #[must_use]
    pub fn choice_store(config_path: &Path) -> ChoiceStore {
        ChoiceStore::beside_config(config_path)
    }

}
