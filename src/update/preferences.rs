use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// File name of the remembered choice, stored next to the config file.
pub const CHOICE_FILE_NAME: &str = ".update_choice";

/// A persisted answer to the update prompt.
///
/// The choice applies only to the release it was made for. When a newer
/// release appears the user is asked again.
///
/// # Serialization
///
/// Stored as JSON:
///
/// ```json
/// { "version": "v1.4.0", "accepted": false, "decided_at": "2026-10-19T08:00:00Z" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RememberedChoice {
    /// Release tag the answer applies to.
    pub version: String,
    /// Whether the user chose to install.
    pub accepted: bool,
    /// When the answer was given.
    pub decided_at: DateTime<Utc>,
}

impl RememberedChoice {
    pub fn new(version: impl Into<String>, accepted: bool) -> Self {
        Self {
            version: version.into(),
            accepted,
            decided_at: Utc::now(),
        }
    }

    /// Whether this choice answers the prompt for `version`.
    #[must_use]
    pub fn applies_to(&self, version: &str) -> bool {
        self.version == version
    }
}

/// Storage for the "remember my selection" toggle.
#[derive(Debug, Clone)]
pub struct ChoiceStore {
    path: PathBuf,
}

impl ChoiceStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
        }
    }

    /// Store the choice in the same directory as `config_path`.
    pub fn beside_config(config_path: &Path) -> Self {
        let dir = config_path.parent().map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Self::new(dir.join(CHOICE_FILE_NAME))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the remembered choice, if any.
    pub async fn load(&self) -> Result<Option<RememberedChoice>> {
        if !self.path.exists() {
            debug!("No remembered update choice at {}", self.path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read {}", self.path.display()))?;

        let choice: RememberedChoice = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;

        Ok(Some(choice))
    }

    /// The remembered answer for `version`, if one exists.
    ///
    /// An unreadable store is logged and treated as empty so the user is
    /// simply asked again.
    pub async fn lookup(&self, version: &str) -> Option<bool> {
        match self.load().await {
            Ok(Some(choice)) if choice.applies_to(version) => Some(choice.accepted),
            Ok(_) => None,
            Err(e) => {
                warn!("Ignoring remembered update choice: {:#}", e);
                None
            }
        }
    }

    /// Persist the answer for `version`, replacing any previous one.
    pub async fn remember(&self, version: &str, accepted: bool) -> Result<()> {
        let choice = RememberedChoice::new(version, accepted);
        let content =
            serde_json::to_string_pretty(&choice).context("Failed to serialize update choice")?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        fs::write(&self.path, content)
            .await
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        debug!("Remembered {} for {}", if accepted { "accept" } else { "decline" }, version);
        Ok(())
    }

    /// Forget any remembered answer.
    pub async fn clear(&self) -> Result<bool> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .await
                .with_context(|| format!("Failed to remove {}", self.path.display()))?;
            debug!("Cleared remembered update choice");
            return Ok(true);
        }
        Ok(false)
    }
}
