//! Release feed client and metadata types.
//!
//! The feed is a GitHub-style "latest release" endpoint returning:
//!
//! ```json
//! {
//!   "tag_name": "v1.2.3",
//!   "assets": [
//!     { "name": "setup.exe", "browser_download_url": "https://.../setup.exe" }
//!   ]
//! }
//! ```

use crate::core::UpdaterError;
use crate::update::config::UpdateConfig;
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Longest response body excerpt kept in a [`UpdaterError::NetworkError`].
const MAX_ERROR_BODY: usize = 200;

/// Latest release as published by the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseInfo {
    /// Version tag of the release, e.g. `v1.2.3`.
    pub tag_name: String,
    /// Downloadable files, in feed order. A missing array is treated as empty.
    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// A downloadable file attached to a release.
///
/// Both fields are optional on the wire; assets missing either are skipped
/// during installer selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub browser_download_url: Option<String>,
}

impl Asset {
    /// Convenience constructor for a complete asset.
    pub fn new(name: impl Into<String>, browser_download_url: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            browser_download_url: Some(browser_download_url.into()),
        }
    }
}

impl ReleaseInfo {
    /// Download URL of the first asset whose name ends with `extension` and
    /// that has a download URL.
    #[must_use]
    pub fn installer_url(&self, extension: &str) -> Option<&str> {
        self.assets
            .iter()
            .filter(|asset| asset.name.as_deref().is_some_and(|name| name.ends_with(extension)))
            .find_map(|asset| asset.browser_download_url.as_deref())
    }
}

/// HTTP client bound to one release feed.
///
/// The inner [`reqwest::Client`] is shared with the installer download so both
/// use the same `User-Agent` and connection pool.
#[derive(Debug, Clone)]
pub struct ReleaseClient {
    client: Client,
    feed_url: String,
    request_timeout: Duration,
}

impl ReleaseClient {
    /// Build a client from the update configuration.
    pub fn new(config: &UpdateConfig) -> Result<Self, UpdaterError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.request_timeout())
            .build()
            .map_err(|e| UpdaterError::ConfigError {
                message: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            feed_url: config.feed_url.clone(),
            request_timeout: config.request_timeout(),
        })
    }

    #[must_use]
    pub fn feed_url(&self) -> &str {
        &self.feed_url
    }

    #[must_use]
    pub const fn http(&self) -> &Client {
        &self.client
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Fetch and decode the latest release.
    ///
    /// # Errors
    ///
    /// - [`UpdaterError::NetworkError`] when the request fails, times out, or
    ///   the status is not 2xx
    /// - [`UpdaterError::ParseError`] when the body is not a release object
    pub async fn fetch_latest(&self) -> Result<ReleaseInfo, UpdaterError> {
        debug!("Fetching latest release from {}", self.feed_url);

        let network_error = |reason: String| UpdaterError::NetworkError {
            url: self.feed_url.clone(),
            reason,
        };

        let response = self
            .client
            .get(&self.feed_url)
            .header(ACCEPT, "application/vnd.github+json")
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| network_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let excerpt: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(network_error(format!("HTTP {status}: {excerpt}")));
        }

        let body = response.text().await.map_err(|e| network_error(e.to_string()))?;

        serde_json::from_str(&body).map_err(|e| UpdaterError::ParseError {
            url: self.feed_url.clone(),
            reason: e.to_string(),
        })
    }
}
