//! Test utilities for kvm-updater
//!
//! Helpers shared by the unit and integration suites: logging setup, a
//! prompt that records how often it was asked, release feed payloads, and
//! fake installers for Unix hosts.
//!
//! # Example
//!
//! ```rust,no_run
//! use kvm_updater::test_utils::{RecordingPrompt, release_json, test_update_config};
//! use kvm_updater::update::UpdateFlow;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let prompt = Arc::new(RecordingPrompt::declining());
//! let config = test_update_config("http://127.0.0.1:9/latest", "v1.0.0");
//! let flow = UpdateFlow::new(&config, prompt.clone())?;
//!
//! let _body = release_json("v9.9.9", &[("setup.exe", "http://127.0.0.1:9/setup.exe")]);
//! flow.check_for_updates().await;
//! assert_eq!(prompt.calls(), 0);
//! # Ok(())
//! # }
//! ```

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, Once};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::update::{PromptRequest, PromptResponse, UpdateConfig, UpdatePrompt};

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` if given, otherwise `RUST_LOG`. Without either, tests run
/// without a subscriber.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// A prompt with a fixed answer that counts how often it was asked.
#[derive(Debug)]
pub struct RecordingPrompt {
    response: PromptResponse,
    requests: Mutex<Vec<PromptRequest>>,
    calls: AtomicUsize,
}

impl RecordingPrompt {
    pub fn new(response: PromptResponse) -> Self {
        Self {
            response,
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn accepting() -> Self {
        Self::new(PromptResponse::accept())
    }

    pub fn declining() -> Self {
        Self::new(PromptResponse::decline())
    }

    /// Number of times the user was asked.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<PromptRequest> {
        self.requests.lock().ok().and_then(|requests| requests.last().cloned())
    }
}

impl UpdatePrompt for RecordingPrompt {
    fn confirm(&self, request: &PromptRequest) -> Result<PromptResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        Ok(self.response)
    }
}

/// A release feed body with the given tag and `(name, url)` assets.
pub fn release_json(tag: &str, assets: &[(&str, &str)]) -> serde_json::Value {
    let assets: Vec<_> = assets
        .iter()
        .map(|(name, url)| {
            serde_json::json!({
                "name": name,
                "browser_download_url": url,
            })
        })
        .collect();

    serde_json::json!({
        "tag_name": tag,
        "assets": assets,
    })
}

/// Update settings pointing at `feed_url` with short timeouts.
pub fn test_update_config(feed_url: &str, current_version: &str) -> UpdateConfig {
    UpdateConfig {
        feed_url: feed_url.to_string(),
        current_version: Some(current_version.to_string()),
        request_timeout: 5,
        installer_timeout: 10,
        ..UpdateConfig::default()
    }
}

/// Shell script that appends its arguments to `args_log`, records its own
/// path and exits with `exit_code`.
///
/// Served as the installer body in integration tests. The downloaded file is
/// made executable, so on Unix it runs like a real installer.
pub fn fake_installer_script(args_log: &Path, exit_code: i32) -> String {
    format!(
        "#!/bin/sh\necho \"$@\" >> '{}'\necho \"$0\" > '{}'\nexit {exit_code}\n",
        args_log.display(),
        location_log(args_log).display()
    )
}

/// Write [`fake_installer_script`] to `dir/name` and make it executable.
#[cfg(unix)]
pub fn write_fake_installer(
    dir: &Path,
    name: &str,
    args_log: &Path,
    exit_code: i32,
) -> std::io::Result<PathBuf> {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, fake_installer_script(args_log, exit_code))?;
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
    Ok(path)
}

/// Where the fake installer ran from, as recorded by the script.
///
/// Lets tests check that the temporary download directory is gone after a
/// cycle.
pub fn recorded_installer_path(args_log: &Path) -> Option<PathBuf> {
    std::fs::read_to_string(location_log(args_log))
        .ok()
        .map(|content| PathBuf::from(content.trim()))
}

fn location_log(args_log: &Path) -> PathBuf {
    args_log.with_extension("location")
}
