//! Progress indicators for installer downloads
//!
//! Wraps `indicatif` with the updater's styling. Progress output is hidden
//! when the `KVM_UPDATER_NO_PROGRESS` environment variable is set or when the
//! caller asks for a hidden bar (`--no-progress`).

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle as IndicatifStyle};

/// Environment variable that disables all progress output.
pub const NO_PROGRESS_ENV: &str = "KVM_UPDATER_NO_PROGRESS";

fn is_progress_disabled() -> bool {
    std::env::var(NO_PROGRESS_ENV).is_ok()
}

/// Byte-counting progress bar for a single download.
///
/// The total length is optional because release servers do not always send
/// `Content-Length`; without it the bar renders as a byte counter spinner.
#[derive(Clone)]
pub struct DownloadProgress {
    inner: IndicatifBar,
}

impl DownloadProgress {
    /// Create a visible progress bar unless progress output is disabled.
    pub fn new(total_bytes: Option<u64>, label: impl Into<String>) -> Self {
        if is_progress_disabled() {
            return Self::hidden();
        }

        let bar = match total_bytes {
            Some(len) => {
                let bar = IndicatifBar::new(len);
                bar.set_style(download_style());
                bar
            }
            None => {
                let bar = IndicatifBar::new_spinner();
                bar.set_style(counter_style());
                bar
            }
        };
        bar.set_prefix(label.into());
        Self {
            inner: bar,
        }
    }

    /// A bar that never draws.
    pub fn hidden() -> Self {
        Self {
            inner: IndicatifBar::hidden(),
        }
    }

    pub fn inc(&self, delta: u64) {
        self.inner.inc(delta);
    }

    #[must_use]
    pub fn position(&self) -> u64 {
        self.inner.position()
    }

    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }
}

fn download_style() -> IndicatifStyle {
    IndicatifStyle::default_bar()
        .template("{prefix:.bold.cyan} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
        .map(|style| style.progress_chars("━╸━"))
        .unwrap_or_else(|_| IndicatifStyle::default_bar())
}

fn counter_style() -> IndicatifStyle {
    IndicatifStyle::default_spinner()
        .template("{prefix:.bold.cyan} {spinner:.cyan} {bytes} ({bytes_per_sec})")
        .unwrap_or_else(|_| IndicatifStyle::default_spinner())
}
