//! Error handling for kvm-updater
//!
//! This module provides the error taxonomy of the update flow and the
//! user-facing error reporting used by the CLI. The error system follows two
//! principles:
//! 1. **Strongly-typed errors** so the flow can map every failure onto a
//!    terminal [`CheckOutcome`](crate::update::CheckOutcome)
//! 2. **User-friendly messages** with actionable suggestions at the CLI boundary
//!
//! # Error Categories
//!
//! - **Release feed**: [`UpdaterError::NetworkError`], [`UpdaterError::ParseError`],
//!   [`UpdaterError::NoInstallerAsset`]
//! - **Download**: [`UpdaterError::DownloadError`]
//! - **Installer**: [`UpdaterError::InstallerNotFound`], [`UpdaterError::InstallerSpawnFailed`],
//!   [`UpdaterError::InstallerFailed`], [`UpdaterError::InstallerTimeout`]
//! - **Configuration**: [`UpdaterError::ConfigError`]
//!
//! Inside an update cycle every error is logged and swallowed; only the CLI
//! surfaces errors to the user, through [`user_friendly_error`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use kvm_updater::core::{ErrorContext, UpdaterError};
//!
//! let context = ErrorContext::new(UpdaterError::ConfigError {
//!     message: "check_interval must be a number".to_string(),
//! })
//! .with_suggestion("Fix the [update] section of your config.toml");
//!
//! context.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Every failure the updater can report.
///
/// Variants carry owned strings rather than borrowed data so they can travel
/// across the scheduler channel inside a [`CheckOutcome`](crate::update::CheckOutcome).
#[derive(Error, Debug)]
pub enum UpdaterError {
    /// The release feed request failed or returned a non-success status.
    #[error("Network error while contacting {url}: {reason}")]
    NetworkError {
        /// Requested URL
        url: String,
        /// Transport error or HTTP status description
        reason: String,
    },

    /// The release feed answered but the payload is not a usable release.
    #[error("Failed to parse release metadata from {url}: {reason}")]
    ParseError {
        /// Requested URL
        url: String,
        /// What was missing or malformed
        reason: String,
    },

    /// The release has no asset ending in the installer extension.
    #[error("Release {tag} has no installer asset ending in '{extension}'")]
    NoInstallerAsset {
        /// Release tag that was inspected
        tag: String,
        /// Extension that was searched for
        extension: String,
    },

    /// Streaming the installer to disk failed.
    #[error("Failed to download installer from {url}: {reason}")]
    DownloadError {
        /// Download URL
        url: String,
        /// Underlying HTTP or I/O failure
        reason: String,
    },

    /// The installer path does not exist on disk.
    #[error("Installer not found at: {path}")]
    InstallerNotFound {
        /// Expected installer location
        path: String,
    },

    /// The installer process could not be started.
    #[error("Failed to start installer {path}: {reason}")]
    InstallerSpawnFailed {
        /// Installer location
        path: String,
        /// OS error description
        reason: String,
    },

    /// The installer ran but did not exit with code 0.
    #[error("Installer {path} failed with {}", describe_exit(.code))]
    InstallerFailed {
        /// Installer location
        path: String,
        /// Exit code, `None` when the process was terminated by a signal
        code: Option<i32>,
    },

    /// The installer did not finish within the configured timeout.
    #[error("Installer {path} did not finish within {seconds}s")]
    InstallerTimeout {
        /// Installer location
        path: String,
        /// Timeout that elapsed
        seconds: u64,
    },

    /// Invalid or unreadable configuration.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the problem
        message: String,
    },

    #[error("{message}")]
    Other {
        message: String,
    },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("return code {code}"),
        None => "no return code (terminated by signal)".to_string(),
    }
}

/// Error wrapper carrying a suggestion and details for terminal display.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: UpdaterError,
    /// Actionable step shown in green
    pub suggestion: Option<String>,
    /// Extra explanation shown in yellow
    pub details: Option<String>,
}

impl ErrorContext {
    /// Wrap an error without suggestion or details.
    #[must_use]
    pub const fn new(error: UpdaterError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    ///
    /// - Error message: red and bold
    /// - Details: yellow
    /// - Suggestion: green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with suggestions.
///
/// Known [`UpdaterError`] variants get tailored suggestions; I/O and TOML
/// errors are recognised by downcasting; everything else is reported with its
/// full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let error = match error.downcast::<UpdaterError>() {
        Ok(updater_error) => return create_error_context(updater_error),
        Err(error) => error,
    };

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(UpdaterError::Other {
                    message: format!("Permission denied: {io_error}"),
                })
                .with_suggestion("Check the ownership of the config directory or run with elevated permissions")
                .with_details("The updater could not read or write one of its files");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(UpdaterError::Other {
                    message: format!("File not found: {io_error}"),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(UpdaterError::ConfigError {
            message: toml_error.to_string(),
        })
        .with_suggestion("Check the TOML syntax of your config.toml. Verify quotes, brackets, and key names")
        .with_details("Settings for the updater live in the [update] table");
    }

    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(UpdaterError::Other {
        message,
    })
}

fn create_error_context(error: UpdaterError) -> ErrorContext {
    match &error {
        UpdaterError::NetworkError { .. } => ErrorContext::new(error)
            .with_suggestion("Check your internet connection or the feed_url in your config")
            .with_details("GitHub also rejects unauthenticated requests once the hourly rate limit is reached"),
        UpdaterError::ParseError { .. } => ErrorContext::new(error)
            .with_suggestion("Make sure feed_url points at a '/releases/latest' endpoint")
            .with_details("The feed must return JSON with a 'tag_name' field and an 'assets' array"),
        UpdaterError::NoInstallerAsset { .. } => ErrorContext::new(error)
            .with_suggestion("Adjust installer_extension in your config if the release ships a different installer type"),
        UpdaterError::DownloadError { .. } => ErrorContext::new(error)
            .with_suggestion("Retry later; the download will be attempted again on the next check"),
        UpdaterError::InstallerNotFound { .. } | UpdaterError::InstallerSpawnFailed { .. } => {
            ErrorContext::new(error)
                .with_suggestion("Check that antivirus software is not quarantining the downloaded installer")
        }
        UpdaterError::InstallerFailed { .. } | UpdaterError::InstallerTimeout { .. } => {
            ErrorContext::new(error)
                .with_suggestion("Run the installer manually without the silent flag to see its error")
        }
        UpdaterError::ConfigError { .. } => ErrorContext::new(error)
            .with_suggestion("Check the [update] section of your config.toml"),
        _ => ErrorContext::new(error),
    }
}
