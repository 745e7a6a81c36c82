//! Core types shared by every part of kvm-updater.
//!
//! Currently this is the error taxonomy and the CLI-facing error reporting.

pub mod error;

pub use error::{ErrorContext, UpdaterError, user_friendly_error};
