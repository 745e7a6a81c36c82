//! Small shared utilities.

pub mod progress;

pub use progress::DownloadProgress;
