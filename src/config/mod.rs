//! Configuration loading.
//!
//! kvm-updater has a single global configuration file; see [`GlobalConfig`]
//! for its location and format.

mod global;

pub use global::{CONFIG_PATH_ENV, GlobalConfig};
