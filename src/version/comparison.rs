//! Version comparison utilities for release tags.
//!
//! Handles `v1.2.3`, `version-1.2.3`, `release-1.2.3` and short forms such as
//! `v1.2` (treated as `1.2.0`).
//!
//! # Examples
//!
//! ```rust,no_run
//! use kvm_updater::version::{VersionComparator, VersionOrdering};
//!
//! assert!(VersionComparator::is_newer("v2.9.0", "v2.10.0", VersionOrdering::Semantic));
//! assert!(!VersionComparator::is_newer("v2.9.0", "v2.10.0", VersionOrdering::Lexical));
//! ```

use anyhow::Result;
use semver::Version;
use std::cmp::Ordering;
use tracing::debug;

pub struct VersionComparator;

impl VersionComparator {
    /// Returns `true` when `remote` orders strictly after `current`.
    ///
    /// Equal versions are never offered as updates.
    #[must_use]
    pub fn is_newer(current: &str, remote: &str, ordering: super::VersionOrdering) -> bool {
        Self::compare(remote, current, ordering) == Ordering::Greater
    }

    /// Compare two tags under the given ordering.
    #[must_use]
    pub fn compare(a: &str, b: &str, ordering: super::VersionOrdering) -> Ordering {
        match ordering {
            super::VersionOrdering::Lexical => a.cmp(b),
            super::VersionOrdering::Semantic => Self::compare_semantic(a, b),
        }
    }

    /// A tag that parses always orders after one that does not, so a
    /// malformed remote tag is never offered over a proper current version.
    /// Two unparseable tags compare lexically.
    fn compare_semantic(a: &str, b: &str) -> Ordering {
        match (Self::parse_version(a), Self::parse_version(b)) {
            (Ok(va), Ok(vb)) => va.cmp(&vb),
            (Ok(_), Err(e)) => {
                debug!("'{}' is not a semantic version ({}), ordering it below '{}'", b, e, a);
                Ordering::Greater
            }
            (Err(e), Ok(_)) => {
                debug!("'{}' is not a semantic version ({}), ordering it below '{}'", a, e, b);
                Ordering::Less
            }
            (Err(_), Err(_)) => {
                debug!("Falling back to lexical comparison of '{}' and '{}'", a, b);
                a.cmp(b)
            }
        }
    }

    /// Parse a release tag into a semantic version.
    ///
    /// Common prefixes are stripped and missing minor/patch components are
    /// filled with zeros.
    pub fn parse_version(version_str: &str) -> Result<Version> {
        let trimmed = version_str.trim();
        let clean_version = if let Some(stripped) = trimmed.strip_prefix("version-") {
            stripped
        } else if let Some(stripped) = trimmed.strip_prefix("release-") {
            stripped
        } else if let Some(stripped) = trimmed.strip_prefix(['v', 'V']) {
            stripped
        } else {
            trimmed
        };

        let core_end = clean_version.find(['-', '+']).unwrap_or(clean_version.len());
        let (core, suffix) = clean_version.split_at(core_end);
        let padded = match core.split('.').count() {
            1 => format!("{core}.0.0{suffix}"),
            2 => format!("{core}.0{suffix}"),
            _ => clean_version.to_string(),
        };

        Ok(Version::parse(&padded)?)
    }
}
