//! Version ordering for release tags.
//!
//! Release tags are compared against the running version to decide whether an
//! update is offered. Two orderings exist:
//!
//! - [`VersionOrdering::Semantic`] (default): tags are parsed as semantic
//!   versions after stripping common prefixes, so `v2.10.0 > v2.9.0`.
//! - [`VersionOrdering::Lexical`]: plain byte-wise string comparison. This
//!   rates `"v2.10.0" < "v2.9.0"` and is kept only for installations that
//!   depend on the historical behaviour.
//!
//! Under semantic ordering a tag that cannot be parsed orders below any tag
//! that can, so a malformed remote tag is never offered as an update. Two
//! unparseable tags compare lexically.

pub mod comparison;

pub use comparison::VersionComparator;

use serde::{Deserialize, Serialize};
use std::fmt;

/// How release tags are ordered against the current version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionOrdering {
    /// Numeric semantic-version ordering.
    #[default]
    Semantic,
    /// Plain string ordering.
    Lexical,
}

impl fmt::Display for VersionOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Semantic => write!(f, "semantic"),
            Self::Lexical => write!(f, "lexical"),
        }
    }
}
