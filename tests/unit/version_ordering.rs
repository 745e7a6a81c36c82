//! Release tag ordering.

use kvm_updater::version::{VersionComparator, VersionOrdering};
use std::cmp::Ordering;

#[test]
fn test_double_digit_minor_is_newer_semantically() {
    assert!(VersionComparator::is_newer("v2.9.0", "v2.10.0", VersionOrdering::Semantic));
    assert!(!VersionComparator::is_newer("v2.10.0", "v2.9.0", VersionOrdering::Semantic));
}

#[test]
fn test_lexical_ordering_keeps_string_comparison() {
    // "v2.10.0" sorts before "v2.9.0" as a string.
    assert!(VersionComparator::is_newer("v2.10.0", "v2.9.0", VersionOrdering::Lexical));
    assert!(!VersionComparator::is_newer("v2.9.0", "v2.10.0", VersionOrdering::Lexical));
}

#[test]
fn test_equal_versions_are_not_newer() {
    for ordering in [VersionOrdering::Semantic, VersionOrdering::Lexical] {
        assert!(!VersionComparator::is_newer("v1.0.0", "v1.0.0", ordering));
    }
    assert!(!VersionComparator::is_newer("1.0.0", "v1.0.0", VersionOrdering::Semantic));
}

#[test]
fn test_prefixes_and_short_forms() {
    assert_eq!(
        VersionComparator::compare("v1.2", "1.2.0", VersionOrdering::Semantic),
        Ordering::Equal
    );
    assert_eq!(
        VersionComparator::compare("release-2.0.0", "version-1.9.9", VersionOrdering::Semantic),
        Ordering::Greater
    );
    assert!(VersionComparator::is_newer("v1.0.0-beta.1", "v1.0.0", VersionOrdering::Semantic));
}

#[test]
fn test_unparseable_tag_orders_below_semantic_version() {
    assert_eq!(
        VersionComparator::compare("latest", "0.3.2", VersionOrdering::Semantic),
        Ordering::Less
    );
    assert_eq!(
        VersionComparator::compare("v0.3.2", "latest", VersionOrdering::Semantic),
        Ordering::Greater
    );
}

#[test]
fn test_unparseable_tags_fall_back_to_lexical() {
    assert_eq!(
        VersionComparator::compare("nightly-b", "nightly-a", VersionOrdering::Semantic),
        Ordering::Greater
    );
}

#[test]
fn test_ordering_from_config_value() {
    #[derive(serde::Deserialize)]
    struct Wrapper {
        ordering: VersionOrdering,
    }

    let parsed: Wrapper = toml::from_str("ordering = \"lexical\"").unwrap();
    assert_eq!(parsed.ordering, VersionOrdering::Lexical);
    assert_eq!(VersionOrdering::default(), VersionOrdering::Semantic);
    assert!(toml::from_str::<Wrapper>("ordering = \"numeric\"").is_err());
}
