// crates/harvest-transform-core/tests/key_resolution.rs
// ============================================================================
// Module: Key Resolution Tests
// Description: Verifies storage key and href remapping under the target root.
// ============================================================================
//! ## Overview
//! Validates that nested catalog structure survives key remapping and that
//! out-of-tree keys fail per document rather than silently mapping.

#![allow(clippy::unwrap_used, reason = "Tests use unwrap on deterministic fixtures.")]

use std::collections::BTreeSet;

use harvest_transform_core::KeyError;
use harvest_transform_core::TransformContext;
use harvest_transform_core::resolve_href;
use harvest_transform_core::resolve_storage_key;

fn context(batch_keys: &[&str]) -> TransformContext {
    TransformContext::new(
        "harvested/123",
        "https://host/cat",
        "harvest-bucket",
        None,
        batch_keys
            .iter()
            .map(|key| (*key).to_string())
            .collect::<BTreeSet<_>>(),
    )
    .unwrap()
}

#[test]
fn storage_key_preserves_every_path_segment() {
    let ctx = context(&[]);
    let key = resolve_storage_key("harvested/123/sub/deeper/collection.json", &ctx).unwrap();
    assert_eq!(key, "transformed/harvested/123/sub/deeper/collection.json");
}

#[test]
fn storage_key_accepts_the_root_key_itself() {
    let ctx = context(&["harvested/123"]);
    let key = resolve_storage_key("harvested/123", &ctx).unwrap();
    assert_eq!(key, "transformed/harvested/123");
}

#[test]
fn storage_key_tolerates_leading_and_trailing_slashes() {
    let ctx = context(&[]);
    let key = resolve_storage_key("/harvested/123/catalog.json/", &ctx).unwrap();
    assert_eq!(key, "transformed/harvested/123/catalog.json");
}

#[test]
fn key_outside_source_root_is_rejected() {
    let ctx = context(&[]);
    let err = resolve_storage_key("harvested/999/catalog.json", &ctx).unwrap_err();
    assert!(matches!(err, KeyError::OutsideSourceRoot { .. }));
}

#[test]
fn sibling_prefix_does_not_count_as_under_root() {
    // "harvested/1234" shares a string prefix with "harvested/123" but is a
    // different directory.
    let ctx = context(&[]);
    let err = resolve_storage_key("harvested/1234/catalog.json", &ctx).unwrap_err();
    assert!(matches!(err, KeyError::OutsideSourceRoot { .. }));
}

#[test]
fn href_is_rooted_at_the_target() {
    let ctx = context(&[]);
    let href = resolve_href("harvested/123/catalog.json", &ctx).unwrap();
    assert_eq!(href, "https://host/cat/transformed/harvested/123/catalog.json");
}

#[test]
fn trailing_slash_on_target_root_does_not_double_up() {
    let ctx = TransformContext::new(
        "harvested/123",
        "https://host/cat/",
        "harvest-bucket",
        None,
        BTreeSet::new(),
    )
    .unwrap();
    let href = resolve_href("harvested/123/catalog.json", &ctx).unwrap();
    assert_eq!(href, "https://host/cat/transformed/harvested/123/catalog.json");
}

#[test]
fn root_key_prefers_a_batch_key_at_the_source_root() {
    let ctx = context(&["harvested/123"]);
    assert_eq!(ctx.root_key(), "harvested/123");
    assert!(ctx.is_batch_root("harvested/123"));
}

#[test]
fn root_key_falls_back_to_the_conventional_catalog_file() {
    let ctx = context(&["harvested/123/catalog.json"]);
    assert_eq!(ctx.root_key(), "harvested/123/catalog.json");
    assert!(ctx.is_batch_root("harvested/123/catalog.json"));
    assert!(!ctx.is_batch_root("harvested/123/sub/catalog.json"));
}
