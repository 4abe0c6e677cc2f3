// crates/harvest-transform-broker/tests/object_store.rs
// ============================================================================
// Module: Object Store Tests
// Description: Verifies the directory-backed store's key confinement.
// ============================================================================
//! ## Overview
//! Round trips through [`DirObjectStore`] plus rejection of keys that would
//! escape or abuse the backing directory.

#![allow(clippy::unwrap_used, reason = "Tests use unwrap on deterministic fixtures.")]

use harvest_transform_broker::DirObjectStore;
use harvest_transform_broker::ObjectStore;
use harvest_transform_broker::StoreError;
use tempfile::TempDir;

// ============================================================================
// SECTION: Round Trips
// ============================================================================

#[test]
fn put_get_delete_round_trip() {
    let dir = TempDir::new().unwrap();
    let store = DirObjectStore::open(dir.path()).unwrap();

    store.put("harvested/123/catalog.json", b"{}").unwrap();
    assert_eq!(store.get("harvested/123/catalog.json").unwrap(), b"{}");

    store.delete("harvested/123/catalog.json").unwrap();
    assert!(matches!(
        store.get("harvested/123/catalog.json"),
        Err(StoreError::NotFound(_))
    ));
}

#[test]
fn put_replaces_an_existing_object() {
    let dir = TempDir::new().unwrap();
    let store = DirObjectStore::open(dir.path()).unwrap();

    store.put("a/b.json", b"old").unwrap();
    store.put("a/b.json", b"new").unwrap();
    assert_eq!(store.get("a/b.json").unwrap(), b"new");
}

#[test]
fn deleting_an_absent_key_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let store = DirObjectStore::open(dir.path()).unwrap();
    store.delete("never/existed.json").unwrap();
}

#[test]
fn trailing_slashes_are_tolerated_but_leading_ones_are_not() {
    let dir = TempDir::new().unwrap();
    let store = DirObjectStore::open(dir.path()).unwrap();

    store.put("a/b.json/", b"x").unwrap();
    assert_eq!(store.get("a/b.json").unwrap(), b"x");
    assert!(matches!(store.put("/a/b.json", b"x"), Err(StoreError::InvalidKey(_))));
}

// ============================================================================
// SECTION: Key Confinement
// ============================================================================

#[test]
fn traversal_and_malformed_keys_are_rejected() {
    let dir = TempDir::new().unwrap();
    let store = DirObjectStore::open(dir.path()).unwrap();

    for key in ["../escape.json", "a/../../b.json", "a//b.json", ".", "", "/"] {
        assert!(
            matches!(store.put(key, b"x"), Err(StoreError::InvalidKey(_))),
            "key {key:?} should be rejected",
        );
    }
}

#[test]
fn reads_are_confined_like_writes() {
    let dir = TempDir::new().unwrap();
    let store = DirObjectStore::open(dir.path()).unwrap();
    assert!(matches!(
        store.get("../outside.json"),
        Err(StoreError::InvalidKey(_))
    ));
}
