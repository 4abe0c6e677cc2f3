// crates/harvest-transform-core/tests/patching.rs
// ============================================================================
// Module: Patch Application Tests
// Description: Verifies JSON-patch semantics and transactional rejection.
// ============================================================================
//! ## Overview
//! Exercises add/remove/replace/move/copy/test operations against collection
//! fixtures and confirms a failing operation rejects the whole patch.

#![allow(clippy::unwrap_used, reason = "Tests use unwrap on deterministic fixtures.")]

use harvest_transform_core::PatchError;
use harvest_transform_core::PatchOperation;
use harvest_transform_core::apply_patch;
use serde_json::Value;
use serde_json::json;

fn operations(ops: Value) -> Vec<PatchOperation> {
    serde_json::from_value(ops).unwrap()
}

fn fixture() -> Value {
    json!({
        "type": "Collection",
        "id": "c1",
        "title": "Old Title",
        "keywords": ["sentinel"],
        "extent": {"spatial": {"bbox": [[-10.0, -10.0, 10.0, 10.0]]}},
    })
}

#[test]
fn add_inserts_members_and_appends_to_arrays() {
    let ops = operations(json!([
        {"op": "add", "path": "/description", "value": "A catalogue."},
        {"op": "add", "path": "/keywords/-", "value": "optical"},
        {"op": "add", "path": "/keywords/0", "value": "esa"},
    ]));
    let patched = apply_patch(&fixture(), &ops).unwrap();
    assert_eq!(patched["description"], json!("A catalogue."));
    assert_eq!(patched["keywords"], json!(["esa", "sentinel", "optical"]));
}

#[test]
fn replace_requires_an_existing_member() {
    let ops = operations(json!([
        {"op": "replace", "path": "/title", "value": "New Title"},
    ]));
    let patched = apply_patch(&fixture(), &ops).unwrap();
    assert_eq!(patched["title"], json!("New Title"));

    let missing = operations(json!([
        {"op": "replace", "path": "/missing", "value": 1},
    ]));
    assert!(matches!(
        apply_patch(&fixture(), &missing).unwrap_err(),
        PatchError::PathNotFound { .. },
    ));
}

#[test]
fn remove_and_move_relocate_values() {
    let ops = operations(json!([
        {"op": "move", "from": "/title", "path": "/summaries"},
        {"op": "remove", "path": "/keywords/0"},
    ]));
    let patched = apply_patch(&fixture(), &ops).unwrap();
    assert!(patched.get("title").is_none());
    assert_eq!(patched["summaries"], json!("Old Title"));
    assert_eq!(patched["keywords"], json!([]));
}

#[test]
fn copy_duplicates_a_value() {
    let ops = operations(json!([
        {"op": "copy", "from": "/extent/spatial/bbox", "path": "/summaries"},
    ]));
    let patched = apply_patch(&fixture(), &ops).unwrap();
    assert_eq!(patched["summaries"], patched["extent"]["spatial"]["bbox"]);
}

#[test]
fn test_operation_gates_the_patch() {
    let ops = operations(json!([
        {"op": "test", "path": "/id", "value": "c1"},
        {"op": "replace", "path": "/title", "value": "Gated"},
    ]));
    let patched = apply_patch(&fixture(), &ops).unwrap();
    assert_eq!(patched["title"], json!("Gated"));
}

#[test]
fn failing_operation_rejects_the_whole_patch() {
    let original = fixture();
    let ops = operations(json!([
        {"op": "replace", "path": "/title", "value": "Half Applied"},
        {"op": "test", "path": "/id", "value": "someone-else"},
    ]));
    let err = apply_patch(&original, &ops).unwrap_err();
    assert!(matches!(err, PatchError::TestFailed { .. }));
    // The input document is untouched; no partially patched value escapes.
    assert_eq!(original["title"], json!("Old Title"));
}

#[test]
fn escaped_pointer_tokens_are_decoded() {
    let doc = json!({"a/b": {"c~d": 1}});
    let ops = operations(json!([
        {"op": "replace", "path": "/a~1b/c~0d", "value": 2},
    ]));
    let patched = apply_patch(&doc, &ops).unwrap();
    assert_eq!(patched["a/b"]["c~d"], json!(2));
}

#[test]
fn array_indexes_are_strict() {
    let doc = json!({"items": [1, 2, 3]});
    let leading_zero = operations(json!([
        {"op": "remove", "path": "/items/01"},
    ]));
    assert!(matches!(
        apply_patch(&doc, &leading_zero).unwrap_err(),
        PatchError::InvalidIndex { .. },
    ));
    let out_of_bounds = operations(json!([
        {"op": "remove", "path": "/items/3"},
    ]));
    assert!(apply_patch(&doc, &out_of_bounds).is_err());
}

#[test]
fn moving_a_value_into_itself_is_rejected() {
    let doc = json!({"a": {"b": 1}});
    let ops = operations(json!([
        {"op": "move", "from": "/a", "path": "/a/b"},
    ]));
    assert!(matches!(
        apply_patch(&doc, &ops).unwrap_err(),
        PatchError::MoveIntoSelf { .. },
    ));
}

#[test]
fn unknown_operations_fail_to_decode() {
    let result = serde_json::from_value::<Vec<PatchOperation>>(json!([
        {"op": "merge", "path": "/a", "value": 1},
    ]));
    assert!(result.is_err());
}
