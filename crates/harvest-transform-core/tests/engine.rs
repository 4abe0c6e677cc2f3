// crates/harvest-transform-core/tests/engine.rs
// ============================================================================
// Module: Engine Tests
// Description: Verifies pipeline orchestration and failure policy.
// ============================================================================
//! ## Overview
//! End-to-end engine behaviour: opaque passthrough, root identity policy,
//! patch degradation, render injection, and the per-document fatal paths.

#![allow(clippy::unwrap_used, reason = "Tests use unwrap on deterministic fixtures.")]

use std::collections::BTreeSet;

use harvest_transform_core::DocumentKind;
use harvest_transform_core::NullAssetFetcher;
use harvest_transform_core::NullLicenseIndex;
use harvest_transform_core::NullPatchStore;
use harvest_transform_core::PatchOperation;
use harvest_transform_core::PatchStore;
use harvest_transform_core::PatchStoreError;
use harvest_transform_core::RENDER_EXTENSION_URI;
use harvest_transform_core::RenderProfiles;
use harvest_transform_core::TransformContext;
use harvest_transform_core::TransformEngine;
use harvest_transform_core::TransformError;
use harvest_transform_core::TransformWarning;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn context(workspace: Option<&str>, batch_keys: &[&str]) -> TransformContext {
    TransformContext::new(
        "harvested/123",
        "https://host/cat",
        "harvest-bucket",
        workspace.map(str::to_string),
        batch_keys
            .iter()
            .map(|key| (*key).to_string())
            .collect::<BTreeSet<_>>(),
    )
    .unwrap()
}

fn parse(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

// ============================================================================
// SECTION: Opaque Passthrough
// ============================================================================

#[test]
fn non_json_content_passes_through_byte_identical() {
    let ctx = context(None, &["harvested/123/readme.md"]);
    let bytes = b"# Not JSON at all\n";
    let outcome = TransformEngine::minimal()
        .transform(bytes, "harvested/123/readme.md", &ctx)
        .unwrap();
    assert_eq!(outcome.kind, DocumentKind::Opaque);
    assert_eq!(outcome.body, bytes.to_vec());
    assert_eq!(outcome.new_key, "transformed/harvested/123/readme.md");
    assert!(outcome.is_clean());
}

#[test]
fn unrecognized_json_passes_through_with_an_ambiguity_warning() {
    let ctx = context(None, &[]);
    let bytes = br#"{"type": "FeatureCollection", "features": []}"#;
    let outcome = TransformEngine::minimal()
        .transform(bytes, "harvested/123/odd.json", &ctx)
        .unwrap();
    assert_eq!(outcome.kind, DocumentKind::Opaque);
    assert_eq!(outcome.body, bytes.to_vec());
    assert_eq!(outcome.warnings, vec![TransformWarning::ClassificationAmbiguous]);
}

#[test]
fn key_outside_the_source_root_fails_the_document() {
    let ctx = context(None, &[]);
    let err = TransformEngine::minimal()
        .transform(b"{}", "elsewhere/catalog.json", &ctx)
        .unwrap_err();
    assert!(matches!(err, TransformError::KeyResolution(_)));
}

// ============================================================================
// SECTION: Root Identity Policy
// ============================================================================

#[test]
fn batch_root_catalog_takes_the_workspace_identity() {
    let ctx = context(Some("ws-a"), &["harvested/123/catalog.json"]);
    let doc = json!({"type": "Catalog", "id": "harvester-root", "links": []});
    let outcome = TransformEngine::minimal()
        .transform(
            &serde_json::to_vec(&doc).unwrap(),
            "harvested/123/catalog.json",
            &ctx,
        )
        .unwrap();
    assert_eq!(parse(&outcome.body)["id"], json!("ws-a"));
}

#[test]
fn batch_root_keeps_its_id_without_a_workspace() {
    let ctx = context(None, &["harvested/123/catalog.json"]);
    let doc = json!({"type": "Catalog", "id": "root1", "links": []});
    let outcome = TransformEngine::minimal()
        .transform(
            &serde_json::to_vec(&doc).unwrap(),
            "harvested/123/catalog.json",
            &ctx,
        )
        .unwrap();
    assert_eq!(parse(&outcome.body)["id"], json!("root1"));
}

#[test]
fn deeply_nested_catalog_ids_are_never_touched() {
    let ctx = context(
        Some("ws-a"),
        &["harvested/123/catalog.json", "harvested/123/a/b/c/catalog.json"],
    );
    let doc = json!({"type": "Catalog", "id": "nested", "links": []});
    let outcome = TransformEngine::minimal()
        .transform(
            &serde_json::to_vec(&doc).unwrap(),
            "harvested/123/a/b/c/catalog.json",
            &ctx,
        )
        .unwrap();
    assert_eq!(parse(&outcome.body)["id"], json!("nested"));
}

// ============================================================================
// SECTION: Patch Degradation
// ============================================================================

struct FixedPatches(Vec<PatchOperation>);

impl PatchStore for FixedPatches {
    fn fetch(&self, document_id: &str) -> Result<Option<Vec<PatchOperation>>, PatchStoreError> {
        if document_id == "c1" {
            Ok(Some(self.0.clone()))
        } else {
            Ok(None)
        }
    }
}

fn collection() -> Value {
    json!({"type": "Collection", "id": "c1", "title": "Original", "links": []})
}

fn patched_outcome(ops: Value) -> (Value, Vec<TransformWarning>) {
    let engine = TransformEngine::new(
        NullLicenseIndex,
        FixedPatches(serde_json::from_value(ops).unwrap()),
        NullAssetFetcher,
        RenderProfiles::empty(),
    );
    let ctx = context(None, &["harvested/123/collection.json"]);
    let outcome = engine
        .transform(
            &serde_json::to_vec(&collection()).unwrap(),
            "harvested/123/collection.json",
            &ctx,
        )
        .unwrap();
    (parse(&outcome.body), outcome.warnings)
}

#[test]
fn a_valid_patch_is_applied_before_link_rewriting() {
    let (out, warnings) = patched_outcome(json!([
        {"op": "replace", "path": "/title", "value": "Corrected"},
    ]));
    assert_eq!(out["title"], json!("Corrected"));
    assert!(warnings.is_empty());
}

#[test]
fn a_failing_patch_leaves_the_document_unpatched_with_a_warning() {
    let (out, warnings) = patched_outcome(json!([
        {"op": "replace", "path": "/title", "value": "Half"},
        {"op": "test", "path": "/id", "value": "not-c1"},
    ]));
    assert_eq!(out["title"], json!("Original"));
    // The document is still link-rewritten and published.
    assert!(out["links"].as_array().unwrap().iter().any(|link| link["rel"] == json!("self")));
    assert!(matches!(
        warnings.as_slice(),
        [TransformWarning::PatchApplication { document_id, .. }] if document_id == "c1",
    ));
}

#[test]
fn a_failing_patch_store_is_non_fatal() {
    struct BrokenStore;
    impl PatchStore for BrokenStore {
        fn fetch(
            &self,
            _document_id: &str,
        ) -> Result<Option<Vec<PatchOperation>>, PatchStoreError> {
            Err(PatchStoreError::Store("backend offline".to_string()))
        }
    }
    let engine = TransformEngine::new(
        NullLicenseIndex,
        BrokenStore,
        NullAssetFetcher,
        RenderProfiles::empty(),
    );
    let ctx = context(None, &["harvested/123/collection.json"]);
    let outcome = engine
        .transform(
            &serde_json::to_vec(&collection()).unwrap(),
            "harvested/123/collection.json",
            &ctx,
        )
        .unwrap();
    assert_eq!(outcome.warnings.len(), 1);
    assert_eq!(parse(&outcome.body)["title"], json!("Original"));
}

// ============================================================================
// SECTION: Render Injection
// ============================================================================

fn render_engine() -> TransformEngine<NullLicenseIndex, NullPatchStore, NullAssetFetcher> {
    let profiles = RenderProfiles::from_entries([(
        "sentinel-2-l2a".to_string(),
        json!({"visual": {"assets": ["visual"], "rescale": [[0, 3000]]}}),
    )]);
    TransformEngine::new(NullLicenseIndex, NullPatchStore, NullAssetFetcher, profiles)
}

#[test]
fn configured_collections_gain_the_render_extension() {
    let ctx = context(None, &["harvested/123/collection.json"]);
    let doc = json!({"type": "Collection", "id": "sentinel-2-l2a", "links": []});
    let outcome = render_engine()
        .transform(
            &serde_json::to_vec(&doc).unwrap(),
            "harvested/123/collection.json",
            &ctx,
        )
        .unwrap();
    let out = parse(&outcome.body);
    assert!(
        out["stac_extensions"]
            .as_array()
            .unwrap()
            .contains(&json!(RENDER_EXTENSION_URI))
    );
    assert_eq!(out["renders"]["visual"]["assets"], json!(["visual"]));
}

#[test]
fn existing_render_configuration_is_preserved() {
    let ctx = context(None, &["harvested/123/collection.json"]);
    let doc = json!({
        "type": "Collection",
        "id": "sentinel-2-l2a",
        "stac_extensions": [RENDER_EXTENSION_URI],
        "renders": {"curated": {"assets": ["B04"]}},
        "links": [],
    });
    let outcome = render_engine()
        .transform(
            &serde_json::to_vec(&doc).unwrap(),
            "harvested/123/collection.json",
            &ctx,
        )
        .unwrap();
    let out = parse(&outcome.body);
    assert_eq!(out["renders"], json!({"curated": {"assets": ["B04"]}}));
    let extensions = out["stac_extensions"].as_array().unwrap();
    assert_eq!(
        extensions.iter().filter(|uri| *uri == &json!(RENDER_EXTENSION_URI)).count(),
        1,
    );
}

#[test]
fn unlisted_collections_are_untouched() {
    let ctx = context(None, &["harvested/123/collection.json"]);
    let doc = json!({"type": "Collection", "id": "other", "links": []});
    let outcome = render_engine()
        .transform(
            &serde_json::to_vec(&doc).unwrap(),
            "harvested/123/collection.json",
            &ctx,
        )
        .unwrap();
    let out = parse(&outcome.body);
    assert!(out.get("renders").is_none());
    assert!(out.get("stac_extensions").is_none());
}
