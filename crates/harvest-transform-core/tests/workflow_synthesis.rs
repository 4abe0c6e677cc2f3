// crates/harvest-transform-core/tests/workflow_synthesis.rs
// ============================================================================
// Module: Workflow Synthesis Tests
// Description: Verifies workflow collection completion from CWL scripts.
// ============================================================================
//! ## Overview
//! Feeds workflow fragments through the engine with a fixed-script fetcher
//! and checks scraped fields, defaults, and degradation when the script is
//! unreachable.

#![allow(clippy::unwrap_used, reason = "Tests use unwrap on deterministic fixtures.")]

use std::collections::BTreeSet;

use harvest_transform_core::AssetFetcher;
use harvest_transform_core::FetchError;
use harvest_transform_core::NullLicenseIndex;
use harvest_transform_core::NullPatchStore;
use harvest_transform_core::RenderProfiles;
use harvest_transform_core::TransformContext;
use harvest_transform_core::TransformEngine;
use harvest_transform_core::TransformWarning;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Helpers
// ============================================================================

const CWL_SCRIPT: &str = r"
cwlVersion: v1.0
$graph:
  - class: CommandLineTool
    id: convert
  - class: Workflow
    id: convert-url
    label: convert url app
    doc: Convert URL
    inputs:
      fn:
        label: the operation to perform
        doc: the operation to perform
        type: string
      url:
        label: the url of the image to convert
        doc: the url of the image to convert
        type: string
      size:
        label: the percentage of the resizing
        doc: the percentage of the resizing
        type: string
    outputs:
      - id: converted_image
        type: Directory
        outputSource:
          - convert/results
";

struct FixedScript;

impl AssetFetcher for FixedScript {
    fn fetch_bytes(&self, _uri: &str) -> Result<Vec<u8>, FetchError> {
        Ok(CWL_SCRIPT.as_bytes().to_vec())
    }
}

struct Offline;

impl AssetFetcher for Offline {
    fn fetch_bytes(&self, uri: &str) -> Result<Vec<u8>, FetchError> {
        Err(FetchError::Unreachable(uri.to_string()))
    }
}

fn context() -> TransformContext {
    TransformContext::new(
        "harvested/wf",
        "https://host/cat",
        "harvest-bucket",
        None,
        BTreeSet::from(["harvested/wf/workflow.json".to_string()]),
    )
    .unwrap()
}

fn fragment() -> Value {
    json!({
        "assets": {
            "cwl_script": {"href": "https://git.example/repo/convert.cwl"},
        },
    })
}

fn synthesize<F: AssetFetcher>(fetcher: F, doc: &Value) -> (Value, Vec<TransformWarning>) {
    let engine = TransformEngine::new(
        NullLicenseIndex,
        NullPatchStore,
        fetcher,
        RenderProfiles::empty(),
    );
    let outcome = engine
        .transform(
            &serde_json::to_vec(doc).unwrap(),
            "harvested/wf/workflow.json",
            &context(),
        )
        .unwrap();
    (serde_json::from_slice(&outcome.body).unwrap(), outcome.warnings)
}

// ============================================================================
// SECTION: Scraped Fields
// ============================================================================

#[test]
fn inputs_are_scraped_into_summaries() {
    let (out, warnings) = synthesize(FixedScript, &fragment());
    let inputs = out["summaries"]["inputs"].as_object().unwrap();
    for port in ["fn", "url", "size"] {
        let entry = inputs[port].as_object().unwrap();
        assert!(!entry["label"].as_str().unwrap().is_empty());
        assert!(!entry["doc"].as_str().unwrap().is_empty());
        assert!(!entry["type"].as_str().unwrap().is_empty());
    }
    assert!(out["summaries"]["outputs"].is_array());
    assert!(warnings.is_empty());
}

#[test]
fn identity_and_description_come_from_the_script() {
    let (out, _warnings) = synthesize(FixedScript, &fragment());
    assert_eq!(out["id"], json!("workflow__convert-url"));
    assert_eq!(out["title"], json!("workflow__convert-url"));
    assert_eq!(out["description"], json!("Convert URL"));
}

#[test]
fn required_collection_fields_are_defaulted() {
    let (out, _warnings) = synthesize(FixedScript, &fragment());
    assert_eq!(out["type"], json!("Collection"));
    assert_eq!(out["stac_version"], json!("1.0.0"));
    assert_eq!(out["stac_extensions"], json!([]));
    assert_eq!(out["keywords"], json!(["workflow"]));
    assert_eq!(out["license"], json!("N/A"));
    assert_eq!(out["extent"]["spatial"]["bbox"], json!([[-180.0, -90.0, 180.0, 90.0]]));
    assert_eq!(out["extent"]["temporal"]["interval"], json!([[null, null]]));
}

#[test]
fn existing_fields_are_never_overwritten() {
    let mut doc = fragment();
    doc["id"] = json!("workflow__existing");
    doc["description"] = json!("Hand-written description.");
    let (out, _warnings) = synthesize(FixedScript, &doc);
    assert_eq!(out["id"], json!("workflow__existing"));
    assert_eq!(out["description"], json!("Hand-written description."));
}

#[test]
fn partial_extents_are_completed_not_replaced() {
    let mut doc = fragment();
    doc["extent"] = json!({"spatial": {"bbox": [[0.0, 0.0, 1.0, 1.0]]}});
    let (out, _warnings) = synthesize(FixedScript, &doc);
    assert_eq!(out["extent"]["spatial"]["bbox"], json!([[0.0, 0.0, 1.0, 1.0]]));
    assert_eq!(out["extent"]["temporal"]["interval"], json!([[null, null]]));
}

// ============================================================================
// SECTION: Degradation
// ============================================================================

#[test]
fn unreachable_script_falls_back_to_defaults_with_a_warning() {
    let (out, warnings) = synthesize(Offline, &fragment());
    let id = out["id"].as_str().unwrap();
    assert!(id.starts_with("workflow__"));
    assert_eq!(out["type"], json!("Collection"));
    assert!(out["summaries"].as_object().unwrap().get("inputs").is_none());
    assert!(matches!(
        warnings.as_slice(),
        [TransformWarning::Scrape { .. }],
    ));
}

#[test]
fn malformed_script_falls_back_to_defaults_with_a_warning() {
    struct Garbage;
    impl AssetFetcher for Garbage {
        fn fetch_bytes(&self, _uri: &str) -> Result<Vec<u8>, FetchError> {
            Ok(b"{ not: [ yaml".to_vec())
        }
    }
    let (out, warnings) = synthesize(Garbage, &fragment());
    assert_eq!(out["type"], json!("Collection"));
    assert_eq!(warnings.len(), 1);
}

#[test]
fn script_without_a_workflow_node_warns() {
    struct NoWorkflow;
    impl AssetFetcher for NoWorkflow {
        fn fetch_bytes(&self, _uri: &str) -> Result<Vec<u8>, FetchError> {
            Ok(b"$graph:\n  - class: CommandLineTool\n    id: convert\n".to_vec())
        }
    }
    let (out, warnings) = synthesize(NoWorkflow, &fragment());
    assert_eq!(out["type"], json!("Collection"));
    assert!(matches!(
        warnings.as_slice(),
        [TransformWarning::Scrape { .. }],
    ));
}
