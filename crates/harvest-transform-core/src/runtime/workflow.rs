// crates/harvest-transform-core/src/runtime/workflow.rs
// ============================================================================
// Module: Workflow Collection Synthesizer
// Description: Completes workflow collections from their CWL build script.
// Purpose: Guarantee workflow records satisfy the STAC Collection shape.
// Dependencies: crate::core, crate::interfaces, serde_json, serde_yaml, uuid
// ============================================================================

//! ## Overview
//! Workflow records arrive as fragments: an `assets.cwl_script` entry and
//! little else. This synthesizer fetches the referenced CWL script, locates
//! the `class: Workflow` node in its `$graph`, and fills every required
//! Collection field the record is missing: id, title and description from
//! the script when it yields them, `summaries.inputs`/`summaries.outputs`
//! from the workflow's port declarations, and fixed defaults otherwise.
//! Invariants:
//! - Fields already present with a non-empty value are never overwritten.
//! - Every scrape failure (unreachable script, malformed YAML, no workflow
//!   node) degrades to defaults plus a warning, never an abort.
//! - A minted id carries the `workflow__` prefix so downstream consumers can
//!   distinguish synthesized records.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use uuid::Uuid;

use crate::core::document::CWL_SCRIPT_ASSET;
use crate::core::document::WORKFLOW_ID_PREFIX;
use crate::core::document::WORKFLOW_KEYWORD;
use crate::core::outcome::TransformWarning;
use crate::interfaces::AssetFetcher;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// STAC version stamped onto synthesized collections.
const DEFAULT_STAC_VERSION: &str = "1.0.0";

/// Placeholder for required text fields nothing can populate.
const PLACEHOLDER: &str = "N/A";

/// Fields a STAC Collection must carry, in specification order.
const REQUIRED_FIELDS: [&str; 13] = [
    "type",
    "stac_version",
    "stac_extensions",
    "id",
    "title",
    "description",
    "keywords",
    "license",
    "providers",
    "extent",
    "summaries",
    "links",
    "assets",
];

// ============================================================================
// SECTION: CWL Scrape
// ============================================================================

/// Fields scraped from the main workflow node of a CWL script.
#[derive(Debug, Default)]
struct CwlWorkflow {
    /// Workflow id declared in the script.
    id: Option<String>,
    /// Workflow documentation string.
    doc: Option<String>,
    /// Declared input ports, converted to JSON.
    inputs: Option<Value>,
    /// Declared output ports, converted to JSON.
    outputs: Option<Value>,
}

/// Extracts the `class: Workflow` node from a parsed CWL document.
fn scrape_workflow(cwl: &serde_yaml::Value) -> Result<CwlWorkflow, String> {
    let graph = cwl
        .get("$graph")
        .and_then(serde_yaml::Value::as_sequence)
        .ok_or_else(|| "cwl script has no $graph sequence".to_string())?;
    let node = graph
        .iter()
        .find(|node| {
            node.get("class").and_then(serde_yaml::Value::as_str) == Some("Workflow")
        })
        .ok_or_else(|| "cwl $graph defines no workflow".to_string())?;
    let to_json = |value: &serde_yaml::Value| -> Option<Value> {
        serde_json::to_value(value).ok()
    };
    Ok(CwlWorkflow {
        id: node
            .get("id")
            .and_then(serde_yaml::Value::as_str)
            .map(str::to_string),
        doc: node
            .get("doc")
            .and_then(serde_yaml::Value::as_str)
            .map(str::to_string),
        inputs: node.get("inputs").and_then(to_json),
        outputs: node.get("outputs").and_then(to_json),
    })
}

// ============================================================================
// SECTION: Synthesizer
// ============================================================================

/// Fills missing Collection fields on a workflow record.
pub(crate) struct WorkflowSynthesizer<'run> {
    /// Capability used to retrieve the CWL script body.
    fetcher: &'run dyn AssetFetcher,
}

impl<'run> WorkflowSynthesizer<'run> {
    /// Builds a synthesizer over the given fetch capability.
    pub(crate) fn new(fetcher: &'run dyn AssetFetcher) -> Self {
        Self {
            fetcher,
        }
    }

    /// Completes a workflow collection in place.
    pub(crate) fn synthesize(&self, value: &mut Value, warnings: &mut Vec<TransformWarning>) {
        let scraped = self.scrape(value, warnings).unwrap_or_default();
        let Some(map) = value.as_object_mut() else {
            return;
        };
        for field in REQUIRED_FIELDS {
            fill_field(map, field, &scraped);
        }
        fill_extent(map);
        fill_summaries(map, &scraped);
    }

    /// Fetches and parses the CWL script, reporting failures as warnings.
    fn scrape(
        &self,
        value: &Value,
        warnings: &mut Vec<TransformWarning>,
    ) -> Option<CwlWorkflow> {
        let Some(href) = value
            .get("assets")
            .and_then(|assets| assets.get(CWL_SCRIPT_ASSET))
            .and_then(|asset| asset.get("href"))
            .and_then(Value::as_str)
        else {
            warnings.push(TransformWarning::Scrape {
                asset_href: String::new(),
                detail: "workflow record has no cwl script href".to_string(),
            });
            return None;
        };
        let body = match self.fetcher.fetch_bytes(href) {
            Ok(body) => body,
            Err(err) => {
                warnings.push(TransformWarning::Scrape {
                    asset_href: href.to_string(),
                    detail: err.to_string(),
                });
                return None;
            }
        };
        let cwl: serde_yaml::Value = match serde_yaml::from_slice(&body) {
            Ok(cwl) => cwl,
            Err(err) => {
                warnings.push(TransformWarning::Scrape {
                    asset_href: href.to_string(),
                    detail: format!("cwl script is not valid yaml: {err}"),
                });
                return None;
            }
        };
        match scrape_workflow(&cwl) {
            Ok(scraped) => Some(scraped),
            Err(detail) => {
                warnings.push(TransformWarning::Scrape {
                    asset_href: href.to_string(),
                    detail,
                });
                None
            }
        }
    }
}

// ============================================================================
// SECTION: Field Completion
// ============================================================================

/// Returns whether a field is absent or carries an empty value.
fn is_missing(map: &Map<String, Value>, field: &str) -> bool {
    match map.get(field) {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(members)) => members.is_empty(),
        Some(_) => false,
    }
}

/// Fills one missing required field with scraped data or a default.
fn fill_field(map: &mut Map<String, Value>, field: &str, scraped: &CwlWorkflow) {
    if !is_missing(map, field) {
        return;
    }
    let filled = match field {
        "type" => json!("Collection"),
        "stac_version" => json!(DEFAULT_STAC_VERSION),
        "stac_extensions" | "links" => Value::Array(Vec::new()),
        "id" => Value::String(minted_name(map, scraped, "title")),
        "title" => Value::String(minted_name(map, scraped, "id")),
        "description" => scraped
            .doc
            .as_ref()
            .map_or_else(|| json!(PLACEHOLDER), |doc| json!(doc)),
        "keywords" => json!([WORKFLOW_KEYWORD]),
        "extent" => default_extent(),
        "summaries" => Value::Object(Map::new()),
        _ => json!(PLACEHOLDER),
    };
    map.insert(field.to_string(), filled);
}

/// Derives a workflow id or title, preferring the scraped CWL id.
///
/// When the script yields nothing, the sibling field (title when minting an
/// id, id when minting a title) is reused before falling back to a fresh
/// UUID, so id and title stay in step for sparse records.
fn minted_name(map: &Map<String, Value>, scraped: &CwlWorkflow, sibling: &str) -> String {
    if let Some(id) = &scraped.id {
        return format!("{WORKFLOW_ID_PREFIX}{id}");
    }
    if let Some(existing) = map.get(sibling).and_then(Value::as_str)
        && !existing.is_empty()
    {
        return existing.to_string();
    }
    format!("{WORKFLOW_ID_PREFIX}{}", Uuid::new_v4())
}

/// Completes a partially present extent with world-spanning defaults.
fn fill_extent(map: &mut Map<String, Value>) {
    let Some(extent) = map.get_mut("extent").and_then(Value::as_object_mut) else {
        map.insert("extent".to_string(), default_extent());
        return;
    };
    match extent.get_mut("spatial").and_then(Value::as_object_mut) {
        Some(spatial) => {
            if is_missing(spatial, "bbox") {
                spatial.insert("bbox".to_string(), json!([[-180.0, -90.0, 180.0, 90.0]]));
            }
        }
        None => {
            extent.insert(
                "spatial".to_string(),
                json!({"bbox": [[-180.0, -90.0, 180.0, 90.0]]}),
            );
        }
    }
    match extent.get_mut("temporal").and_then(Value::as_object_mut) {
        Some(temporal) => {
            if is_missing(temporal, "interval") {
                temporal.insert("interval".to_string(), json!([[null, null]]));
            }
        }
        None => {
            extent.insert("temporal".to_string(), json!({"interval": [[null, null]]}));
        }
    }
}

/// The open extent used when a workflow declares no coverage.
fn default_extent() -> Value {
    json!({
        "spatial": {"bbox": [[-180.0, -90.0, 180.0, 90.0]]},
        "temporal": {"interval": [[null, null]]},
    })
}

/// Populates `summaries.inputs`/`summaries.outputs` from scraped ports.
///
/// Port summaries are only written when the script yields them; no
/// placeholder is substituted for a missing port list.
fn fill_summaries(map: &mut Map<String, Value>, scraped: &CwlWorkflow) {
    let Some(summaries) = map.get_mut("summaries").and_then(Value::as_object_mut) else {
        return;
    };
    if is_missing(summaries, "inputs")
        && let Some(inputs) = &scraped.inputs
    {
        summaries.insert("inputs".to_string(), inputs.clone());
    }
    if is_missing(summaries, "outputs")
        && let Some(outputs) = &scraped.outputs
    {
        summaries.insert("outputs".to_string(), outputs.clone());
    }
}
