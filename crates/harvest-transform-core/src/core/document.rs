// crates/harvest-transform-core/src/core/document.rs
// ============================================================================
// Module: Document Classification
// Description: Document kind detection for harvested metadata payloads.
// Purpose: Centralize kind and root-ness decisions behind one tagged variant.
// Dependencies: crate::core::context, serde_json
// ============================================================================

//! ## Overview
//! Classification inspects one raw payload and yields a tagged
//! [`ClassifiedDocument`]. Every downstream component matches on the tag
//! instead of re-inspecting fields at call sites.
//! Invariants:
//! - Parse failures and non-object JSON fall back to `Opaque`; the payload
//!   still passes through byte-identical at the remapped key.
//! - Batch-root detection uses key arithmetic from [`TransformContext`],
//!   never the document's own `type`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

use crate::core::context::TransformContext;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Asset name conventionally holding a workflow's CWL build script.
pub const CWL_SCRIPT_ASSET: &str = "cwl_script";

/// Identifier prefix marking synthesized workflow collections.
pub const WORKFLOW_ID_PREFIX: &str = "workflow__";

/// Keyword marking a collection as a workflow description.
pub const WORKFLOW_KEYWORD: &str = "workflow";

// ============================================================================
// SECTION: Document Kind
// ============================================================================

/// Kind of a harvested metadata document.
///
/// # Invariants
/// - Variants are stable for outcome reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum DocumentKind {
    /// STAC Catalog document.
    Catalog,
    /// STAC Collection document describing a dataset.
    Collection,
    /// STAC Collection document describing an executable workflow.
    WorkflowCollection,
    /// STAC Item document.
    Item,
    /// Non-JSON or unrecognized payload passed through unmodified.
    Opaque,
}

impl DocumentKind {
    /// Returns a stable label for outcome reporting.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Catalog => "catalog",
            Self::Collection => "collection",
            Self::WorkflowCollection => "workflow-collection",
            Self::Item => "item",
            Self::Opaque => "opaque",
        }
    }

    /// Returns true for collection-kind documents (patch and render targets).
    #[must_use]
    pub const fn is_collection(self) -> bool {
        matches!(self, Self::Collection | Self::WorkflowCollection)
    }
}

// ============================================================================
// SECTION: Classified Document
// ============================================================================

/// Result of classifying one raw payload.
#[derive(Debug, Clone)]
pub enum ClassifiedDocument {
    /// Structured STAC document with a parsed tree.
    Structured {
        /// Parsed document tree.
        value: Value,
        /// Detected document kind.
        kind: DocumentKind,
        /// True when this document is the batch root by key arithmetic.
        batch_root: bool,
    },
    /// Payload that is not a structured STAC document.
    Opaque {
        /// True when the payload parsed as JSON but matched no known kind.
        ambiguous: bool,
    },
}

// ============================================================================
// SECTION: Classification
// ============================================================================

/// Classifies a raw payload by content and context.
///
/// Malformed JSON and non-object payloads yield [`ClassifiedDocument::Opaque`]
/// so the caller can pass the original bytes through unmodified.
#[must_use]
pub fn classify(bytes: &[u8], original_key: &str, ctx: &TransformContext) -> ClassifiedDocument {
    let Ok(value) = serde_json::from_slice::<Value>(bytes) else {
        return ClassifiedDocument::Opaque {
            ambiguous: false,
        };
    };
    if !value.is_object() {
        return ClassifiedDocument::Opaque {
            ambiguous: true,
        };
    }
    let Some(kind) = detect_kind(&value) else {
        return ClassifiedDocument::Opaque {
            ambiguous: true,
        };
    };
    ClassifiedDocument::Structured {
        batch_root: ctx.is_batch_root(original_key),
        value,
        kind,
    }
}

/// Detects the STAC kind of a parsed object, if any.
fn detect_kind(value: &Value) -> Option<DocumentKind> {
    match value.get("type").and_then(Value::as_str) {
        Some("Catalog") => Some(DocumentKind::Catalog),
        Some("Collection") => {
            if has_workflow_markers(value) {
                Some(DocumentKind::WorkflowCollection)
            } else {
                Some(DocumentKind::Collection)
            }
        }
        Some("Feature") => Some(DocumentKind::Item),
        Some(_) => None,
        None => {
            // Harvesters emit workflow definitions before the collection
            // scaffolding exists, so a cwl_script asset alone marks one.
            if has_cwl_script_asset(value) {
                Some(DocumentKind::WorkflowCollection)
            } else if value.get("geometry").is_some() && value.get("properties").is_some() {
                Some(DocumentKind::Item)
            } else {
                None
            }
        }
    }
}

/// Returns true when a collection carries any workflow marker.
fn has_workflow_markers(value: &Value) -> bool {
    if has_cwl_script_asset(value) {
        return true;
    }
    if value
        .get("id")
        .and_then(Value::as_str)
        .is_some_and(|id| id.starts_with(WORKFLOW_ID_PREFIX))
    {
        return true;
    }
    value
        .get("keywords")
        .and_then(Value::as_array)
        .is_some_and(|keywords| keywords.iter().any(|word| word == WORKFLOW_KEYWORD))
}

/// Returns true when the document's assets include a CWL build script.
fn has_cwl_script_asset(value: &Value) -> bool {
    value
        .get("assets")
        .and_then(Value::as_object)
        .is_some_and(|assets| assets.contains_key(CWL_SCRIPT_ASSET))
}
