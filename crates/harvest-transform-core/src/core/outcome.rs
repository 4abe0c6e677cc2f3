// crates/harvest-transform-core/src/core/outcome.rs
// ============================================================================
// Module: Transform Outcomes
// Description: Outcome records, warning taxonomy, and fatal error split.
// Purpose: Thread non-fatal degradation through results instead of aborts.
// Dependencies: crate::core::{document, keys}, serde, thiserror
// ============================================================================

//! ## Overview
//! The engine reports a definitive per-document outcome: either a
//! [`TransformOutcome`] carrying the rewritten bytes plus any non-fatal
//! warnings, or a [`TransformError`] for the two conditions that make a
//! document unpublishable (key resolution and serialization failures).
//! Invariants:
//! - Warnings never change control flow; the degraded document is still
//!   published.
//! - No error on one document affects any other document's outcome.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use thiserror::Error;

use crate::core::document::DocumentKind;
use crate::core::keys::KeyError;

// ============================================================================
// SECTION: Warnings
// ============================================================================

/// Non-fatal degradation recorded against a document's outcome.
///
/// # Invariants
/// - Variants are stable for programmatic handling and telemetry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
pub enum TransformWarning {
    /// Payload parsed as JSON but matched no known document kind.
    #[error("unrecognized json document passed through unmodified")]
    ClassificationAmbiguous,
    /// A patch existed for the document but failed to apply atomically.
    #[error("patch for {document_id} rejected: {detail}")]
    PatchApplication {
        /// Identifier the patch was keyed by.
        document_id: String,
        /// Failure detail.
        detail: String,
    },
    /// License index lookup failed or had no canonical location.
    #[error("license {spdx_id} not resolved: {detail}")]
    LicenseResolution {
        /// SPDX identifier that was looked up.
        spdx_id: String,
        /// Failure detail.
        detail: String,
    },
    /// Build-script scrape failed; derived fields were left blank.
    #[error("workflow scrape failed for {asset_href}: {detail}")]
    Scrape {
        /// Href of the build-script asset.
        asset_href: String,
        /// Failure detail.
        detail: String,
    },
    /// One link could not be rewritten and was left unchanged.
    #[error("link {href} left unchanged: {detail}")]
    LinkRewrite {
        /// Href of the offending link.
        href: String,
        /// Failure detail.
        detail: String,
    },
}

// ============================================================================
// SECTION: Fatal Errors
// ============================================================================

/// Per-document fatal transformation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - A fatal error fails only its own document; the batch continues.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The document's key could not be mapped under the target root.
    #[error(transparent)]
    KeyResolution(#[from] KeyError),
    /// The transformed document could not be re-emitted as bytes.
    #[error("serialization failed for {key}: {reason}")]
    Serialization {
        /// Original key of the document.
        key: String,
        /// Failure detail.
        reason: String,
    },
}

// ============================================================================
// SECTION: Outcome Record
// ============================================================================

/// Successful transformation outcome for one document.
///
/// # Invariants
/// - `body` is valid JSON for structured kinds and byte-identical to the
///   input for [`DocumentKind::Opaque`].
/// - `new_key` is the storage key the body must be published at.
#[derive(Debug, Clone)]
pub struct TransformOutcome {
    /// Detected document kind.
    pub kind: DocumentKind,
    /// Original key the document was harvested at.
    pub original_key: String,
    /// Remapped storage key under the transformed prefix.
    pub new_key: String,
    /// Rewritten payload bytes.
    pub body: Vec<u8>,
    /// Non-fatal warnings collected along the pipeline.
    pub warnings: Vec<TransformWarning>,
}

impl TransformOutcome {
    /// Returns true when the document transformed without degradation.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}
