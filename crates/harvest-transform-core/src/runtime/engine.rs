// crates/harvest-transform-core/src/runtime/engine.rs
// ============================================================================
// Module: Transform Engine
// Description: Orchestrates the per-document transformation pipeline.
// Purpose: Turn one harvested document into its canonical transformed form.
// Dependencies: crate::core, crate::interfaces, crate::runtime, serde_json
// ============================================================================

//! ## Overview
//! The engine drives one document through classification, key resolution,
//! patching, workflow synthesis, link rewriting, render injection and
//! serialization. Each invocation is independent and synchronous; blocking
//! I/O lives behind the capability traits, so callers may run invocations
//! in parallel across a batch without coordination.
//! Invariants:
//! - Opaque content passes through byte-identical at the remapped key.
//! - Only key resolution and serialization fail a document; every other
//!   stage degrades to a warning on the outcome record.
//! - Only the batch root's catalog identity is rewritten; every nested
//!   catalog keeps its original id.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

use crate::core::context::TransformContext;
use crate::core::document::ClassifiedDocument;
use crate::core::document::DocumentKind;
use crate::core::document::classify;
use crate::core::keys::resolve_storage_key;
use crate::core::outcome::TransformError;
use crate::core::outcome::TransformOutcome;
use crate::core::outcome::TransformWarning;
use crate::core::patch::apply_patch;
use crate::interfaces::AssetFetcher;
use crate::interfaces::LicenseIndex;
use crate::interfaces::NullAssetFetcher;
use crate::interfaces::NullLicenseIndex;
use crate::interfaces::NullPatchStore;
use crate::interfaces::PatchStore;
use crate::runtime::links::LinkRewriter;
use crate::runtime::render::RenderProfiles;
use crate::runtime::workflow::WorkflowSynthesizer;

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Transforms harvested documents one at a time.
///
/// # Invariants
/// - Holds only read-only capabilities; safe to share across worker threads.
#[derive(Debug)]
pub struct TransformEngine<L, P, F>
where
    L: LicenseIndex,
    P: PatchStore,
    F: AssetFetcher,
{
    /// SPDX identifier to canonical license-file index.
    license: L,
    /// Per-document correction patches.
    patches: P,
    /// Retrieval capability for build-script assets.
    fetcher: F,
    /// Curated render profiles keyed by collection id.
    renders: RenderProfiles,
}

impl TransformEngine<NullLicenseIndex, NullPatchStore, NullAssetFetcher> {
    /// Builds an engine with no external capabilities configured.
    ///
    /// License routing, patching and workflow scraping all degrade to their
    /// warning paths; key remapping and link rewriting work in full.
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            license: NullLicenseIndex,
            patches: NullPatchStore,
            fetcher: NullAssetFetcher,
            renders: RenderProfiles::empty(),
        }
    }
}

impl<L, P, F> TransformEngine<L, P, F>
where
    L: LicenseIndex,
    P: PatchStore,
    F: AssetFetcher,
{
    /// Builds an engine over the given capabilities and render profiles.
    pub fn new(license: L, patches: P, fetcher: F, renders: RenderProfiles) -> Self {
        Self {
            license,
            patches,
            fetcher,
            renders,
        }
    }

    /// Transforms one document, returning its new key, body and outcome.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError`] when the original key falls outside the
    /// batch's source root or the rewritten document cannot be serialized.
    /// All other failures surface as warnings on the outcome.
    pub fn transform(
        &self,
        bytes: &[u8],
        original_key: &str,
        ctx: &TransformContext,
    ) -> Result<TransformOutcome, TransformError> {
        let new_key = resolve_storage_key(original_key, ctx)?;
        let mut warnings = Vec::new();
        let (mut value, kind, batch_root) = match classify(bytes, original_key, ctx) {
            ClassifiedDocument::Structured {
                value,
                kind,
                batch_root,
            } => (value, kind, batch_root),
            ClassifiedDocument::Opaque {
                ambiguous,
            } => {
                if ambiguous {
                    warnings.push(TransformWarning::ClassificationAmbiguous);
                }
                return Ok(TransformOutcome {
                    kind: DocumentKind::Opaque,
                    original_key: original_key.to_string(),
                    new_key,
                    body: bytes.to_vec(),
                    warnings,
                });
            }
        };

        if batch_root && kind == DocumentKind::Catalog {
            self.update_root_identity(&mut value, ctx);
        }
        if kind.is_collection() {
            self.apply_patches(&mut value, &mut warnings);
        }
        if kind == DocumentKind::WorkflowCollection {
            WorkflowSynthesizer::new(&self.fetcher).synthesize(&mut value, &mut warnings);
        }
        LinkRewriter::new(ctx, original_key, &self.license)?
            .rewrite(&mut value, &mut warnings);
        if kind.is_collection() {
            self.renders.apply(&mut value);
        }

        let body = serde_json::to_vec(&value).map_err(|err| TransformError::Serialization {
            key: original_key.to_string(),
            reason: err.to_string(),
        })?;
        Ok(TransformOutcome {
            kind,
            original_key: original_key.to_string(),
            new_key,
            body,
            warnings,
        })
    }

    /// Renames the batch root catalog when a workspace identity is declared.
    ///
    /// Only the document at the batch's declared source root is eligible;
    /// nested `type=Catalog` documents keep their ids unconditionally.
    /// Without an explicit workspace, even the root keeps its harvested id.
    fn update_root_identity(&self, value: &mut Value, ctx: &TransformContext) {
        let Some(workspace) = ctx.workspace() else {
            return;
        };
        if let Some(map) = value.as_object_mut() {
            map.insert("id".to_string(), Value::String(workspace.to_string()));
        }
    }

    /// Fetches and applies the document's correction patch, if one exists.
    ///
    /// Store failures and patch failures both leave the document in its
    /// pre-patch state; a partially applied patch is never emitted.
    fn apply_patches(&self, value: &mut Value, warnings: &mut Vec<TransformWarning>) {
        let Some(document_id) = value.get("id").and_then(Value::as_str).map(str::to_string)
        else {
            return;
        };
        let operations = match self.patches.fetch(&document_id) {
            Ok(Some(operations)) => operations,
            Ok(None) => return,
            Err(err) => {
                warnings.push(TransformWarning::PatchApplication {
                    document_id,
                    detail: err.to_string(),
                });
                return;
            }
        };
        match apply_patch(value, &operations) {
            Ok(patched) => *value = patched,
            Err(err) => {
                warnings.push(TransformWarning::PatchApplication {
                    document_id,
                    detail: err.to_string(),
                });
            }
        }
    }
}
