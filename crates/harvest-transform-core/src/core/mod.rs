// crates/harvest-transform-core/src/core/mod.rs
// ============================================================================
// Module: Harvest Transform Core Types
// Description: Data model for document transformation.
// Purpose: Group context, classification, key arithmetic, patching, outcomes.
// Dependencies: crate::core submodules
// ============================================================================

//! ## Overview
//! Core types shared by every pipeline component: the per-batch
//! [`context::TransformContext`], document classification, storage-key
//! arithmetic, the JSON patch engine, and outcome records.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod context;
pub mod document;
pub mod keys;
pub mod outcome;
pub mod patch;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use context::ContextError;
pub use context::ROOT_CATALOG_FILE;
pub use context::TransformContext;
pub use document::ClassifiedDocument;
pub use document::DocumentKind;
pub use document::classify;
pub use keys::KeyError;
pub use keys::TRANSFORMED_PREFIX;
pub use keys::resolve_href;
pub use keys::resolve_storage_key;
pub use outcome::TransformError;
pub use outcome::TransformOutcome;
pub use outcome::TransformWarning;
pub use patch::PatchError;
pub use patch::PatchOperation;
pub use patch::apply_patch;
