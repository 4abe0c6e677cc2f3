// crates/harvest-transform-core/src/lib.rs
// ============================================================================
// Module: Harvest Transform Core Library
// Description: Public API surface for the harvest transform core.
// Purpose: Expose document transformation types, interfaces, and the engine.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Harvest transform core rewrites harvested STAC documents onto a new
//! canonical root: classification, key remapping, link-graph rewriting,
//! correction patches, workflow collection synthesis and render-extension
//! injection. It performs no I/O of its own and integrates with stores,
//! fetchers and indexes through explicit interfaces.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::ClassifiedDocument;
pub use crate::core::ContextError;
pub use crate::core::DocumentKind;
pub use crate::core::KeyError;
pub use crate::core::PatchError;
pub use crate::core::PatchOperation;
pub use crate::core::ROOT_CATALOG_FILE;
pub use crate::core::TRANSFORMED_PREFIX;
pub use crate::core::TransformContext;
pub use crate::core::TransformError;
pub use crate::core::TransformOutcome;
pub use crate::core::TransformWarning;
pub use crate::core::apply_patch;
pub use crate::core::classify;
pub use crate::core::resolve_href;
pub use crate::core::resolve_storage_key;
pub use interfaces::AssetFetcher;
pub use interfaces::FetchError;
pub use interfaces::LicenseIndex;
pub use interfaces::LicenseIndexError;
pub use interfaces::LicenseLink;
pub use interfaces::NullAssetFetcher;
pub use interfaces::NullLicenseIndex;
pub use interfaces::NullPatchStore;
pub use interfaces::PatchStore;
pub use interfaces::PatchStoreError;
pub use runtime::RENDER_EXTENSION_URI;
pub use runtime::RenderProfiles;
pub use runtime::TransformEngine;
