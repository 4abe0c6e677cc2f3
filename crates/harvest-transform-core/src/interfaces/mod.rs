// crates/harvest-transform-core/src/interfaces/mod.rs
// ============================================================================
// Module: Harvest Transform Interfaces
// Description: Backend-agnostic capabilities for license, patch, and asset I/O.
// Purpose: Keep the engine pure by injecting read-only lookups at the seams.
// Dependencies: crate::core::patch, thiserror
// ============================================================================

//! ## Overview
//! The engine performs no I/O of its own. Blocking lookups (the license-file
//! index, the patch store, and build-script fetches) are injected as
//! capability traits so tests substitute fixed fakes without network or
//! storage dependencies. Every capability is a read-only, idempotent lookup;
//! failures degrade to warnings inside the engine rather than aborting a
//! document.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::patch::PatchOperation;

// ============================================================================
// SECTION: License Index
// ============================================================================

/// Canonical license-file link resolved from an SPDX identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseLink {
    /// Absolute href of the canonical license file.
    pub href: String,
    /// Media type of the license file, when known.
    pub media_type: Option<String>,
}

/// License index errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum LicenseIndexError {
    /// Index lookup failed.
    #[error("license index error: {0}")]
    Index(String),
}

/// Read-only index mapping SPDX identifiers to canonical license files.
pub trait LicenseIndex {
    /// Resolves an SPDX identifier to a canonical license link.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseIndexError`] when the index cannot be consulted.
    fn resolve(&self, spdx_id: &str) -> Result<Option<LicenseLink>, LicenseIndexError>;
}

impl<T: LicenseIndex + ?Sized> LicenseIndex for Box<T> {
    fn resolve(&self, spdx_id: &str) -> Result<Option<LicenseLink>, LicenseIndexError> {
        (**self).resolve(spdx_id)
    }
}

/// License index with no entries; every lookup misses.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLicenseIndex;

impl LicenseIndex for NullLicenseIndex {
    fn resolve(&self, _spdx_id: &str) -> Result<Option<LicenseLink>, LicenseIndexError> {
        Ok(None)
    }
}

// ============================================================================
// SECTION: Patch Store
// ============================================================================

/// Patch store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum PatchStoreError {
    /// Store lookup failed.
    #[error("patch store error: {0}")]
    Store(String),
    /// Stored patch bytes failed to decode.
    #[error("patch decode error: {0}")]
    Decode(String),
}

/// Read-only store of patches keyed by document identifier.
pub trait PatchStore {
    /// Fetches the patch for a document, if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`PatchStoreError`] when the store cannot be consulted or the
    /// stored patch fails to decode.
    fn fetch(&self, document_id: &str) -> Result<Option<Vec<PatchOperation>>, PatchStoreError>;
}

impl<T: PatchStore + ?Sized> PatchStore for Box<T> {
    fn fetch(&self, document_id: &str) -> Result<Option<Vec<PatchOperation>>, PatchStoreError> {
        (**self).fetch(document_id)
    }
}

/// Patch store with no entries; every fetch misses.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPatchStore;

impl PatchStore for NullPatchStore {
    fn fetch(&self, _document_id: &str) -> Result<Option<Vec<PatchOperation>>, PatchStoreError> {
        Ok(None)
    }
}

// ============================================================================
// SECTION: Asset Fetcher
// ============================================================================

/// Asset fetch errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Asset location could not be reached.
    #[error("asset unreachable: {0}")]
    Unreachable(String),
    /// Asset location is not permitted by fetch policy.
    #[error("asset fetch denied: {0}")]
    Denied(String),
    /// Asset exceeds the configured size limit.
    #[error("asset too large: {uri} ({actual_bytes} > {max_bytes})")]
    TooLarge {
        /// Asset URI.
        uri: String,
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual (or announced) size in bytes.
        actual_bytes: usize,
    },
}

/// Fetches referenced asset bytes (build scripts) for synthesis.
pub trait AssetFetcher {
    /// Fetches the bytes at an asset URI.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when the asset is unreachable, denied by
    /// policy, or too large.
    fn fetch_bytes(&self, uri: &str) -> Result<Vec<u8>, FetchError>;
}

impl<T: AssetFetcher + ?Sized> AssetFetcher for Box<T> {
    fn fetch_bytes(&self, uri: &str) -> Result<Vec<u8>, FetchError> {
        (**self).fetch_bytes(uri)
    }
}

/// Asset fetcher that treats every location as unreachable.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAssetFetcher;

impl AssetFetcher for NullAssetFetcher {
    fn fetch_bytes(&self, uri: &str) -> Result<Vec<u8>, FetchError> {
        Err(FetchError::Unreachable(uri.to_string()))
    }
}
