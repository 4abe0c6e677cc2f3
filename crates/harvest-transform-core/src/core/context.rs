// crates/harvest-transform-core/src/core/context.rs
// ============================================================================
// Module: Transform Context
// Description: Immutable per-batch context for document transformation.
// Purpose: Carry source/target roots and batch key membership for key arithmetic.
// Dependencies: thiserror, url
// ============================================================================

//! ## Overview
//! A [`TransformContext`] is constructed once per incoming harvest batch and
//! read-only thereafter. It names the source root (a key prefix under the
//! bucket), the target root (the absolute URL of the new canonical catalogue
//! root), the workspace, and the full set of keys in the batch.
//! Invariants:
//! - `source_root` is a normalized key prefix without leading or trailing `/`.
//! - `target_root` is an absolute `http`/`https` URL.
//! - Batch-root membership is decided by key arithmetic, never by document
//!   `type`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Conventional file name of the root catalog emitted by harvesters.
pub const ROOT_CATALOG_FILE: &str = "catalog.json";

// ============================================================================
// SECTION: Context Errors
// ============================================================================

/// Errors raised while constructing a transform context.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ContextError {
    /// Source root is empty after normalization.
    #[error("source root must not be empty")]
    EmptySourceRoot,
    /// Target root is not an absolute http(s) URL.
    #[error("target root must be an absolute http(s) url: {0}")]
    InvalidTargetRoot(String),
    /// Bucket name is empty.
    #[error("bucket must not be empty")]
    EmptyBucket,
}

// ============================================================================
// SECTION: Transform Context
// ============================================================================

/// Immutable per-batch transformation context.
///
/// # Invariants
/// - Constructed once per batch message and never mutated afterwards.
/// - `batch_keys` holds every added/updated key of the batch, used to decide
///   whether a root-typed document is *the* batch root or merely nested.
#[derive(Debug, Clone)]
pub struct TransformContext {
    /// Normalized source root key prefix (no leading/trailing slash).
    source_root: String,
    /// Absolute URL of the new canonical catalogue root.
    target_root: Url,
    /// Bucket holding the harvested documents.
    bucket: String,
    /// Workspace the batch belongs to, when the message names one.
    workspace: Option<String>,
    /// Every added/updated key present in the current batch.
    batch_keys: BTreeSet<String>,
}

impl TransformContext {
    /// Creates a validated transform context for one batch.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError`] when the source root is empty, the target root
    /// is not an absolute http(s) URL, or the bucket name is empty.
    pub fn new(
        source_root: impl Into<String>,
        target_root: &str,
        bucket: impl Into<String>,
        workspace: Option<String>,
        batch_keys: BTreeSet<String>,
    ) -> Result<Self, ContextError> {
        let source_root = trim_key(&source_root.into()).to_string();
        if source_root.is_empty() {
            return Err(ContextError::EmptySourceRoot);
        }
        let target_root = Url::parse(target_root)
            .map_err(|err| ContextError::InvalidTargetRoot(err.to_string()))?;
        if target_root.scheme() != "http" && target_root.scheme() != "https" {
            return Err(ContextError::InvalidTargetRoot(target_root.to_string()));
        }
        let bucket = bucket.into();
        if bucket.is_empty() {
            return Err(ContextError::EmptyBucket);
        }
        Ok(Self {
            source_root,
            target_root,
            bucket,
            workspace,
            batch_keys,
        })
    }

    /// Returns the normalized source root key prefix.
    #[must_use]
    pub fn source_root(&self) -> &str {
        &self.source_root
    }

    /// Returns the target root URL.
    #[must_use]
    pub const fn target_root(&self) -> &Url {
        &self.target_root
    }

    /// Returns the target root URL without a trailing slash.
    #[must_use]
    pub fn target_root_str(&self) -> &str {
        self.target_root.as_str().trim_end_matches('/')
    }

    /// Returns the bucket holding the harvested documents.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Returns the workspace the batch belongs to, if any.
    #[must_use]
    pub fn workspace(&self) -> Option<&str> {
        self.workspace.as_deref()
    }

    /// Returns true when the key is part of the current batch.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.batch_keys.contains(trim_key(key))
    }

    /// Returns the original key of the batch root document.
    ///
    /// The root is the document stored at the declared source root itself, or
    /// at the conventional `catalog.json` directly beneath it.
    #[must_use]
    pub fn root_key(&self) -> String {
        if self.batch_keys.contains(&self.source_root) {
            return self.source_root.clone();
        }
        format!("{}/{ROOT_CATALOG_FILE}", self.source_root)
    }

    /// Returns true when the key identifies the batch root document.
    ///
    /// Root-ness is decided by key equality against the declared source root,
    /// never by a document's own `type`. A `type=Catalog` document nested
    /// deeper in the tree is not the batch root.
    #[must_use]
    pub fn is_batch_root(&self, key: &str) -> bool {
        let key = trim_key(key);
        key == self.source_root || key == self.root_key()
    }
}

// ============================================================================
// SECTION: Key Helpers
// ============================================================================

/// Trims leading and trailing slashes from a bucket key.
#[must_use]
pub(crate) fn trim_key(key: &str) -> &str {
    key.trim_matches('/')
}
