// crates/harvest-transform-core/src/core/keys.rs
// ============================================================================
// Module: Catalog Key Resolution
// Description: Storage-key and href derivation for transformed documents.
// Purpose: Map harvested keys under the target root with path-prefix arithmetic.
// Dependencies: crate::core::context, thiserror, url
// ============================================================================

//! ## Overview
//! Key resolution is pure path-prefix arithmetic: a harvested key that falls
//! under the batch's source root maps to `transformed/<key>` in storage, and
//! to `<target_root>/transformed/<key>` as an absolute href. All intermediate
//! path segments are preserved verbatim so nested catalog trees reproduce
//! exactly under the new root.
//! Invariants:
//! - Resolution fails for keys outside the source root; the caller surfaces
//!   this per key rather than aborting the batch.
//! - Resolving an already-resolved href recomputes the identical result
//!   (idempotence).

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;
use url::Url;

use crate::core::context::TransformContext;
use crate::core::context::trim_key;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Fixed storage segment prepended to every transformed key.
pub const TRANSFORMED_PREFIX: &str = "transformed";

// ============================================================================
// SECTION: Key Errors
// ============================================================================

/// Errors raised while resolving a document's new storage key or href.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - `OutsideSourceRoot` is per-document fatal; the batch continues.
#[derive(Debug, Error)]
pub enum KeyError {
    /// Key does not start with the batch's source root.
    #[error("key {key} is outside source root {source_root}")]
    OutsideSourceRoot {
        /// Offending key.
        key: String,
        /// Declared source root of the batch.
        source_root: String,
    },
    /// Joining the storage key onto the target root produced an invalid URL.
    #[error("key {key} produces an invalid target href: {reason}")]
    InvalidHref {
        /// Offending key.
        key: String,
        /// Parse failure detail.
        reason: String,
    },
}

// ============================================================================
// SECTION: Key Resolution
// ============================================================================

/// Derives the new storage key for a harvested key.
///
/// # Errors
///
/// Returns [`KeyError::OutsideSourceRoot`] when the key does not fall under
/// the context's source root.
pub fn resolve_storage_key(key: &str, ctx: &TransformContext) -> Result<String, KeyError> {
    let trimmed = trim_key(key);
    if !is_under_root(trimmed, ctx.source_root()) {
        return Err(KeyError::OutsideSourceRoot {
            key: key.to_string(),
            source_root: ctx.source_root().to_string(),
        });
    }
    Ok(format!("{TRANSFORMED_PREFIX}/{trimmed}"))
}

/// Derives the new absolute href for a harvested key.
///
/// # Errors
///
/// Returns [`KeyError`] when the key is outside the source root or the joined
/// URL fails to parse.
pub fn resolve_href(key: &str, ctx: &TransformContext) -> Result<String, KeyError> {
    let storage_key = resolve_storage_key(key, ctx)?;
    let href = format!("{}/{storage_key}", ctx.target_root_str());
    Url::parse(&href).map_err(|err| KeyError::InvalidHref {
        key: key.to_string(),
        reason: err.to_string(),
    })?;
    Ok(href)
}

/// Returns true when a trimmed key equals the root or sits beneath it.
#[must_use]
pub(crate) fn is_under_root(key: &str, root: &str) -> bool {
    key == root || key.strip_prefix(root).is_some_and(|rest| rest.starts_with('/'))
}

// ============================================================================
// SECTION: Path Arithmetic
// ============================================================================

/// Resolves a relative href against the directory of a base key.
///
/// Only path segments are processed; `.` segments are dropped and `..`
/// segments pop the stack. Surplus `..` segments are retained so the result
/// simply fails the source-root prefix check instead of aliasing into it.
#[must_use]
pub(crate) fn resolve_relative(base_key: &str, href: &str) -> String {
    let base = trim_key(base_key);
    let dir = base.rsplit_once('/').map_or("", |(dir, _)| dir);
    let joined = if dir.is_empty() {
        href.to_string()
    } else {
        format!("{dir}/{href}")
    };
    normalize_path(&joined)
}

/// Collapses `.` and `..` segments of a slash-separated path.
#[must_use]
pub(crate) fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if matches!(segments.last(), Some(&"..")) || segments.is_empty() {
                    segments.push("..");
                } else {
                    segments.pop();
                }
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Returns true when an href is an absolute URL rather than a bucket path.
///
/// Relative references fail to parse without a base, so a successful parse
/// means the href carries its own scheme.
#[must_use]
pub(crate) fn has_scheme(href: &str) -> bool {
    Url::parse(href).is_ok()
}
