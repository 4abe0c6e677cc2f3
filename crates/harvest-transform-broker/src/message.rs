// crates/harvest-transform-broker/src/message.rs
// ============================================================================
// Module: Harvest Messages
// Description: Batch message model with strict fail-closed validation.
// Purpose: Describe one harvest batch and its transformed counterpart.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A harvest message names a batch: the bucket holding the harvested
//! documents, the source and target roots, and the added, updated and
//! deleted keys. Validation is fail-closed with hard caps on key counts and
//! key lengths, since messages arrive from an external queue and are
//! untrusted. The transformed message mirrors the input with every key list
//! remapped under the new root.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum number of keys across all three key lists.
pub const MAX_BATCH_KEYS: usize = 10_000;

/// Maximum length of a single key, in bytes.
pub const MAX_KEY_BYTES: usize = 1_024;

// ============================================================================
// SECTION: Message Errors
// ============================================================================

/// Harvest message validation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum MessageError {
    /// A required field is empty or missing.
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    /// The combined key lists exceed the batch cap.
    #[error("batch carries {count} keys (limit {MAX_BATCH_KEYS})")]
    TooManyKeys {
        /// Total key count across all lists.
        count: usize,
    },
    /// A key exceeds the per-key length cap.
    #[error("key exceeds {MAX_KEY_BYTES} bytes: {key}")]
    KeyTooLong {
        /// Offending key, truncated for reporting.
        key: String,
    },
    /// A key list contains an empty key.
    #[error("empty key in {0} list")]
    EmptyKey(&'static str),
}

// ============================================================================
// SECTION: Harvest Message
// ============================================================================

/// One harvest batch as received from the upstream harvester.
///
/// # Invariants
/// - `bucket_name`, `source` and `target` are required and non-empty.
/// - Key lists are bounded by [`MAX_BATCH_KEYS`] and [`MAX_KEY_BYTES`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HarvestMessage {
    /// Harvest pipeline identifier.
    #[serde(default)]
    pub id: Option<String>,
    /// Bucket holding the harvested documents.
    pub bucket_name: String,
    /// Source root prefix the batch was harvested under.
    pub source: String,
    /// Target path the transformed batch is published under.
    pub target: String,
    /// Workspace the batch belongs to, when declared.
    #[serde(default)]
    pub workspace: Option<String>,
    /// Keys newly added by this harvest.
    #[serde(default)]
    pub added_keys: Vec<String>,
    /// Keys whose content changed in this harvest.
    #[serde(default)]
    pub updated_keys: Vec<String>,
    /// Keys removed by this harvest.
    #[serde(default)]
    pub deleted_keys: Vec<String>,
}

impl HarvestMessage {
    /// Validates the message against the batch contract.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError`] naming the first violation found.
    pub fn validate(&self) -> Result<(), MessageError> {
        if self.bucket_name.trim().is_empty() {
            return Err(MessageError::MissingField("bucket_name"));
        }
        if self.source.trim().is_empty() {
            return Err(MessageError::MissingField("source"));
        }
        if self.target.trim().is_empty() {
            return Err(MessageError::MissingField("target"));
        }
        let count = self.added_keys.len() + self.updated_keys.len() + self.deleted_keys.len();
        if count > MAX_BATCH_KEYS {
            return Err(MessageError::TooManyKeys {
                count,
            });
        }
        for (label, keys) in [
            ("added_keys", &self.added_keys),
            ("updated_keys", &self.updated_keys),
            ("deleted_keys", &self.deleted_keys),
        ] {
            for key in keys {
                if key.trim().is_empty() {
                    return Err(MessageError::EmptyKey(label));
                }
                if key.len() > MAX_KEY_BYTES {
                    return Err(MessageError::KeyTooLong {
                        key: truncate(key),
                    });
                }
            }
        }
        Ok(())
    }

    /// Returns every key named by the batch, across all three lists.
    pub fn all_keys(&self) -> impl Iterator<Item = &str> {
        self.added_keys
            .iter()
            .chain(&self.updated_keys)
            .chain(&self.deleted_keys)
            .map(String::as_str)
    }
}

/// Truncates an oversized key for error reporting, on a char boundary.
fn truncate(key: &str) -> String {
    key.chars().take(128).collect()
}

// ============================================================================
// SECTION: Transformed Message
// ============================================================================

/// The batch message republished after transformation.
///
/// # Invariants
/// - Key lists carry remapped keys; keys that failed transformation are
///   absent here and reported on the batch report instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransformedMessage {
    /// Harvest pipeline identifier carried over from the input.
    #[serde(default)]
    pub id: Option<String>,
    /// Bucket the transformed documents were written to.
    pub bucket_name: String,
    /// Source root prefix of the originating batch.
    pub source: String,
    /// Target path the transformed batch was published under.
    pub target: String,
    /// Workspace carried over from the input.
    #[serde(default)]
    pub workspace: Option<String>,
    /// Remapped keys of successfully transformed added documents.
    pub added_keys: Vec<String>,
    /// Remapped keys of successfully transformed updated documents.
    pub updated_keys: Vec<String>,
    /// Remapped keys of deleted documents.
    pub deleted_keys: Vec<String>,
}
