// crates/harvest-transform-providers/src/patch.rs
// ============================================================================
// Module: Patch Store Providers
// Description: Patch stores backed by memory and by a patch directory.
// Purpose: Supply per-document correction patches to the engine.
// Dependencies: cap-std, harvest-transform-core, serde_json
// ============================================================================

//! ## Overview
//! Patches are keyed by document identifier. The directory store reads
//! `<document_id>.json` files from a capability-scoped directory, so a
//! hostile identifier cannot escape the patch root. The memory store backs
//! tests and programmatic configuration.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;

use cap_std::ambient_authority;
use cap_std::fs::Dir;
use harvest_transform_core::PatchOperation;
use harvest_transform_core::PatchStore;
use harvest_transform_core::PatchStoreError;

// ============================================================================
// SECTION: Memory Store
// ============================================================================

/// Patch store holding operations in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryPatchStore {
    /// Operations per document identifier.
    patches: BTreeMap<String, Vec<PatchOperation>>,
}

impl MemoryPatchStore {
    /// Builds a store from explicit entries.
    #[must_use]
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<PatchOperation>)>,
    {
        Self {
            patches: entries.into_iter().collect(),
        }
    }
}

impl PatchStore for MemoryPatchStore {
    fn fetch(&self, document_id: &str) -> Result<Option<Vec<PatchOperation>>, PatchStoreError> {
        Ok(self.patches.get(document_id).cloned())
    }
}

// ============================================================================
// SECTION: Directory Store
// ============================================================================

/// Patch store reading `<document_id>.json` files from a directory.
///
/// # Invariants
/// - Reads are confined to the opened directory.
/// - Identifiers containing path separators or traversal tokens are refused.
#[derive(Debug)]
pub struct DirPatchStore {
    /// Capability-scoped patch directory.
    dir: Dir,
}

impl DirPatchStore {
    /// Opens a patch store over the given directory.
    ///
    /// # Errors
    ///
    /// Returns [`PatchStoreError`] when the directory cannot be opened.
    pub fn open(path: &Path) -> Result<Self, PatchStoreError> {
        let dir = Dir::open_ambient_dir(path, ambient_authority())
            .map_err(|err| PatchStoreError::Store(err.to_string()))?;
        Ok(Self {
            dir,
        })
    }
}

impl PatchStore for DirPatchStore {
    fn fetch(&self, document_id: &str) -> Result<Option<Vec<PatchOperation>>, PatchStoreError> {
        if !is_safe_identifier(document_id) {
            return Err(PatchStoreError::Store(format!(
                "unsafe document identifier: {document_id}"
            )));
        }
        let file_name = format!("{document_id}.json");
        let raw = match self.dir.read_to_string(&file_name) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(PatchStoreError::Store(err.to_string())),
        };
        let operations: Vec<PatchOperation> = serde_json::from_str(&raw)
            .map_err(|err| PatchStoreError::Decode(err.to_string()))?;
        Ok(Some(operations))
    }
}

/// Returns true when an identifier is safe to use as a file stem.
fn is_safe_identifier(document_id: &str) -> bool {
    !document_id.is_empty()
        && !document_id.contains(['/', '\\'])
        && !document_id.contains("..")
        && !document_id.starts_with('.')
}
