// crates/harvest-transform-broker/src/store.rs
// ============================================================================
// Module: Object Stores
// Description: Object store trait with memory and directory backends.
// Purpose: Read harvested documents and publish transformed ones.
// Dependencies: cap-std, thiserror
// ============================================================================

//! ## Overview
//! The runner reads and writes documents through the [`ObjectStore`] trait.
//! The directory store confines all access to a capability-scoped directory
//! and maps bucket keys onto relative paths; the memory store backs tests
//! and dry runs.
//! Invariants:
//! - Keys with traversal tokens or absolute paths are refused.
//! - Deleting an absent key is not an error; deletes are idempotent.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::PoisonError;
use std::sync::RwLock;

use cap_std::ambient_authority;
use cap_std::fs::Dir;
use thiserror::Error;

// ============================================================================
// SECTION: Store Errors
// ============================================================================

/// Object store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No object exists at the key.
    #[error("object not found: {0}")]
    NotFound(String),
    /// Key is not a valid bucket-relative path.
    #[error("invalid object key: {0}")]
    InvalidKey(String),
    /// Backend I/O failure.
    #[error("object store i/o failure: {0}")]
    Io(String),
}

// ============================================================================
// SECTION: Object Store Trait
// ============================================================================

/// Read/write access to a bucket of harvested documents.
pub trait ObjectStore {
    /// Reads the object at a key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no object exists at the key.
    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Writes an object at a key, replacing any existing object.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the object cannot be written.
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError>;

    /// Deletes the object at a key; absent keys succeed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the delete cannot be performed.
    fn delete(&self, key: &str) -> Result<(), StoreError>;
}

// ============================================================================
// SECTION: Memory Store
// ============================================================================

/// Object store holding objects in memory.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    /// Object bytes per key.
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryObjectStore {
    /// Builds a store preloaded with the given objects.
    #[must_use]
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<u8>)>,
    {
        Self {
            objects: RwLock::new(entries.into_iter().collect()),
        }
    }

    /// Returns the keys currently held, in sorted order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

impl ObjectStore for MemoryObjectStore {
    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.objects.write().unwrap_or_else(PoisonError::into_inner).remove(key);
        Ok(())
    }
}

// ============================================================================
// SECTION: Directory Store
// ============================================================================

/// Object store mapping keys onto files under one directory.
///
/// # Invariants
/// - All access is confined to the opened directory.
#[derive(Debug)]
pub struct DirObjectStore {
    /// Capability-scoped bucket directory.
    dir: Dir,
}

impl DirObjectStore {
    /// Opens a store over the given directory.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the directory cannot be opened.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let dir = Dir::open_ambient_dir(path, ambient_authority())
            .map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(Self {
            dir,
        })
    }
}

impl ObjectStore for DirObjectStore {
    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let key = checked_key(key)?;
        match self.dir.read(key) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(StoreError::NotFound(key.to_string()))
            }
            Err(err) => Err(StoreError::Io(err.to_string())),
        }
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let key = checked_key(key)?;
        if let Some((parent, _file)) = key.rsplit_once('/') {
            self.dir.create_dir_all(parent).map_err(|err| StoreError::Io(err.to_string()))?;
        }
        self.dir.write(key, bytes).map_err(|err| StoreError::Io(err.to_string()))
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let key = checked_key(key)?;
        match self.dir.remove_file(key) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StoreError::Io(err.to_string())),
        }
    }
}

/// Validates a bucket key as a confined relative path.
fn checked_key(key: &str) -> Result<&str, StoreError> {
    let trimmed = key.trim_matches('/');
    if trimmed.is_empty()
        || key.starts_with('/')
        || trimmed.split('/').any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(trimmed)
}
