// crates/harvest-transform-core/src/core/patch.rs
// ============================================================================
// Module: JSON Patch Engine
// Description: RFC 6902 operations applied transactionally to document trees.
// Purpose: Merge externally authored corrections without partial application.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Patches are ordered sequences of RFC 6902 operations keyed by the target
//! document's identifier. Application is all-or-nothing: operations run
//! against a working copy and the copy is returned only when every operation
//! succeeds, so a failing `test` (or any other failure) leaves the caller's
//! document untouched.
//! Invariants:
//! - A document is never partially patched.
//! - Pointer evaluation is strict: missing paths and malformed indices fail
//!   the whole patch.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Patch Operations
// ============================================================================

/// One RFC 6902 patch operation.
///
/// # Invariants
/// - `path` and `from` are JSON Pointers (RFC 6901).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase", deny_unknown_fields)]
pub enum PatchOperation {
    /// Adds (or replaces) a value at the target location.
    Add {
        /// Target location pointer.
        path: String,
        /// Value to insert.
        value: Value,
    },
    /// Removes the value at the target location.
    Remove {
        /// Target location pointer.
        path: String,
    },
    /// Replaces an existing value at the target location.
    Replace {
        /// Target location pointer.
        path: String,
        /// Replacement value.
        value: Value,
    },
    /// Moves the value at `from` to the target location.
    Move {
        /// Source location pointer.
        from: String,
        /// Target location pointer.
        path: String,
    },
    /// Copies the value at `from` to the target location.
    Copy {
        /// Source location pointer.
        from: String,
        /// Target location pointer.
        path: String,
    },
    /// Asserts that the value at the target location equals `value`.
    Test {
        /// Target location pointer.
        path: String,
        /// Expected value.
        value: Value,
    },
}

// ============================================================================
// SECTION: Patch Errors
// ============================================================================

/// Errors voiding a patch application.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum PatchError {
    /// Pointer does not follow RFC 6901 syntax.
    #[error("invalid json pointer: {0}")]
    InvalidPointer(String),
    /// Pointer referenced a location that does not exist.
    #[error("path not found: {0}")]
    PathNotFound(String),
    /// Array index token is malformed or out of bounds.
    #[error("invalid array index {token} at {path}")]
    InvalidIndex {
        /// Offending index token.
        token: String,
        /// Pointer the token appeared in.
        path: String,
    },
    /// A `test` operation did not hold.
    #[error("test failed at {0}")]
    TestFailed(String),
    /// A `move` operation targeted a location inside its own source.
    #[error("cannot move {from} into itself at {path}")]
    MoveIntoSelf {
        /// Source pointer.
        from: String,
        /// Target pointer.
        path: String,
    },
}

// ============================================================================
// SECTION: Patch Application
// ============================================================================

/// Applies a patch transactionally, returning the patched document.
///
/// The input document is never modified; on failure the caller simply keeps
/// using it.
///
/// # Errors
///
/// Returns [`PatchError`] when any single operation fails.
pub fn apply_patch(document: &Value, operations: &[PatchOperation]) -> Result<Value, PatchError> {
    let mut working = document.clone();
    for operation in operations {
        apply_operation(&mut working, operation)?;
    }
    Ok(working)
}

/// Applies one operation to the working copy.
fn apply_operation(document: &mut Value, operation: &PatchOperation) -> Result<(), PatchError> {
    match operation {
        PatchOperation::Add {
            path,
            value,
        } => add(document, path, value.clone()),
        PatchOperation::Remove {
            path,
        } => remove(document, path).map(|_| ()),
        PatchOperation::Replace {
            path,
            value,
        } => replace(document, path, value.clone()),
        PatchOperation::Move {
            from,
            path,
        } => {
            if path != from && pointer_is_prefix(from, path) {
                return Err(PatchError::MoveIntoSelf {
                    from: from.clone(),
                    path: path.clone(),
                });
            }
            let moved = remove(document, from)?;
            add(document, path, moved)
        }
        PatchOperation::Copy {
            from,
            path,
        } => {
            let copied = lookup(document, from)?.clone();
            add(document, path, copied)
        }
        PatchOperation::Test {
            path,
            value,
        } => {
            if lookup(document, path)? == value {
                Ok(())
            } else {
                Err(PatchError::TestFailed(path.clone()))
            }
        }
    }
}

// ============================================================================
// SECTION: Pointer Evaluation
// ============================================================================

/// Splits an RFC 6901 pointer into unescaped reference tokens.
fn parse_pointer(pointer: &str) -> Result<Vec<String>, PatchError> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    let rest = pointer
        .strip_prefix('/')
        .ok_or_else(|| PatchError::InvalidPointer(pointer.to_string()))?;
    rest.split('/').map(|token| unescape_token(pointer, token)).collect()
}

/// Unescapes `~1` and `~0` sequences in one reference token.
fn unescape_token(pointer: &str, token: &str) -> Result<String, PatchError> {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(ch) = chars.next() {
        if ch != '~' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('~'),
            Some('1') => out.push('/'),
            _ => return Err(PatchError::InvalidPointer(pointer.to_string())),
        }
    }
    Ok(out)
}

/// Parses an array index token, rejecting signs and leading zeros.
fn parse_index(token: &str, pointer: &str) -> Result<usize, PatchError> {
    let malformed = token.is_empty()
        || (token.len() > 1 && token.starts_with('0'))
        || !token.bytes().all(|byte| byte.is_ascii_digit());
    if malformed {
        return Err(PatchError::InvalidIndex {
            token: token.to_string(),
            path: pointer.to_string(),
        });
    }
    token.parse::<usize>().map_err(|_| PatchError::InvalidIndex {
        token: token.to_string(),
        path: pointer.to_string(),
    })
}

/// Resolves a pointer to a shared reference.
fn lookup<'doc>(document: &'doc Value, pointer: &str) -> Result<&'doc Value, PatchError> {
    let tokens = parse_pointer(pointer)?;
    let mut current = document;
    for token in &tokens {
        current = match current {
            Value::Object(map) => {
                map.get(token).ok_or_else(|| PatchError::PathNotFound(pointer.to_string()))?
            }
            Value::Array(items) => {
                let index = parse_index(token, pointer)?;
                items.get(index).ok_or_else(|| PatchError::PathNotFound(pointer.to_string()))?
            }
            _ => return Err(PatchError::PathNotFound(pointer.to_string())),
        };
    }
    Ok(current)
}

/// Resolves the parent container of a pointer, returning the final token.
fn lookup_parent_mut<'doc>(
    document: &'doc mut Value,
    pointer: &str,
) -> Result<(&'doc mut Value, String), PatchError> {
    let mut tokens = parse_pointer(pointer)?;
    let Some(last) = tokens.pop() else {
        return Err(PatchError::InvalidPointer(pointer.to_string()));
    };
    let mut current = document;
    for token in &tokens {
        current = match current {
            Value::Object(map) => {
                map.get_mut(token).ok_or_else(|| PatchError::PathNotFound(pointer.to_string()))?
            }
            Value::Array(items) => {
                let index = parse_index(token, pointer)?;
                items.get_mut(index).ok_or_else(|| PatchError::PathNotFound(pointer.to_string()))?
            }
            _ => return Err(PatchError::PathNotFound(pointer.to_string())),
        };
    }
    Ok((current, last))
}

/// Returns true when `prefix` is a proper pointer prefix of `pointer`.
fn pointer_is_prefix(prefix: &str, pointer: &str) -> bool {
    pointer.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/'))
}

// ============================================================================
// SECTION: Mutating Operations
// ============================================================================

/// RFC 6902 `add`: inserts into objects, splices into arrays.
fn add(document: &mut Value, pointer: &str, value: Value) -> Result<(), PatchError> {
    if pointer.is_empty() {
        *document = value;
        return Ok(());
    }
    let (parent, token) = lookup_parent_mut(document, pointer)?;
    match parent {
        Value::Object(map) => {
            map.insert(token, value);
            Ok(())
        }
        Value::Array(items) => {
            if token == "-" {
                items.push(value);
                return Ok(());
            }
            let index = parse_index(&token, pointer)?;
            if index > items.len() {
                return Err(PatchError::InvalidIndex {
                    token,
                    path: pointer.to_string(),
                });
            }
            items.insert(index, value);
            Ok(())
        }
        _ => Err(PatchError::PathNotFound(pointer.to_string())),
    }
}

/// RFC 6902 `remove`: returns the removed value for `move` support.
fn remove(document: &mut Value, pointer: &str) -> Result<Value, PatchError> {
    if pointer.is_empty() {
        return Ok(std::mem::replace(document, Value::Null));
    }
    let (parent, token) = lookup_parent_mut(document, pointer)?;
    match parent {
        Value::Object(map) => {
            map.remove(&token).ok_or_else(|| PatchError::PathNotFound(pointer.to_string()))
        }
        Value::Array(items) => {
            let index = parse_index(&token, pointer)?;
            if index >= items.len() {
                return Err(PatchError::PathNotFound(pointer.to_string()));
            }
            Ok(items.remove(index))
        }
        _ => Err(PatchError::PathNotFound(pointer.to_string())),
    }
}

/// RFC 6902 `replace`: the target location must already exist.
fn replace(document: &mut Value, pointer: &str, value: Value) -> Result<(), PatchError> {
    if pointer.is_empty() {
        *document = value;
        return Ok(());
    }
    let (parent, token) = lookup_parent_mut(document, pointer)?;
    match parent {
        Value::Object(map) => {
            let slot =
                map.get_mut(&token).ok_or_else(|| PatchError::PathNotFound(pointer.to_string()))?;
            *slot = value;
            Ok(())
        }
        Value::Array(items) => {
            let index = parse_index(&token, pointer)?;
            let slot = items
                .get_mut(index)
                .ok_or_else(|| PatchError::PathNotFound(pointer.to_string()))?;
            *slot = value;
            Ok(())
        }
        _ => Err(PatchError::PathNotFound(pointer.to_string())),
    }
}
