// crates/harvest-transform-config/src/load.rs
// ============================================================================
// Module: Config Loading
// Description: Strict, fail-closed loading of harvest-transform.toml.
// Purpose: Guard path, size, and encoding before the model ever parses.
// Dependencies: cap-std, toml
// ============================================================================

//! ## Overview
//! Loading is deliberately strict: the path is bounded, the file is read
//! through a capability scoped to its parent directory, the size is checked
//! before parsing, and the bytes must be UTF-8. Only then does the TOML
//! model decode, and the decoded config is validated before it is returned.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;

use cap_std::ambient_authority;
use cap_std::fs::Dir;

use crate::model::ConfigError;
use crate::model::HarvestTransformConfig;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum config file size, in bytes.
pub const MAX_CONFIG_BYTES: u64 = 1_048_576;

/// Maximum config path length, in bytes.
const MAX_PATH_BYTES: usize = 4_096;

/// Maximum length of a single path component, in bytes.
const MAX_COMPONENT_BYTES: usize = 255;

// ============================================================================
// SECTION: Loading
// ============================================================================

impl HarvestTransformConfig {
    /// Loads and validates a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the path is out of bounds, the file
    /// cannot be read, exceeds [`MAX_CONFIG_BYTES`], is not UTF-8, fails to
    /// parse, or fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        check_path(path)?;
        let bytes = read_config_bytes(path)?;
        let text = String::from_utf8(bytes).map_err(|_| ConfigError::Read {
            path: path.display().to_string(),
            detail: "config file must be utf-8".to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    /// Parses and validates a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the text fails to parse or the decoded
    /// config fails validation.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

// ============================================================================
// SECTION: Guards
// ============================================================================

/// Bounds the config path before any filesystem access.
fn check_path(path: &Path) -> Result<(), ConfigError> {
    let display = path.display().to_string();
    if display.len() > MAX_PATH_BYTES {
        return Err(ConfigError::Read {
            path: truncate(&display),
            detail: "config path exceeds max length".to_string(),
        });
    }
    let over_long = path
        .components()
        .any(|component| component.as_os_str().len() > MAX_COMPONENT_BYTES);
    if over_long {
        return Err(ConfigError::Read {
            path: truncate(&display),
            detail: "config path component too long".to_string(),
        });
    }
    Ok(())
}

/// Reads the config through a capability scoped to its parent directory.
fn read_config_bytes(path: &Path) -> Result<Vec<u8>, ConfigError> {
    let read_err = |detail: String| ConfigError::Read {
        path: path.display().to_string(),
        detail,
    };
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let name = path
        .file_name()
        .ok_or_else(|| read_err("config path has no file name".to_string()))?;
    let dir = Dir::open_ambient_dir(parent, ambient_authority())
        .map_err(|err| read_err(err.to_string()))?;
    let size = dir.metadata(name).map_err(|err| read_err(err.to_string()))?.len();
    if size > MAX_CONFIG_BYTES {
        return Err(read_err("config file exceeds size limit".to_string()));
    }
    dir.read(name).map_err(|err| read_err(err.to_string()))
}

/// Truncates a path for error reporting.
fn truncate(display: &str) -> String {
    display.chars().take(128).collect()
}
