// crates/harvest-transform-providers/src/license.rs
// ============================================================================
// Module: License Index Provider
// Description: Static SPDX-to-license-file index loaded from disk.
// Purpose: Route rel=license links at canonical hosted license files.
// Dependencies: cap-std, harvest-transform-core, serde, serde_json
// ============================================================================

//! ## Overview
//! The static index maps SPDX identifiers to canonical license-file links,
//! loaded once from a JSON file and consulted read-only afterwards.
//! Identifiers are compared case-insensitively, since harvested documents
//! disagree on SPDX casing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;

use cap_std::ambient_authority;
use cap_std::fs::Dir;
use harvest_transform_core::LicenseIndex;
use harvest_transform_core::LicenseIndexError;
use harvest_transform_core::LicenseLink;
use serde::Deserialize;

// ============================================================================
// SECTION: Index File Model
// ============================================================================

/// One entry in a license index file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct LicenseEntry {
    /// Absolute href of the canonical license file.
    href: String,
    /// Media type of the license file, when known.
    #[serde(rename = "type")]
    media_type: Option<String>,
}

// ============================================================================
// SECTION: Static Index
// ============================================================================

/// In-memory license index keyed by lowercased SPDX identifier.
///
/// # Invariants
/// - Lookups never fail once the index is constructed.
#[derive(Debug, Clone, Default)]
pub struct StaticLicenseIndex {
    /// Canonical link per lowercased SPDX identifier.
    entries: BTreeMap<String, LicenseLink>,
}

impl StaticLicenseIndex {
    /// Builds an index from explicit entries.
    #[must_use]
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, LicenseLink)>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(spdx_id, link)| (spdx_id.to_ascii_lowercase(), link))
                .collect(),
        }
    }

    /// Loads an index from a JSON file mapping SPDX ids to license links.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseIndexError`] when the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, LicenseIndexError> {
        let parent = path.parent().filter(|parent| !parent.as_os_str().is_empty());
        let dir = Dir::open_ambient_dir(parent.unwrap_or_else(|| Path::new(".")), ambient_authority())
            .map_err(|err| LicenseIndexError::Index(err.to_string()))?;
        let file_name = path
            .file_name()
            .ok_or_else(|| LicenseIndexError::Index(format!("not a file: {}", path.display())))?;
        let raw = dir
            .read_to_string(file_name)
            .map_err(|err| LicenseIndexError::Index(err.to_string()))?;
        let entries: BTreeMap<String, LicenseEntry> = serde_json::from_str(&raw)
            .map_err(|err| LicenseIndexError::Index(err.to_string()))?;
        Ok(Self::from_entries(entries.into_iter().map(|(spdx_id, entry)| {
            (
                spdx_id,
                LicenseLink {
                    href: entry.href,
                    media_type: entry.media_type,
                },
            )
        })))
    }

    /// Returns the number of indexed identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the index holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl LicenseIndex for StaticLicenseIndex {
    fn resolve(&self, spdx_id: &str) -> Result<Option<LicenseLink>, LicenseIndexError> {
        Ok(self.entries.get(&spdx_id.to_ascii_lowercase()).cloned())
    }
}
