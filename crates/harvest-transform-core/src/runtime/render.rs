// crates/harvest-transform-core/src/runtime/render.rs
// ============================================================================
// Module: Render Extension Applier
// Description: Injects render-extension metadata into known collections.
// Purpose: Advertise visualisation defaults for curated collection ids.
// Dependencies: crate::core, serde, serde_json
// ============================================================================

//! ## Overview
//! Some collections have curated visualisation defaults (band combinations,
//! rescale ranges, colormaps). When a transformed collection's id matches a
//! configured profile, the render extension schema URI is appended to its
//! `stac_extensions` and the profile body lands under `renders`.
//! Invariants:
//! - The extension URI is appended at most once.
//! - An existing `renders` member is authoritative and never overwritten.
//! - Unmatched collections pass through untouched.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Schema URI identifying the STAC render extension.
pub const RENDER_EXTENSION_URI: &str =
    "https://stac-extensions.github.io/render/v1.0.0/schema.json";

// ============================================================================
// SECTION: Render Profiles
// ============================================================================

/// Curated render profiles keyed by collection id.
///
/// # Invariants
/// - Profile bodies are opaque JSON; the applier never interprets them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct RenderProfiles {
    /// Profile body per collection id.
    profiles: BTreeMap<String, Value>,
}

impl RenderProfiles {
    /// Builds an empty profile set; no collection gets render metadata.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a profile set from explicit entries.
    #[must_use]
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        Self {
            profiles: entries.into_iter().collect(),
        }
    }

    /// Returns whether no profiles are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Applies the matching profile to a collection document, if any.
    pub(crate) fn apply(&self, value: &mut Value) {
        let Some(profile) = value
            .get("id")
            .and_then(Value::as_str)
            .and_then(|id| self.profiles.get(id))
            .cloned()
        else {
            return;
        };
        let Some(map) = value.as_object_mut() else {
            return;
        };
        let extensions = map
            .entry("stac_extensions")
            .or_insert_with(|| Value::Array(Vec::new()));
        if !extensions.is_array() {
            *extensions = Value::Array(Vec::new());
        }
        if let Some(items) = extensions.as_array_mut()
            && !items.iter().any(|uri| uri == &json!(RENDER_EXTENSION_URI))
        {
            items.push(Value::String(RENDER_EXTENSION_URI.to_string()));
        }
        map.entry("renders").or_insert(profile);
    }
}
