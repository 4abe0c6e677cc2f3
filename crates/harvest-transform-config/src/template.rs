// crates/harvest-transform-config/src/template.rs
// ============================================================================
// Module: Config Template
// Description: Annotated starter harvest-transform.toml.
// Purpose: Keep the shipped template in lockstep with the model.
// Dependencies: none
// ============================================================================

//! ## Overview
//! A single generated template guarantees the example shipped to operators
//! parses and validates against the current model. The template test decodes
//! this text through the real loader.

/// Returns an annotated starter `harvest-transform.toml`.
#[must_use]
pub fn config_toml_example() -> String {
    r#"# harvest-transform.toml
# Settings for the harvest document transformation pipeline.

[transform]
# Absolute URL the published catalogue is rooted at. Required.
output_root = "https://catalogue.example.org"
# Workspace override applied to every batch root. Optional.
# workspace = "my-workspace"

[runner]
# Worker pool size, 1..=64.
workers = 4

[fetch]
# Allow cleartext http for build-script assets. Off by default.
allow_http = false
# Request timeout in milliseconds.
timeout_ms = 10000
# Maximum build-script asset size, in bytes.
max_asset_bytes = 4194304
# Outbound user agent.
user_agent = "harvest-transform/0.1"
# Restrict fetches to these hosts. Unset allows any host.
# allowed_hosts = ["raw.githubusercontent.com"]

[license]
# JSON file mapping SPDX identifiers to canonical license locations.
# index_path = "licenses.json"

[patch]
# Directory of <document-id>.json patch files.
# dir = "patches"

# Render profiles injected into matching collections.
[[render]]
collection = "sentinel-2-l2a"

[render.profile.overview]
title = "True color"
assets = ["visual"]
"#
    .to_string()
}
