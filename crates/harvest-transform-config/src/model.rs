// crates/harvest-transform-config/src/model.rs
// ============================================================================
// Module: Configuration Model
// Description: Typed model of harvest-transform.toml with validation.
// Purpose: Fail closed on any setting the pipeline cannot honor.
// Dependencies: harvest-transform-providers, serde, serde_json, thiserror, url
// ============================================================================

//! ## Overview
//! The configuration model mirrors `harvest-transform.toml` section by
//! section. Decoding is strict (`deny_unknown_fields` everywhere) and
//! [`HarvestTransformConfig::validate`] rejects any value the pipeline
//! cannot honor, naming the offending field.
//! Invariants:
//! - A config that loads and validates is safe to run without further
//!   checks.
//! - Validation errors always name the offending field.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::path::PathBuf;

use harvest_transform_providers::HttpFetcherConfig;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum worker pool size accepted by `[runner] workers`.
pub const MAX_WORKERS: usize = 64;

/// Default worker pool size.
pub const DEFAULT_WORKERS: usize = 4;

/// Upper bound on `[fetch] timeout_ms`.
const MAX_FETCH_TIMEOUT_MS: u64 = 300_000;

/// Upper bound on `[fetch] max_asset_bytes`.
const MAX_FETCH_ASSET_BYTES: usize = 64 * 1024 * 1024;

// ============================================================================
// SECTION: Config Errors
// ============================================================================

/// Configuration loading and validation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - `Invalid` messages name the offending field.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {detail}")]
    Read {
        /// Path that was being read.
        path: String,
        /// Failure detail.
        detail: String,
    },
    /// The config file is not valid TOML for the model.
    #[error("failed to parse config: {0}")]
    Parse(String),
    /// The config decoded but a setting is out of bounds.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Sections
// ============================================================================

/// `[transform]` section: roots and bucket identity.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformSection {
    /// Absolute http(s) URL the target path is resolved against.
    pub output_root: String,
    /// Source root override applied when a message omits one.
    pub source_root: Option<String>,
    /// Bucket the harvested documents live in.
    pub bucket: Option<String>,
    /// Workspace override applied to every batch.
    pub workspace: Option<String>,
}

/// `[runner]` section: worker pool sizing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerSection {
    /// Worker pool size, `1..=MAX_WORKERS`.
    pub workers: usize,
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
        }
    }
}

/// `[license]` section: SPDX index location.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LicenseSection {
    /// JSON file mapping SPDX identifiers to canonical hrefs.
    pub index_path: Option<PathBuf>,
}

/// `[patch]` section: patch file directory.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PatchSection {
    /// Directory of `<document-id>.json` patch files.
    pub dir: Option<PathBuf>,
}

/// One `[[render]]` entry: a render profile keyed by collection id.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderSection {
    /// Collection id the profile applies to.
    pub collection: String,
    /// Render profile injected under the collection's `renders` key.
    pub profile: Value,
}

// ============================================================================
// SECTION: Root Config
// ============================================================================

/// Typed model of `harvest-transform.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarvestTransformConfig {
    /// Roots and bucket identity.
    pub transform: TransformSection,
    /// Worker pool sizing.
    pub runner: RunnerSection,
    /// HTTP asset fetcher limits.
    pub fetch: HttpFetcherConfig,
    /// SPDX license index location.
    pub license: LicenseSection,
    /// Patch file directory.
    pub patch: PatchSection,
    /// Render profiles keyed by collection id.
    pub render: Vec<RenderSection>,
}

impl HarvestTransformConfig {
    /// Validates every section against the pipeline's bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_transform()?;
        self.validate_runner()?;
        self.validate_fetch()?;
        self.validate_stores()?;
        self.validate_render()?;
        Ok(())
    }

    /// Checks the `[transform]` section.
    fn validate_transform(&self) -> Result<(), ConfigError> {
        let output_root = self.transform.output_root.trim();
        if output_root.is_empty() {
            return Err(ConfigError::Invalid(
                "transform.output_root is required".to_string(),
            ));
        }
        let url = Url::parse(output_root).map_err(|err| {
            ConfigError::Invalid(format!("transform.output_root must be an absolute url: {err}"))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Invalid(
                "transform.output_root must use http or https".to_string(),
            ));
        }
        for (field, value) in [
            ("transform.source_root", &self.transform.source_root),
            ("transform.bucket", &self.transform.bucket),
            ("transform.workspace", &self.transform.workspace),
        ] {
            if let Some(value) = value
                && value.trim().is_empty()
            {
                return Err(ConfigError::Invalid(format!("{field} must be non-empty when set")));
            }
        }
        Ok(())
    }

    /// Checks the `[runner]` section.
    fn validate_runner(&self) -> Result<(), ConfigError> {
        if self.runner.workers == 0 || self.runner.workers > MAX_WORKERS {
            return Err(ConfigError::Invalid(format!(
                "runner.workers must be between 1 and {MAX_WORKERS}"
            )));
        }
        Ok(())
    }

    /// Checks the `[fetch]` section.
    fn validate_fetch(&self) -> Result<(), ConfigError> {
        if self.fetch.timeout_ms == 0 || self.fetch.timeout_ms > MAX_FETCH_TIMEOUT_MS {
            return Err(ConfigError::Invalid(format!(
                "fetch.timeout_ms must be between 1 and {MAX_FETCH_TIMEOUT_MS}"
            )));
        }
        if self.fetch.max_asset_bytes == 0 || self.fetch.max_asset_bytes > MAX_FETCH_ASSET_BYTES {
            return Err(ConfigError::Invalid(format!(
                "fetch.max_asset_bytes must be between 1 and {MAX_FETCH_ASSET_BYTES}"
            )));
        }
        if self.fetch.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid("fetch.user_agent must be non-empty".to_string()));
        }
        if let Some(hosts) = &self.fetch.allowed_hosts
            && hosts.iter().any(|host| host.trim().is_empty())
        {
            return Err(ConfigError::Invalid(
                "fetch.allowed_hosts must not contain empty entries".to_string(),
            ));
        }
        Ok(())
    }

    /// Checks the `[license]` and `[patch]` sections.
    fn validate_stores(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.license.index_path
            && path.as_os_str().is_empty()
        {
            return Err(ConfigError::Invalid(
                "license.index_path must be non-empty when set".to_string(),
            ));
        }
        if let Some(dir) = &self.patch.dir
            && dir.as_os_str().is_empty()
        {
            return Err(ConfigError::Invalid("patch.dir must be non-empty when set".to_string()));
        }
        Ok(())
    }

    /// Checks every `[[render]]` entry.
    fn validate_render(&self) -> Result<(), ConfigError> {
        let mut seen = BTreeSet::new();
        for entry in &self.render {
            let collection = entry.collection.trim();
            if collection.is_empty() {
                return Err(ConfigError::Invalid("render.collection must be non-empty".to_string()));
            }
            if !entry.profile.is_object() {
                return Err(ConfigError::Invalid(format!(
                    "render.profile for {collection} must be a table"
                )));
            }
            if !seen.insert(collection) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate render entry for collection {collection}"
                )));
            }
        }
        Ok(())
    }
}
