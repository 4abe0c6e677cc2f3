// crates/harvest-transform-config/src/lib.rs
// ============================================================================
// Module: Harvest Transform Config
// Description: Canonical configuration model, loading, and template.
// Purpose: One strict config surface shared by the CLI and the runner.
// Dependencies: cap-std, harvest-transform-providers, serde, toml
// ============================================================================

//! ## Overview
//! Everything the pipeline reads from `harvest-transform.toml` lives here:
//! the typed model, the fail-closed loader, and the generated template.
//! Invariants:
//! - A config that loads is fully validated; callers never re-check bounds.
//! - Unknown fields anywhere in the file are rejected.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod load;
pub mod model;
pub mod template;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use load::MAX_CONFIG_BYTES;
pub use model::ConfigError;
pub use model::DEFAULT_WORKERS;
pub use model::HarvestTransformConfig;
pub use model::LicenseSection;
pub use model::MAX_WORKERS;
pub use model::PatchSection;
pub use model::RenderSection;
pub use model::RunnerSection;
pub use model::TransformSection;
pub use template::config_toml_example;
