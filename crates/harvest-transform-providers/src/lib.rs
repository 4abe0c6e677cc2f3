// crates/harvest-transform-providers/src/lib.rs
// ============================================================================
// Module: Harvest Transform Providers
// Description: Built-in capability providers for the transform engine.
// Purpose: Supply fetch, license, and patch capabilities aligned with core.
// Dependencies: harvest-transform-core, cap-std, reqwest, serde
// ============================================================================

//! ## Overview
//! This crate ships the built-in implementations of the core capability
//! traits: a bounded HTTP asset fetcher, a static license index loaded from
//! disk, and patch stores backed by memory or a patch directory. Providers
//! enforce strict validation and size limits for untrusted inputs.
//! Invariants:
//! - Providers fail closed on invalid inputs; the engine turns their errors
//!   into per-document warnings.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod http;
pub mod license;
pub mod patch;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use http::HttpFetcher;
pub use http::HttpFetcherConfig;
pub use license::StaticLicenseIndex;
pub use patch::DirPatchStore;
pub use patch::MemoryPatchStore;
