// crates/harvest-transform-core/src/runtime/mod.rs
// ============================================================================
// Module: Runtime
// Description: Pipeline stages and the orchestrating transform engine.
// Purpose: Group per-document rewriting stages behind one engine type.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! The runtime owns the per-document pipeline: link-graph rewriting, workflow
//! synthesis and render injection as internal stages, orchestrated by the
//! public [`TransformEngine`].

/// Orchestrating engine.
pub mod engine;
/// Link and asset href rewriting.
pub mod links;
/// Render-extension injection.
pub mod render;
/// Workflow collection completion.
pub mod workflow;

pub use engine::TransformEngine;
pub use render::RENDER_EXTENSION_URI;
pub use render::RenderProfiles;
