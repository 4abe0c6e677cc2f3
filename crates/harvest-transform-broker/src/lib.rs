// crates/harvest-transform-broker/src/lib.rs
// ============================================================================
// Module: Harvest Transform Broker
// Description: Batch orchestration over the document transform engine.
// Purpose: Consume harvest messages, fan keys across workers, republish.
// Dependencies: harvest-transform-core, serde, thiserror, tracing
// ============================================================================

//! ## Overview
//! The broker crate turns one harvest message into published documents and a
//! batch report. [`HarvestMessage`] is the validated inbound contract,
//! [`ObjectStore`] abstracts the bucket, and [`BatchRunner`] drives the
//! engine across a bounded worker pool.
//! Invariants:
//! - A failing key never aborts its batch.
//! - The republished [`TransformedMessage`] lists only keys that succeeded.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod message;
pub mod runner;
pub mod store;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use message::HarvestMessage;
pub use message::MessageError;
pub use message::TransformedMessage;
pub use runner::BatchError;
pub use runner::BatchReport;
pub use runner::BatchRunner;
pub use runner::KeyAction;
pub use runner::KeyReport;
pub use store::DirObjectStore;
pub use store::MemoryObjectStore;
pub use store::ObjectStore;
pub use store::StoreError;
