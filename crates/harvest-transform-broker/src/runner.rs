// crates/harvest-transform-broker/src/runner.rs
// ============================================================================
// Module: Batch Runner
// Description: Runs the transform engine over every key of one batch.
// Purpose: Turn a harvest message into published documents and a report.
// Dependencies: harvest-transform-core, tracing, url
// ============================================================================

//! ## Overview
//! The runner fans the keys of one harvest batch across a bounded worker
//! pool. Added and updated keys are read from the store, transformed, and
//! written at their remapped key; deleted keys are remapped and deleted
//! without content transformation. Each key completes with a definitive
//! per-key result before the batch report is assembled.
//! Invariants:
//! - A failing key never aborts the batch; it is recorded on the report and
//!   excluded from the republished message.
//! - All keys complete (success or recorded failure) before the report is
//!   returned.
//! - Workers share only read-only state; ordering within a batch is not
//!   guaranteed, and the report is sorted for stable output.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::mpsc;
use std::thread;

use harvest_transform_core::AssetFetcher;
use harvest_transform_core::LicenseIndex;
use harvest_transform_core::PatchStore;
use harvest_transform_core::TransformContext;
use harvest_transform_core::TransformEngine;
use harvest_transform_core::TransformWarning;
use harvest_transform_core::resolve_storage_key;
use thiserror::Error;
use tracing::debug;
use tracing::warn;
use url::Url;

use crate::message::HarvestMessage;
use crate::message::MessageError;
use crate::message::TransformedMessage;
use crate::store::ObjectStore;
use crate::store::StoreError;

// ============================================================================
// SECTION: Runner Errors
// ============================================================================

/// Batch-level runner errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Per-key failures are never surfaced here; they live on the report.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The harvest message failed validation.
    #[error(transparent)]
    Message(#[from] MessageError),
    /// The batch context could not be constructed.
    #[error("invalid batch context: {0}")]
    Context(String),
}

// ============================================================================
// SECTION: Per-Key Reports
// ============================================================================

/// Which key list of the batch a key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum KeyAction {
    /// Document newly added by the harvest.
    Added,
    /// Document whose content changed.
    Updated,
    /// Document removed by the harvest.
    Deleted,
}

/// Definitive result for one key of the batch.
#[derive(Debug)]
pub struct KeyReport {
    /// Key the document was harvested at.
    pub original_key: String,
    /// Remapped key, when resolution succeeded.
    pub new_key: Option<String>,
    /// Which list the key came from.
    pub action: KeyAction,
    /// Non-fatal warnings collected during transformation.
    pub warnings: Vec<TransformWarning>,
    /// Fatal per-key failure, when one occurred.
    pub error: Option<String>,
}

impl KeyReport {
    /// Returns true when the key completed without a fatal failure.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of one whole batch.
#[derive(Debug)]
pub struct BatchReport {
    /// Message to republish downstream.
    pub message: TransformedMessage,
    /// Per-key results, sorted by original key.
    pub keys: Vec<KeyReport>,
}

impl BatchReport {
    /// Returns true when every key succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.keys.iter().all(KeyReport::succeeded)
    }

    /// Returns the original keys that failed.
    #[must_use]
    pub fn failed_keys(&self) -> Vec<&str> {
        self.keys
            .iter()
            .filter(|report| !report.succeeded())
            .map(|report| report.original_key.as_str())
            .collect()
    }
}

// ============================================================================
// SECTION: Batch Runner
// ============================================================================

/// Runs the engine across one batch with a bounded worker pool.
#[derive(Debug)]
pub struct BatchRunner<L, P, F, S>
where
    L: LicenseIndex + Sync,
    P: PatchStore + Sync,
    F: AssetFetcher + Sync,
    S: ObjectStore + Sync,
{
    /// Per-document transform engine shared by all workers.
    engine: TransformEngine<L, P, F>,
    /// Bucket access for reads, writes and deletes.
    store: S,
    /// Absolute root the target path is resolved against.
    output_root: Url,
    /// Worker pool size.
    workers: usize,
}

impl<L, P, F, S> BatchRunner<L, P, F, S>
where
    L: LicenseIndex + Sync,
    P: PatchStore + Sync,
    F: AssetFetcher + Sync,
    S: ObjectStore + Sync,
{
    /// Builds a runner over an engine, a store, and an output root.
    ///
    /// `workers` is clamped to at least one.
    pub fn new(engine: TransformEngine<L, P, F>, store: S, output_root: Url, workers: usize) -> Self {
        Self {
            engine,
            store,
            output_root,
            workers: workers.max(1),
        }
    }

    /// Returns the underlying object store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs one batch to completion and assembles its report.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError`] when the message is invalid or the batch
    /// context cannot be built. Per-key failures are recorded on the report.
    pub fn run(&self, message: &HarvestMessage) -> Result<BatchReport, BatchError> {
        message.validate()?;
        let ctx = self.context_for(message)?;
        let jobs = collect_jobs(message);
        debug!(
            batch = message.id.as_deref().unwrap_or("-"),
            keys = jobs.len(),
            workers = self.workers,
            "running harvest batch"
        );
        let mut keys = self.run_jobs(&ctx, jobs);
        keys.sort_by(|a, b| a.original_key.cmp(&b.original_key));
        let message = assemble_message(message, &keys);
        Ok(BatchReport {
            message,
            keys,
        })
    }

    /// Builds the per-batch transform context from the message.
    fn context_for(&self, message: &HarvestMessage) -> Result<TransformContext, BatchError> {
        let target_root = format!(
            "{}/{}",
            self.output_root.as_str().trim_end_matches('/'),
            message.target.trim_matches('/'),
        );
        let batch_keys: BTreeSet<String> = message
            .all_keys()
            .map(|key| key.trim_matches('/').to_string())
            .collect();
        TransformContext::new(
            message.source.clone(),
            &target_root,
            message.bucket_name.clone(),
            message.workspace.clone(),
            batch_keys,
        )
        .map_err(|err| BatchError::Context(err.to_string()))
    }

    /// Fans jobs across the worker pool and collects their reports.
    fn run_jobs(&self, ctx: &TransformContext, jobs: Vec<(String, KeyAction)>) -> Vec<KeyReport> {
        let queue = Mutex::new(jobs.into_iter());
        let (sender, receiver) = mpsc::channel();
        thread::scope(|scope| {
            for _ in 0 .. self.workers {
                let sender = sender.clone();
                let queue = &queue;
                scope.spawn(move || {
                    loop {
                        let job = queue
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .next();
                        let Some((key, action)) = job else {
                            break;
                        };
                        let report = self.run_key(ctx, key, action);
                        if sender.send(report).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(sender);
            receiver.iter().collect()
        })
    }

    /// Processes one key to a definitive report.
    fn run_key(&self, ctx: &TransformContext, key: String, action: KeyAction) -> KeyReport {
        let result = match action {
            KeyAction::Added | KeyAction::Updated => self.transform_key(ctx, &key),
            KeyAction::Deleted => self.delete_key(ctx, &key),
        };
        match result {
            Ok((new_key, warnings)) => {
                for warning in &warnings {
                    warn!(key = key.as_str(), %warning, "transform warning");
                }
                KeyReport {
                    original_key: key,
                    new_key: Some(new_key),
                    action,
                    warnings,
                    error: None,
                }
            }
            Err(error) => {
                warn!(key = key.as_str(), error = error.as_str(), "key failed");
                KeyReport {
                    original_key: key,
                    new_key: None,
                    action,
                    warnings: Vec::new(),
                    error: Some(error),
                }
            }
        }
    }

    /// Reads, transforms and republishes one added or updated key.
    fn transform_key(
        &self,
        ctx: &TransformContext,
        key: &str,
    ) -> Result<(String, Vec<TransformWarning>), String> {
        let bytes = self.store.get(key).map_err(|err| err.to_string())?;
        let outcome =
            self.engine.transform(&bytes, key, ctx).map_err(|err| err.to_string())?;
        self.store
            .put(&outcome.new_key, &outcome.body)
            .map_err(|err| err.to_string())?;
        debug!(
            key,
            new_key = outcome.new_key.as_str(),
            kind = outcome.kind.label(),
            "published transformed document"
        );
        Ok((outcome.new_key, outcome.warnings))
    }

    /// Remaps and deletes one deleted key; absent objects still succeed.
    fn delete_key(
        &self,
        ctx: &TransformContext,
        key: &str,
    ) -> Result<(String, Vec<TransformWarning>), String> {
        let new_key = resolve_storage_key(key, ctx).map_err(|err| err.to_string())?;
        match self.store.delete(&new_key) {
            Ok(()) | Err(StoreError::NotFound(_)) => Ok((new_key, Vec::new())),
            Err(err) => Err(err.to_string()),
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Flattens the message's key lists into tagged jobs.
fn collect_jobs(message: &HarvestMessage) -> Vec<(String, KeyAction)> {
    let mut jobs = Vec::with_capacity(
        message.added_keys.len() + message.updated_keys.len() + message.deleted_keys.len(),
    );
    for key in &message.added_keys {
        jobs.push((key.clone(), KeyAction::Added));
    }
    for key in &message.updated_keys {
        jobs.push((key.clone(), KeyAction::Updated));
    }
    for key in &message.deleted_keys {
        jobs.push((key.clone(), KeyAction::Deleted));
    }
    jobs
}

/// Builds the republished message from the per-key reports.
fn assemble_message(input: &HarvestMessage, keys: &[KeyReport]) -> TransformedMessage {
    let remapped = |action: KeyAction| -> Vec<String> {
        keys.iter()
            .filter(|report| report.action == action && report.succeeded())
            .filter_map(|report| report.new_key.clone())
            .collect()
    };
    TransformedMessage {
        id: input.id.clone(),
        bucket_name: input.bucket_name.clone(),
        source: input.source.clone(),
        target: input.target.clone(),
        workspace: input.workspace.clone(),
        added_keys: remapped(KeyAction::Added),
        updated_keys: remapped(KeyAction::Updated),
        deleted_keys: remapped(KeyAction::Deleted),
    }
}
