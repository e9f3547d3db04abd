// crates/scanforge-core/src/interfaces/mod.rs
// ============================================================================
// Module: ScanForge Interfaces
// Description: Backend-agnostic contracts for tool adapters and job persistence.
// Purpose: Define the seams the scheduler programs against, independent of
// the concrete executor, persistence, or transport implementations.
// Dependencies: crate::core, async-trait, thiserror
// ============================================================================

//! ## Overview
//! The scheduler only ever talks to these two traits. Concrete
//! implementations (`scanforge-adapters`, `scanforge-store-sqlite`) live in
//! separate crates so the scheduler can be tested against fakes without
//! pulling in a shell, a filesystem, or a database.

use async_trait::async_trait;
use thiserror::Error;

use crate::core::identifiers::JobId;
use crate::core::params::ParamMap;
use crate::core::state::Job;
use crate::core::state::TaskResult;

// ============================================================================
// SECTION: Tool Adapter
// ============================================================================

/// A pure function of a task's parameters to a [`TaskResult`].
///
/// # Invariants
/// - Input validation happens before any process is launched.
/// - Implementations never panic; all failure is reported through the
///   returned [`TaskResult`] (`success = false`, `error` extra field, or
///   via the adapter-specific rejection path) rather than as a `Result`
///   error, matching the distilled specification's adapter contract.
#[async_trait]
pub trait ToolAdapter: Send + Sync {
    /// Runs this adapter against `params`, returning a result regardless
    /// of whether the underlying tool succeeded, failed validation, or
    /// could not be spawned.
    async fn run(&self, params: &ParamMap) -> TaskResult;

    /// The timeout, in seconds, this adapter's invocations are bounded by.
    fn timeout_secs(&self) -> u64;
}

// ============================================================================
// SECTION: Job Store
// ============================================================================

/// Persistence gateway errors.
///
/// # Invariants
/// - Callers treat every variant as non-fatal to scheduling; see
///   [`JobStore`]'s documentation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying storage I/O failed.
    #[error("job store io error: {0}")]
    Io(String),
    /// Stored data could not be deserialized.
    #[error("job store corruption: {0}")]
    Corrupt(String),
}

/// Durable persistence gateway for job snapshots.
///
/// # Invariants
/// - `save_job` is an idempotent upsert keyed by `job.id`.
/// - A later `save_job` supersedes an earlier one for the same job id;
///   there is no cross-job ordering guarantee.
/// - Implementations MUST NOT allow a [`StoreError`] to propagate into a
///   scheduler decision: the scheduler logs and swallows every error this
///   trait returns (see [`crate::scheduler::Scheduler`]).
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Ensures the storage target is ready to accept `save_job`/`get_job`
    /// calls, performing any one-shot lazy migration needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the storage target cannot be prepared.
    async fn ensure_schema(&self) -> Result<(), StoreError>;

    /// Upserts the full serialized job snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    async fn save_job(&self, job: &Job) -> Result<(), StoreError>;

    /// Updates only the denormalized status column for `job_id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    async fn update_status(
        &self,
        job_id: JobId,
        status: crate::core::status::TaskStatus,
    ) -> Result<(), StoreError>;

    /// Reads and deserializes a job snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] only for I/O failures; a missing row or a
    /// deserialization failure both surface as `Ok(None)` per the
    /// distilled specification's read-nil-on-failure contract.
    async fn get_job(&self, job_id: JobId) -> Result<Option<Job>, StoreError>;
}
