// crates/scanforge-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Job Store
// Description: Durable JobStore backed by SQLite WAL.
// Purpose: Persist job snapshots with a denormalized status column.
// Dependencies: scanforge-core, rusqlite, serde_json, thiserror, tokio, tracing
// ============================================================================

//! ## Overview
//! Each `save_job` upserts the full canonical JSON snapshot for `job.id`
//! and its denormalized `status` column in one transaction. `get_job`
//! reads the row back and deserializes; a missing row or a corrupt
//! payload both surface as `Ok(None)` per [`JobStore`]'s read-nil-on-failure
//! contract. `SQLite` access is synchronous; every call is dispatched
//! through [`tokio::task::spawn_blocking`] so the scheduler's async loop
//! never blocks on disk I/O.

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use scanforge_core::Job;
use scanforge_core::JobStore;
use scanforge_core::StoreError;
use scanforge_core::core::status::TaskStatus;
use thiserror::Error;
use tracing::warn;

/// Default busy timeout (ms) applied to every connection.
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Configuration for the `SQLite` job store.
#[derive(Debug, Clone)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: u64,
}

impl SqliteStoreConfig {
    /// Builds a config pointing at `path` with the default busy timeout.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS }
    }
}

/// `SQLite` store errors.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Store I/O error (filesystem or connection setup).
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Stored payload failed to deserialize or round-trip.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) | SqliteStoreError::Db(message) => Self::Io(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
        }
    }
}

/// `SQLite`-backed job store with WAL support.
///
/// # Invariants
/// - The underlying connection is guarded by a blocking [`Mutex`] and
///   every access goes through [`tokio::task::spawn_blocking`]; callers
///   never hold the async executor hostage on a disk write.
#[derive(Clone)]
pub struct SqliteJobStore {
    /// Shared `SQLite` connection.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteJobStore {
    /// Opens a job store at `config.path`, creating the file and its
    /// parent directory if needed, and applying durability pragmas.
    /// Does not create the `job_results` table; call
    /// [`JobStore::ensure_schema`] before first use.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened.
    pub fn new(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        ensure_parent_dir(&config.path)?;
        let connection = open_connection(config)?;
        Ok(Self { connection: Arc::new(Mutex::new(connection)) })
    }

    /// Runs `f` against the guarded connection on a blocking thread.
    async fn with_connection<F, T>(&self, f: F) -> Result<T, SqliteStoreError>
    where
        F: FnOnce(&Connection) -> Result<T, SqliteStoreError> + Send + 'static,
        T: Send + 'static,
    {
        let connection = Arc::clone(&self.connection);
        tokio::task::spawn_blocking(move || {
            let guard = connection.lock().map_err(|_| SqliteStoreError::Db("mutex poisoned".to_string()))?;
            f(&guard)
        })
        .await
        .map_err(|err| SqliteStoreError::Io(format!("blocking task failed: {err}")))?
    }
}

#[async_trait]
impl JobStore for SqliteJobStore {
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        self.with_connection(|conn| initialize_schema(conn)).await.map_err(StoreError::from)
    }

    async fn save_job(&self, job: &Job) -> Result<(), StoreError> {
        let job = job.clone();
        self.with_connection(move |conn| save_job_row(conn, &job)).await.map_err(StoreError::from)
    }

    async fn update_status(&self, job_id: scanforge_core::JobId, status: TaskStatus) -> Result<(), StoreError> {
        self.with_connection(move |conn| update_status_row(conn, job_id, status))
            .await
            .map_err(StoreError::from)
    }

    async fn get_job(&self, job_id: scanforge_core::JobId) -> Result<Option<Job>, StoreError> {
        self.with_connection(move |conn| Ok(load_job_row(conn, job_id)))
            .await
            .map_err(StoreError::from)
    }
}

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Opens an `SQLite` connection with WAL and a busy timeout.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(connection)
}

/// Creates the `job_results` table if absent, and migrates a pre-existing
/// table that predates the denormalized `status` column.
fn initialize_schema(connection: &Connection) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch(
            "CREATE TABLE IF NOT EXISTS job_results (
                job_id TEXT PRIMARY KEY,
                status TEXT NOT NULL DEFAULT 'pending',
                result_data TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );",
        )
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;

    let has_status_column = connection
        .prepare("SELECT status FROM job_results LIMIT 0")
        .is_ok();
    if !has_status_column {
        connection
            .execute_batch("ALTER TABLE job_results ADD COLUMN status TEXT NOT NULL DEFAULT 'pending';")
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    }
    Ok(())
}

/// Returns the current unix epoch in milliseconds, clamped to `i64::MAX`
/// on overflow rather than panicking.
fn unix_millis() -> i64 {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}

/// Renders a [`TaskStatus`] to the text form stored in the `status` column.
const fn status_label(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "pending",
        TaskStatus::Running => "running",
        TaskStatus::Completed => "completed",
        TaskStatus::Failed => "failed",
    }
}

/// Upserts the full job snapshot and its denormalized status.
fn save_job_row(connection: &Connection, job: &Job) -> Result<(), SqliteStoreError> {
    let payload = serde_json::to_string(job).map_err(|err| SqliteStoreError::Corrupt(err.to_string()))?;
    let now = unix_millis();
    connection
        .execute(
            "INSERT INTO job_results (job_id, status, result_data, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT(job_id) DO UPDATE SET
                status = excluded.status,
                result_data = excluded.result_data,
                updated_at = excluded.updated_at",
            params![job.id.to_string(), status_label(job.status), payload, now],
        )
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Updates only the denormalized `status` column for `job_id`.
fn update_status_row(
    connection: &Connection,
    job_id: scanforge_core::JobId,
    status: TaskStatus,
) -> Result<(), SqliteStoreError> {
    let now = unix_millis();
    connection
        .execute(
            "UPDATE job_results SET status = ?1, updated_at = ?2 WHERE job_id = ?3",
            params![status_label(status), now, job_id.to_string()],
        )
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Reads and deserializes a job snapshot. A missing row or a corrupt
/// payload both surface as `None` per [`JobStore::get_job`]'s contract.
fn load_job_row(connection: &Connection, job_id: scanforge_core::JobId) -> Option<Job> {
    let payload: Option<String> = connection
        .query_row(
            "SELECT result_data FROM job_results WHERE job_id = ?1",
            params![job_id.to_string()],
            |row| row.get(0),
        )
        .optional()
        .ok()
        .flatten();
    let payload = payload?;
    match serde_json::from_str(&payload) {
        Ok(job) => Some(job),
        Err(err) => {
            warn!(%job_id, error = %err, "job snapshot failed to deserialize, treating as absent");
            None
        }
    }
}
