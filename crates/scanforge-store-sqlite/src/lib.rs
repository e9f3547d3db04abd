// crates/scanforge-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Job Store
// Description: Durable JobStore backend using SQLite WAL.
// Purpose: Provide production-grade persistence for ScanForge job snapshots.
// Dependencies: scanforge-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a `SQLite`-backed [`JobStore`](scanforge_core::JobStore)
//! implementation that persists full job snapshots as canonical JSON,
//! denormalizing `status` into its own column so a status check never
//! requires deserializing a whole job (distilled spec §8).

pub mod store;

pub use store::SqliteJobStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
