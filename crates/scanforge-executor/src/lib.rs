// crates/scanforge-executor/src/lib.rs
// ============================================================================
// Crate: scanforge-executor
// Description: Subprocess runner with streaming I/O and timeout escalation.
// ============================================================================

//! ## Overview
//! [`CommandExecutor`] is the sole place in ScanForge that spawns a shell
//! process. Every tool adapter in `scanforge-adapters` constructs a
//! denylist-checked command string and hands it to this crate; this crate
//! never interprets or validates tool arguments itself, it only runs
//! what it is given and bounds how long it is allowed to run.

pub mod executor;

pub use executor::CommandExecutor;
