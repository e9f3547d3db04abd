// crates/scanforge-remote/src/lib.rs
// ============================================================================
// Crate: scanforge-remote
// Description: HTTP transport for routing adapter commands to a remote
// Kali-tools-style execution server instead of the local subprocess executor.
// ============================================================================

//! ## Overview
//! [`RemoteClient`] is a `ToolAdapter`-agnostic transport only: no
//! scheduler code depends on it directly. It exists for a caller that
//! wants to route a tool's constructed command string to a remote
//! executor (distilled spec §6's "alternative to local subprocess
//! execution"), mirroring the original prototype's
//! `KaliToolsClient.safe_get`/`safe_post` fail-closed behavior.

pub mod client;

pub use client::RemoteClient;
pub use client::RemoteResponse;
