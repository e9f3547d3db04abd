// crates/scanforge-core/src/error.rs
// ============================================================================
// Module: ScanForge Error Taxonomy
// Description: Stable error kinds shared across adapters, the scheduler, and the CLI.
// Purpose: Distinguish validation, tool-absence, scheduler, and execution errors.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Four error kinds cover the core's failure surface, each with a stable
//! short code for programmatic handling and log correlation. Adapter-level
//! validation failures and executor spawn failures are returned inside a
//! [`crate::core::state::TaskResult`], not raised as [`ScanForgeError`];
//! this type is reserved for failures surfaced directly to a caller of the
//! scheduler (an unknown job id, a stalled DAG).

use thiserror::Error;

/// Stable, programmatically matchable error kinds for the ScanForge core.
///
/// # Invariants
/// - Each variant's `code()` is stable across releases.
#[derive(Debug, Error)]
pub enum ScanForgeError {
    /// A target string failed adapter-level format validation.
    #[error("[E1001] invalid target format: {target}")]
    InvalidTarget {
        /// The rejected target string.
        target: String,
    },
    /// `tool_name` was not recognized by the adapter dispatcher.
    #[error("[E2001] tool not found: {tool_name}")]
    ToolNotFound {
        /// The unrecognized tool name.
        tool_name: String,
    },
    /// An internal scheduler invariant was violated.
    #[error("[E3001] scheduler error: {message}")]
    Scheduler {
        /// Description of the violated invariant.
        message: String,
    },
    /// A subprocess failed to spawn, or failed after its timeout escalation.
    #[error("[E4001] execution error: {message}")]
    Execution {
        /// Description of the execution failure.
        message: String,
    },
}

impl ScanForgeError {
    /// Returns the stable short code for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidTarget { .. } => "E1001",
            Self::ToolNotFound { .. } => "E2001",
            Self::Scheduler { .. } => "E3001",
            Self::Execution { .. } => "E4001",
        }
    }
}
