// crates/scanforge-core/src/core/status.rs
// ============================================================================
// Module: ScanForge Status Enums
// Description: TaskStatus and Severity closed sets shared by jobs and tasks.
// Purpose: Define the lifecycle and ordering invariants enforced by the scheduler.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! `TaskStatus` is shared by both `Task` and `Job`: a job's status tracks
//! the same lifecycle as its tasks (see [`crate::core::state::Job`]'s
//! invariants). Legal transitions are `Pending -> Running -> {Completed,
//! Failed}`; no other transition is permitted and terminal states are
//! sticky.

use serde::Deserialize;
use serde::Serialize;

/// Lifecycle status shared by jobs and tasks.
///
/// # Invariants
/// - Legal transitions: `Pending -> Running -> {Completed, Failed}`.
/// - `Completed` and `Failed` are terminal and sticky.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created but not yet dispatched.
    Pending,
    /// Dispatched and in flight.
    Running,
    /// Terminated successfully.
    Completed,
    /// Terminated unsuccessfully.
    Failed,
}

impl TaskStatus {
    /// Returns true for the two terminal variants.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Severity of a reported vulnerability, totally ordered from least to
/// most severe.
///
/// # Invariants
/// - Variant declaration order is the severity ordering (`Info` is least
///   severe, `Critical` is most severe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational finding, not itself a weakness.
    Info,
    /// Low-impact finding.
    Low,
    /// Medium-impact finding.
    Medium,
    /// High-impact finding.
    High,
    /// Critical-impact finding.
    Critical,
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use super::*;

    #[test]
    fn severity_is_totally_ordered() {
        assert!(Severity::Info < Severity::Low);
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn only_completed_and_failed_are_terminal() {
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
    }
}
