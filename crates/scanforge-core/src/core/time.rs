// crates/scanforge-core/src/core/time.rs
// ============================================================================
// Module: ScanForge Time Model
// Description: Canonical timestamp representation for job and task records.
// Purpose: Provide a serializable, monotonic-friendly timestamp for state transitions.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Timestamps are unix-epoch milliseconds. `Timestamp::now` is the only
//! wall-clock read in the core; everywhere else timestamps flow through as
//! plain values so scheduler logic stays deterministic and testable.

use serde::Deserialize;
use serde::Serialize;

/// Unix-epoch-millisecond timestamp used in job and task records.
///
/// # Invariants
/// - Non-negative for all values produced by [`Timestamp::now`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Returns the current wall-clock time as a timestamp.
    #[must_use]
    pub fn now() -> Self {
        let now = time::OffsetDateTime::now_utc();
        Self(now.unix_timestamp() * 1000 + i64::from(now.millisecond()))
    }

    /// Wraps a raw unix-millisecond value.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the raw unix-millisecond value.
    #[must_use]
    pub const fn unix_millis(self) -> i64 {
        self.0
    }
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
    fn now_is_non_negative() {
        assert!(Timestamp::now().unix_millis() > 0);
    }

    #[test]
    fn ordering_follows_raw_value() {
        let earlier = Timestamp::from_unix_millis(10);
        let later = Timestamp::from_unix_millis(20);
        assert!(earlier < later);
    }
}
