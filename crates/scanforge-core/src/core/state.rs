// crates/scanforge-core/src/core/state.rs
// ============================================================================
// Module: ScanForge Job and Task State
// Description: Job, Task, TaskResult, and asset records with lifecycle invariants.
// Purpose: Capture the evolving scan DAG in a form that snapshots trivially to JSON.
// Dependencies: crate::core::{identifiers, params, status, time}, serde, serde_json
// ============================================================================

//! ## Overview
//! A [`Job`] owns an append-only list of [`Task`] nodes. Dependencies are
//! expressed as [`TaskId`] values rather than pointers so the whole graph
//! serializes without cycles or shared ownership concerns; readiness is a
//! linear scan over `tasks`, which is cheap for the dozens-of-tasks DAGs
//! this system grows (see DESIGN.md).

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::JobId;
use crate::core::identifiers::TaskId;
use crate::core::params::ParamMap;
use crate::core::status::Severity;
use crate::core::status::TaskStatus;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Task Result
// ============================================================================

/// Outcome of one adapter invocation.
///
/// # Invariants
/// - `success = (return_code == 0 && !timed_out)` unless an adapter
///   documents an override (see each adapter's module docs).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    /// Whether the adapter considers this invocation successful.
    pub success: bool,
    /// Process exit code, or `-1` on spawn failure or timeout.
    pub return_code: i32,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Whether the invocation was terminated for exceeding its timeout.
    pub timed_out: bool,
    /// Tool-specific extra fields (e.g. a generated resource-script path).
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TaskResult {
    /// Builds a result for a successful invocation.
    #[must_use]
    pub fn success(return_code: i32, stdout: String, stderr: String) -> Self {
        Self {
            success: return_code == 0,
            return_code,
            stdout,
            stderr,
            timed_out: false,
            extra: serde_json::Map::new(),
        }
    }
}

// ============================================================================
// SECTION: Task
// ============================================================================

/// One node of a job's dynamically growing task DAG.
///
/// # Invariants
/// - `status` transitions only `Pending -> Running -> {Completed, Failed}`.
/// - `started_at` is set exactly when `Pending -> Running` occurs.
/// - `completed_at` is set exactly when `Running -> {Completed, Failed}` occurs.
/// - `result` is populated on `Completed`; it may also be populated on `Failed`.
/// - `error` is populated only when `status = Failed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Opaque identifier, unique within the owning job.
    pub id: TaskId,
    /// Adapter key (e.g. `"nmap"`).
    pub tool_name: String,
    /// Tool parameters; shape is fixed per tool.
    pub params: ParamMap,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// Task ids that must reach `Completed` before this task may start.
    pub dependencies: Vec<TaskId>,
    /// Result populated on terminal transition.
    pub result: Option<TaskResult>,
    /// Human-readable failure reason, populated only when `Failed`.
    pub error: Option<String>,
    /// Creation timestamp.
    pub created_at: Timestamp,
    /// Dispatch timestamp.
    pub started_at: Option<Timestamp>,
    /// Terminal-transition timestamp.
    pub completed_at: Option<Timestamp>,
}

impl Task {
    /// Creates a new, pending task with no dependencies.
    #[must_use]
    pub fn new(tool_name: impl Into<String>, params: ParamMap) -> Self {
        Self {
            id: TaskId::new(),
            tool_name: tool_name.into(),
            params,
            status: TaskStatus::Pending,
            dependencies: Vec::new(),
            result: None,
            error: None,
            created_at: Timestamp::now(),
            started_at: None,
            completed_at: None,
        }
    }

    /// Creates a new, pending task depending on the given task ids.
    #[must_use]
    pub fn with_dependencies(
        tool_name: impl Into<String>,
        params: ParamMap,
        dependencies: Vec<TaskId>,
    ) -> Self {
        Self {
            dependencies,
            ..Self::new(tool_name, params)
        }
    }
}

// ============================================================================
// SECTION: Job
// ============================================================================

/// Root container for one scan request against one target.
///
/// # Invariants
/// - `status = Completed` iff every task in `tasks` is `Completed`.
/// - `status = Failed` iff the scheduler detected an unrecoverable condition.
/// - `status = Running` while any task is `Pending` or `Running` and the loop is active.
/// - `tasks` grows monotonically; tasks are never removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Opaque job identifier.
    pub id: JobId,
    /// User-supplied target (IP, hostname, or URL).
    pub target: String,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// Append-only task list.
    pub tasks: Vec<Task>,
    /// Descriptive assets discovered from task output.
    #[serde(default)]
    pub assets: Vec<Host>,
    /// Creation timestamp.
    pub created_at: Timestamp,
}

impl Job {
    /// Creates a new job with no tasks yet.
    #[must_use]
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            id: JobId::new(),
            target: target.into(),
            status: TaskStatus::Pending,
            tasks: Vec::new(),
            assets: Vec::new(),
            created_at: Timestamp::now(),
        }
    }

    /// Finds a task by id within this job.
    #[must_use]
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// Finds a mutable task by id within this job.
    pub fn task_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == id)
    }
}

// ============================================================================
// SECTION: Descriptive Assets
// ============================================================================

/// A reported vulnerability against a service or host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vulnerability {
    /// Short title.
    pub title: String,
    /// Severity classification.
    pub severity: Severity,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Optional raw evidence (log excerpt, request/response snippet).
    pub evidence: Option<String>,
}

/// A network service discovered on a host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    /// Port number.
    pub port: u16,
    /// Transport protocol (`"tcp"`, `"udp"`).
    pub protocol: String,
    /// Best-effort service name, `"unknown"` if unidentified.
    pub service_name: String,
    /// Optional product name.
    pub product: Option<String>,
    /// Optional product version.
    pub version: Option<String>,
}

/// A host discovered or targeted during a scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Host {
    /// Host IP address as text.
    pub ip: String,
    /// Optional resolved hostname.
    pub hostname: Option<String>,
    /// Optional OS fingerprint.
    pub os: Option<String>,
    /// Services discovered on this host.
    #[serde(default)]
    pub services: Vec<Service>,
    /// Vulnerabilities discovered on this host.
    #[serde(default)]
    pub vulnerabilities: Vec<Vulnerability>,
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
    use crate::core::params::param_map;

    #[test]
    fn new_job_has_no_tasks_and_is_pending() {
        let job = Job::new("127.0.0.1");
        assert_eq!(job.status, TaskStatus::Pending);
        assert!(job.tasks.is_empty());
    }

    #[test]
    fn task_lookup_finds_by_id() {
        let mut job = Job::new("127.0.0.1");
        let task = Task::new("nmap", param_map([("target", "127.0.0.1")]));
        let id = task.id;
        job.tasks.push(task);
        assert!(job.task(id).is_some());
        assert!(job.task_mut(id).is_some());
    }

    #[test]
    fn job_round_trips_through_json() {
        let mut job = Job::new("example.com");
        job.tasks.push(Task::new("nmap", param_map([("target", "example.com")])));
        let text = serde_json::to_string(&job).expect("job serializes");
        let restored: Job = serde_json::from_str(&text).expect("job deserializes");
        assert_eq!(job, restored);
    }
}
