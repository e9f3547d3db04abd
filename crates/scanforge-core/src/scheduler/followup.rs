// crates/scanforge-core/src/scheduler/followup.rs
// ============================================================================
// Module: ScanForge Follow-up Rules
// Description: Deterministic rules that grow the task DAG from completed results.
// Purpose: Turn a completed task's output into zero or more new pending tasks.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! A follow-up rule is a deterministic, side-effect-free function from a
//! completed task to a list of new task specs. The registry imposes no
//! limit on rule count; only the one rule named by the specification is
//! registered today (nmap web-detection -> nuclei + gobuster), matching
//! the original prototype's `_process_task_result`, which only ever
//! branches on `tool_name == "nmap"`.

use crate::core::identifiers::TaskId;
use crate::core::params::param_map;
use crate::core::state::Job;
use crate::core::state::Task;

/// Specification for a task to append to the job's DAG.
pub struct NewTaskSpec {
    /// Adapter key for the new task.
    pub tool_name: &'static str,
    /// Parameters for the new task.
    pub params: crate::core::params::ParamMap,
    /// Dependencies for the new task.
    pub dependencies: Vec<TaskId>,
}

impl NewTaskSpec {
    /// Materializes this spec into a pending [`Task`].
    #[must_use]
    pub fn into_task(self) -> Task {
        Task::with_dependencies(self.tool_name, self.params, self.dependencies)
    }
}

/// Evaluates all registered follow-up rules against a just-completed task.
///
/// Rules only ever read `completed.result`; they never mutate `job` or
/// `completed` directly (the scheduler is solely responsible for
/// appending the returned specs as new tasks).
#[must_use]
pub fn evaluate(job: &Job, completed: &Task) -> Vec<NewTaskSpec> {
    let mut specs = Vec::new();
    nmap_web_detection(job, completed, &mut specs);
    specs
}

/// If an `nmap` task's stdout shows evidence of a web service, schedules a
/// `nuclei` scan and a `gobuster` directory brute-force, both depending on
/// the completing nmap task.
fn nmap_web_detection(job: &Job, completed: &Task, out: &mut Vec<NewTaskSpec>) {
    if completed.tool_name != "nmap" {
        return;
    }
    let Some(result) = &completed.result else {
        return;
    };
    let has_web =
        result.stdout.contains("80/tcp") || result.stdout.contains("443/tcp") || result.stdout.contains("http");
    if !has_web {
        return;
    }

    let url = format!("http://{}", job.target);
    out.push(NewTaskSpec {
        tool_name: "nuclei",
        params: param_map([("target", url.clone())]),
        dependencies: vec![completed.id],
    });
    out.push(NewTaskSpec {
        tool_name: "gobuster",
        params: param_map([("url", url)]),
        dependencies: vec![completed.id],
    });
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
    use crate::core::state::TaskResult;

    fn completed_nmap(stdout: &str) -> (Job, Task) {
        let job = Job::new("example.com");
        let mut task = Task::new("nmap", param_map([("target", "example.com")]));
        task.result = Some(TaskResult::success(0, stdout.to_string(), String::new()));
        (job, task)
    }

    #[test]
    fn web_evidence_schedules_nuclei_and_gobuster() {
        let (job, task) = completed_nmap("80/tcp open http");
        let specs = evaluate(&job, &task);
        assert_eq!(specs.len(), 2);
        assert!(specs.iter().any(|s| s.tool_name == "nuclei"));
        assert!(specs.iter().any(|s| s.tool_name == "gobuster"));
        for spec in &specs {
            assert_eq!(spec.dependencies, vec![task.id]);
        }
    }

    #[test]
    fn no_web_evidence_schedules_nothing() {
        let (job, task) = completed_nmap("22/tcp open ssh");
        assert!(evaluate(&job, &task).is_empty());
    }

    #[test]
    fn non_nmap_tasks_never_trigger_the_rule() {
        let job = Job::new("example.com");
        let mut task = Task::new("nuclei", param_map([("target", "http://example.com")]));
        task.result = Some(TaskResult::success(0, "80/tcp open http".to_string(), String::new()));
        assert!(evaluate(&job, &task).is_empty());
    }
}
