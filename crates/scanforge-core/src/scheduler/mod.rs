// crates/scanforge-core/src/scheduler/mod.rs
// ============================================================================
// Module: ScanForge Scheduler
// Description: Owns the job DAG, drives the async execution loop, and applies
// follow-up rules on task completion.
// Purpose: Implement dynamic DAG growth, concurrent dispatch, deadlock
// detection, and durable snapshotting as a single cohesive unit.
// Dependencies: crate::core, crate::interfaces, crate::error, tokio, tracing
// ============================================================================

//! ## Overview
//! The scheduler is single-threaded at the *loop* level (one
//! [`Scheduler::run_job`] future per in-flight job) with concurrent
//! fan-out per task: each ready task is dispatched via `tokio::spawn` so a
//! slow tool never blocks the loop from dispatching its siblings. Multiple
//! jobs run as independent, mutually unordered `run_job` futures sharing
//! one `Scheduler` and its in-memory job index.
//!
//! Security posture: the scheduler never interpolates a target string
//! into a shell command itself — that responsibility, including
//! shell-metacharacter rejection, belongs to each [`ToolAdapter`].

pub mod followup;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::core::identifiers::JobId;
use crate::core::identifiers::TaskId;
use crate::core::params::param_map;
use crate::core::state::Job;
use crate::core::state::Task;
use crate::core::status::TaskStatus;
use crate::core::time::Timestamp;
use crate::error::ScanForgeError;
use crate::interfaces::JobStore;
use crate::interfaces::ToolAdapter;

/// Interval between quiescence/readiness re-evaluations.
///
/// Correctness-irrelevant: the loop only needs to eventually observe a
/// state change and converge. 200ms keeps CLI status views responsive
/// without busy-polling.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Outcome of one scheduling step, used to decide whether `run_job`
/// should keep looping.
enum StepOutcome {
    /// No pending and no running tasks remain; the job is done.
    Quiescent,
    /// Pending tasks remain but none are ready and none are running.
    Stalled,
    /// The loop should sleep and re-evaluate.
    Continue,
}

/// Owns the in-memory job index and drives job execution.
pub struct Scheduler {
    /// Live jobs, keyed by id. Mutated only by the scheduler; adapters
    /// never see this map.
    jobs: Mutex<HashMap<JobId, Job>>,
    /// Durable persistence gateway. Failures here are logged and
    /// swallowed; see [`JobStore`]'s documented contract.
    store: Arc<dyn JobStore>,
    /// Registered tool adapters, keyed by `tool_name`.
    adapters: HashMap<String, Arc<dyn ToolAdapter>>,
}

impl Scheduler {
    /// Builds a scheduler over the given persistence gateway and adapter
    /// registry.
    #[must_use]
    pub fn new(store: Arc<dyn JobStore>, adapters: HashMap<String, Arc<dyn ToolAdapter>>) -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
            store,
            adapters,
        }
    }

    /// Creates a job with a seeded `nmap` task and persists it.
    ///
    /// Mirrors the distilled specification's `create_job`: one initial
    /// task is appended (`tool_name = "nmap"`, `params = { target,
    /// ports: "top-1000" }`); nothing is dispatched until
    /// [`Scheduler::run_job`] is called.
    pub async fn create_job(&self, target: impl Into<String>) -> Job {
        let target = target.into();
        let mut job = Job::new(target.clone());
        job.tasks.push(Task::new("nmap", param_map([("target", target), ("ports", "top-1000".to_string())])));

        {
            let mut jobs = self.jobs.lock().await;
            jobs.insert(job.id, job.clone());
        }
        self.persist(job.id).await;
        job
    }

    /// Creates a job with a seeded `nmap` task whose port set is
    /// overridden (used by the `--profile deep` CLI flag; see
    /// SPEC_FULL.md §6.1).
    pub async fn create_job_with_ports(&self, target: impl Into<String>, ports: impl Into<String>) -> Job {
        let target = target.into();
        let mut job = Job::new(target.clone());
        job.tasks.push(Task::new("nmap", param_map([("target", target), ("ports", ports.into())])));

        {
            let mut jobs = self.jobs.lock().await;
            jobs.insert(job.id, job.clone());
        }
        self.persist(job.id).await;
        job
    }

    /// Runs the execution loop for `job_id` to completion.
    ///
    /// # Errors
    ///
    /// Returns [`ScanForgeError::Scheduler`] when `job_id` is not a known
    /// in-memory job.
    pub async fn run_job(self: Arc<Self>, job_id: JobId) -> Result<(), ScanForgeError> {
        {
            let mut jobs = self.jobs.lock().await;
            let job = jobs.get_mut(&job_id).ok_or_else(|| ScanForgeError::Scheduler {
                message: format!("run_job called with unknown job id {job_id}"),
            })?;
            job.status = TaskStatus::Running;
            info!(%job_id, target = %job.target, "job started");
        }
        self.persist(job_id).await;

        loop {
            match self.clone().step(job_id).await? {
                StepOutcome::Quiescent => break,
                StepOutcome::Stalled => {
                    self.persist(job_id).await;
                    warn!(%job_id, "job stalled: unschedulable residue");
                    return Ok(());
                }
                StepOutcome::Continue => {}
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }

        {
            let mut jobs = self.jobs.lock().await;
            if let Some(job) = jobs.get_mut(&job_id) {
                job.status = TaskStatus::Completed;
            }
        }
        self.persist(job_id).await;
        info!(%job_id, "job completed");
        Ok(())
    }

    /// Performs one quiescence/readiness/dispatch cycle.
    async fn step(self: Arc<Self>, job_id: JobId) -> Result<StepOutcome, ScanForgeError> {
        let ready_ids = {
            let mut jobs = self.jobs.lock().await;
            let job = jobs.get_mut(&job_id).ok_or_else(|| ScanForgeError::Scheduler {
                message: format!("job {job_id} disappeared from the in-memory index"),
            })?;

            let pending: Vec<TaskId> =
                job.tasks.iter().filter(|t| t.status == TaskStatus::Pending).map(|t| t.id).collect();
            let running_exists = job.tasks.iter().any(|t| t.status == TaskStatus::Running);

            if pending.is_empty() && !running_exists {
                return Ok(StepOutcome::Quiescent);
            }

            let ready: Vec<TaskId> = pending.into_iter().filter(|id| Self::is_ready(job, *id)).collect();

            if ready.is_empty() {
                if running_exists {
                    return Ok(StepOutcome::Continue);
                }
                job.status = TaskStatus::Failed;
                return Ok(StepOutcome::Stalled);
            }

            for id in &ready {
                if let Some(task) = job.task_mut(*id) {
                    task.status = TaskStatus::Running;
                    task.started_at = Some(Timestamp::now());
                }
            }
            ready
        };

        self.persist(job_id).await;
        for task_id in ready_ids {
            let scheduler = Arc::clone(&self);
            tokio::spawn(async move { scheduler.execute_task(job_id, task_id).await });
        }
        Ok(StepOutcome::Continue)
    }

    /// A pending task is ready iff every dependency resolves, within the
    /// same job, to a `Completed` task. A dependency that is missing or
    /// `Failed` makes the task unschedulable (never ready again).
    fn is_ready(job: &Job, task_id: TaskId) -> bool {
        let Some(task) = job.task(task_id) else {
            return false;
        };
        task.dependencies.iter().all(|dep_id| job.task(*dep_id).is_some_and(|dep| dep.status == TaskStatus::Completed))
    }

    /// Returns the in-memory job if known, otherwise reads through the
    /// persistence gateway and caches a hit.
    pub async fn get_job(&self, job_id: JobId) -> Option<Job> {
        {
            let jobs = self.jobs.lock().await;
            if let Some(job) = jobs.get(&job_id) {
                return Some(job.clone());
            }
        }

        match self.store.get_job(job_id).await {
            Ok(Some(job)) => {
                let mut jobs = self.jobs.lock().await;
                jobs.insert(job.id, job.clone());
                Some(job)
            }
            Ok(None) => None,
            Err(err) => {
                error!(%job_id, error = %err, "job store read failed");
                None
            }
        }
    }

    /// Dispatches one ready task to its adapter, records the outcome, and
    /// applies follow-up rules on success. Runs off the scheduling loop's
    /// critical path — always invoked from within a `tokio::spawn`.
    async fn execute_task(self: Arc<Self>, job_id: JobId, task_id: TaskId) {
        let (tool_name, params) = {
            let jobs = self.jobs.lock().await;
            let Some(job) = jobs.get(&job_id) else {
                error!(%job_id, %task_id, "job vanished before task execution");
                return;
            };
            let Some(task) = job.task(task_id) else {
                error!(%job_id, %task_id, "task vanished before execution");
                return;
            };
            (task.tool_name.clone(), task.params.clone())
        };

        info!(%job_id, %task_id, tool = %tool_name, "dispatching task");

        let adapter = self.adapters.get(&tool_name).cloned();

        {
            let mut jobs = self.jobs.lock().await;
            let Some(job) = jobs.get_mut(&job_id) else {
                return;
            };

            match adapter {
                None => {
                    if let Some(task) = job.task_mut(task_id) {
                        task.completed_at = Some(Timestamp::now());
                        task.status = TaskStatus::Failed;
                        task.error = Some(format!("tool not found: {tool_name}"));
                    }
                    warn!(%job_id, %task_id, tool = %tool_name, "unknown tool name");
                }
                Some(_) => {
                    // Result is filled in below, outside this borrow, because
                    // adapter.run() is awaited before we reacquire the lock.
                }
            }
        }

        let Some(adapter) = self.adapters.get(&tool_name).cloned() else {
            self.persist(job_id).await;
            return;
        };

        let result = adapter.run(&params).await;

        let followups = {
            let mut jobs = self.jobs.lock().await;
            let Some(job) = jobs.get_mut(&job_id) else {
                return;
            };

            if let Some(task) = job.task_mut(task_id) {
                task.completed_at = Some(Timestamp::now());
                if result.success {
                    task.status = TaskStatus::Completed;
                    task.result = Some(result);
                } else {
                    task.status = TaskStatus::Failed;
                    task.error = Some(if result.stderr.trim().is_empty() {
                        "adapter reported failure".to_string()
                    } else {
                        result.stderr.clone()
                    });
                    task.result = Some(result);
                }
            }

            let completed = job.task(task_id).filter(|t| t.status == TaskStatus::Completed);
            if let Some(completed) = completed {
                let specs = followup::evaluate(job, completed);
                for spec in &specs {
                    info!(%job_id, %task_id, new_tool = %spec.tool_name, "scheduling follow-up task");
                }
                specs
            } else {
                Vec::new()
            }
        };

        if !followups.is_empty() {
            let mut jobs = self.jobs.lock().await;
            if let Some(job) = jobs.get_mut(&job_id) {
                for spec in followups {
                    job.tasks.push(spec.into_task());
                }
            }
        }

        self.persist(job_id).await;
    }

    /// Snapshots the in-memory job to the persistence gateway, logging and
    /// swallowing any failure per the distilled specification's
    /// non-fatal-persistence contract.
    async fn persist(&self, job_id: JobId) {
        let snapshot = {
            let jobs = self.jobs.lock().await;
            jobs.get(&job_id).cloned()
        };
        let Some(job) = snapshot else {
            return;
        };
        if let Err(err) = self.store.save_job(&job).await {
            error!(%job_id, error = %err, "job snapshot failed to persist");
        }
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

    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;

    use super::*;
    use crate::core::state::TaskResult;

    struct InMemoryStore {
        jobs: StdMutex<HashMap<JobId, Job>>,
    }

    impl InMemoryStore {
        fn new() -> Self {
            Self {
                jobs: StdMutex::new(HashMap::new()),
            }
        }
    }

    #[async_trait]
    impl JobStore for InMemoryStore {
        async fn ensure_schema(&self) -> Result<(), crate::interfaces::StoreError> {
            Ok(())
        }

        async fn save_job(&self, job: &Job) -> Result<(), crate::interfaces::StoreError> {
            self.jobs.lock().expect("lock not poisoned").insert(job.id, job.clone());
            Ok(())
        }

        async fn update_status(
            &self,
            job_id: JobId,
            status: TaskStatus,
        ) -> Result<(), crate::interfaces::StoreError> {
            if let Some(job) = self.jobs.lock().expect("lock not poisoned").get_mut(&job_id) {
                job.status = status;
            }
            Ok(())
        }

        async fn get_job(&self, job_id: JobId) -> Result<Option<Job>, crate::interfaces::StoreError> {
            Ok(self.jobs.lock().expect("lock not poisoned").get(&job_id).cloned())
        }
    }

    struct ScriptedAdapter {
        stdout: String,
        succeed: bool,
    }

    #[async_trait]
    impl ToolAdapter for ScriptedAdapter {
        async fn run(&self, _params: &crate::core::params::ParamMap) -> TaskResult {
            TaskResult {
                success: self.succeed,
                return_code: if self.succeed { 0 } else { 1 },
                stdout: self.stdout.clone(),
                stderr: String::new(),
                timed_out: false,
                extra: serde_json::Map::new(),
            }
        }

        fn timeout_secs(&self) -> u64 {
            60
        }
    }

    fn adapters(nmap_stdout: &str) -> HashMap<String, Arc<dyn ToolAdapter>> {
        let mut map: HashMap<String, Arc<dyn ToolAdapter>> = HashMap::new();
        map.insert(
            "nmap".to_string(),
            Arc::new(ScriptedAdapter {
                stdout: nmap_stdout.to_string(),
                succeed: true,
            }),
        );
        map.insert(
            "nuclei".to_string(),
            Arc::new(ScriptedAdapter {
                stdout: String::new(),
                succeed: true,
            }),
        );
        map.insert(
            "gobuster".to_string(),
            Arc::new(ScriptedAdapter {
                stdout: String::new(),
                succeed: true,
            }),
        );
        map
    }

    #[tokio::test]
    async fn create_job_seeds_one_nmap_task() {
        let scheduler = Scheduler::new(Arc::new(InMemoryStore::new()), adapters("22/tcp open ssh"));
        let job = scheduler.create_job("127.0.0.1").await;
        assert_eq!(job.target, "127.0.0.1");
        assert_eq!(job.status, TaskStatus::Pending);
        assert_eq!(job.tasks.len(), 1);
        assert_eq!(job.tasks[0].tool_name, "nmap");
        assert_eq!(job.tasks[0].params.get("target").and_then(|v| v.as_str()), Some("127.0.0.1"));
    }

    #[tokio::test]
    async fn web_detection_grows_the_dag_to_three_completed_tasks() {
        let scheduler = Arc::new(Scheduler::new(Arc::new(InMemoryStore::new()), adapters("80/tcp open http")));
        let job = scheduler.create_job("example.com").await;
        scheduler.clone().run_job(job.id).await.expect("run_job succeeds");

        let finished = scheduler.get_job(job.id).await.expect("job present");
        assert_eq!(finished.status, TaskStatus::Completed);
        assert_eq!(finished.tasks.len(), 3);
        assert!(finished.tasks.iter().all(|t| t.status == TaskStatus::Completed));

        let nmap_id = finished.tasks.iter().find(|t| t.tool_name == "nmap").expect("nmap task").id;
        for follow_up in finished.tasks.iter().filter(|t| t.tool_name != "nmap") {
            assert_eq!(follow_up.dependencies, vec![nmap_id]);
        }
    }

    #[tokio::test]
    async fn no_web_evidence_leaves_exactly_one_completed_task() {
        let scheduler = Arc::new(Scheduler::new(Arc::new(InMemoryStore::new()), adapters("22/tcp open ssh")));
        let job = scheduler.create_job("example.com").await;
        scheduler.clone().run_job(job.id).await.expect("run_job succeeds");

        let finished = scheduler.get_job(job.id).await.expect("job present");
        assert_eq!(finished.status, TaskStatus::Completed);
        assert_eq!(finished.tasks.len(), 1);
    }

    #[tokio::test]
    async fn unknown_tool_name_fails_only_that_task() {
        let mut map = adapters("22/tcp open ssh");
        map.remove("nmap");
        let scheduler = Arc::new(Scheduler::new(Arc::new(InMemoryStore::new()), map));
        let job = scheduler.create_job("example.com").await;
        scheduler.clone().run_job(job.id).await.expect("run_job succeeds");

        let finished = scheduler.get_job(job.id).await.expect("job present");
        assert_eq!(finished.tasks.len(), 1);
        assert_eq!(finished.tasks[0].status, TaskStatus::Failed);
        assert!(finished.tasks[0].error.as_deref().unwrap_or_default().contains("tool not found"));
    }

    #[tokio::test]
    async fn failed_task_with_no_dependents_still_quiesces_to_completed() {
        let mut map = adapters("22/tcp open ssh");
        map.insert(
            "nmap".to_string(),
            Arc::new(ScriptedAdapter {
                stdout: "22/tcp open ssh".to_string(),
                succeed: false,
            }),
        );
        let scheduler = Arc::new(Scheduler::new(Arc::new(InMemoryStore::new()), map));
        let job = scheduler.create_job("example.com").await;
        scheduler.clone().run_job(job.id).await.expect("run_job succeeds");

        let finished = scheduler.get_job(job.id).await.expect("job present");
        assert_eq!(finished.tasks.len(), 1);
        assert_eq!(finished.tasks[0].status, TaskStatus::Failed);
        assert_eq!(finished.status, TaskStatus::Completed);
    }

    #[tokio::test]
    async fn unschedulable_dependent_on_a_failed_task_stalls_the_job() {
        let mut map = adapters("22/tcp open ssh");
        map.insert(
            "nmap".to_string(),
            Arc::new(ScriptedAdapter {
                stdout: "22/tcp open ssh".to_string(),
                succeed: false,
            }),
        );
        let scheduler = Arc::new(Scheduler::new(Arc::new(InMemoryStore::new()), map));
        let job = scheduler.create_job("example.com").await;
        let nmap_id = job.tasks[0].id;

        {
            let mut jobs = scheduler.jobs.lock().await;
            let stored = jobs.get_mut(&job.id).expect("job present in index");
            stored.tasks.push(Task::with_dependencies(
                "nuclei",
                param_map([("target", "http://example.com".to_string())]),
                vec![nmap_id],
            ));
        }

        scheduler.clone().run_job(job.id).await.expect("run_job succeeds");

        let finished = scheduler.get_job(job.id).await.expect("job present");
        assert_eq!(finished.status, TaskStatus::Failed);
        assert_eq!(finished.tasks.len(), 2);
        assert_eq!(finished.tasks[0].status, TaskStatus::Failed);
        assert_eq!(finished.tasks[1].status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn run_job_on_unknown_job_id_surfaces_scheduler_error() {
        let scheduler = Arc::new(Scheduler::new(Arc::new(InMemoryStore::new()), adapters("")));
        let bogus = JobId::new();
        let err = scheduler.run_job(bogus).await.expect_err("unknown job id");
        assert_eq!(err.code(), "E3001");
    }
}
