// crates/scanforge-executor/src/executor.rs
// ============================================================================
// Module: ScanForge Command Executor
// Description: Shell command runner with concurrent stream capture and
// timeout escalation (graceful termination, then forced kill).
// Purpose: Give every tool adapter one place to run a constructed command
// line without handling process plumbing itself.
// Dependencies: tokio, scanforge-core, nix (unix signal delivery)
// ============================================================================

//! ## Overview
//! [`CommandExecutor::run`] launches `command` under a shell, reads stdout
//! and stderr concurrently into in-memory buffers, and returns once the
//! process exits or `timeout_secs` elapses. On timeout it signals graceful
//! termination, waits up to [`TERMINATION_GRACE`], then forcibly kills the
//! process if it is still alive. Whatever output was captured before
//! termination is preserved rather than discarded.
//!
//! Security posture: this executor trusts the command string it is given.
//! Rejecting shell metacharacters in untrusted fields is the caller's
//! job — see each adapter in `scanforge-adapters`.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use scanforge_core::TaskResult;
use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;
use tokio::process::Child;
use tokio::process::Command;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::warn;

/// Grace period between graceful termination and a forced kill.
const TERMINATION_GRACE: Duration = Duration::from_secs(5);

/// Bound on how long `run` waits for stream readers to drain after the
/// process has exited or been killed, so a stalled pipe cannot hang the
/// caller forever.
const READER_JOIN_GRACE: Duration = Duration::from_secs(2);

/// Size of each read chunk pulled from a child's stdout/stderr pipe.
const READ_CHUNK_BYTES: usize = 8192;

/// Runs shell commands with bounded wall-clock time and streamed output
/// capture.
///
/// # Invariants
/// - Never propagates a panic across its public boundary; every failure
///   mode (spawn failure, timeout) is folded into a [`TaskResult`].
/// - `result.timed_out` is set if and only if the process outlived
///   `timeout_secs` and was terminated by this executor.
#[derive(Debug, Clone, Copy)]
pub struct CommandExecutor {
    /// Shell binary used to interpret `command`. Overridable so tests can
    /// exercise the spawn-failure path with a binary that does not exist.
    shell: &'static str,
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandExecutor {
    /// Builds an executor that interprets commands with `/bin/sh -c`.
    #[must_use]
    pub const fn new() -> Self {
        Self { shell: "/bin/sh" }
    }

    /// Builds an executor that interprets commands with a caller-chosen
    /// shell binary. Used by tests to exercise the spawn-failure path.
    #[must_use]
    pub const fn with_shell(shell: &'static str) -> Self {
        Self { shell }
    }

    /// Runs `command` under this executor's shell, bounded by
    /// `timeout_secs`.
    ///
    /// On a clean exit, `success = (return_code == 0)`; callers that need
    /// the adapter-level success override (§4.1) apply it to the returned
    /// [`TaskResult`] themselves.
    pub async fn run(&self, command: &str, timeout_secs: u64) -> TaskResult {
        let mut child = match Command::new(self.shell)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(err) => {
                warn!(shell = self.shell, error = %err, "failed to spawn command");
                return TaskResult {
                    success: false,
                    return_code: -1,
                    stdout: String::new(),
                    stderr: format!("failed to spawn command: {err}"),
                    timed_out: false,
                    extra: serde_json::Map::new(),
                };
            }
        };

        let stdout_buf = Arc::new(Mutex::new(String::new()));
        let stderr_buf = Arc::new(Mutex::new(String::new()));
        let stdout_task = spawn_reader(child.stdout.take(), Arc::clone(&stdout_buf));
        let stderr_task = spawn_reader(child.stderr.take(), Arc::clone(&stderr_buf));

        let timeout_secs = Duration::from_secs(timeout_secs);
        let (return_code, timed_out) = match tokio::time::timeout(timeout_secs, child.wait()).await {
            Ok(Ok(status)) => (status.code().unwrap_or(-1), false),
            Ok(Err(err)) => {
                warn!(error = %err, "error waiting on child process");
                (-1, false)
            }
            Err(_elapsed) => {
                escalate(&mut child).await;
                (-1, true)
            }
        };

        join_reader(stdout_task).await;
        join_reader(stderr_task).await;
        let stdout = stdout_buf.lock().await.clone();
        let stderr = stderr_buf.lock().await.clone();

        TaskResult {
            success: return_code == 0 && !timed_out,
            return_code,
            stdout,
            stderr,
            timed_out,
            extra: serde_json::Map::new(),
        }
    }
}

/// Attempts graceful termination, then a forced kill after
/// [`TERMINATION_GRACE`] if the process is still alive.
async fn escalate(child: &mut Child) {
    terminate_gracefully(child);
    if tokio::time::timeout(TERMINATION_GRACE, child.wait()).await.is_ok() {
        return;
    }
    warn!("process survived graceful termination, forcing kill");
    if let Err(err) = child.start_kill() {
        warn!(error = %err, "forced kill failed");
    }
    let _ = child.wait().await;
}

/// Sends a graceful termination signal to `child`. On Unix this is
/// `SIGTERM`; platforms without a softer signal fall back to the same
/// forced kill the escalation path would use anyway after the grace
/// period.
#[cfg(unix)]
fn terminate_gracefully(child: &Child) {
    let Some(pid) = child.id() else {
        return;
    };
    let pid = nix::unistd::Pid::from_raw(i32::try_from(pid).unwrap_or(i32::MAX));
    if let Err(err) = nix::sys::signal::kill(pid, nix::sys::signal::Signal::SIGTERM) {
        warn!(%pid, error = %err, "failed to send SIGTERM");
    }
}

#[cfg(not(unix))]
fn terminate_gracefully(child: &mut Child) {
    if let Err(err) = child.start_kill() {
        warn!(error = %err, "forced kill failed");
    }
}

/// Spawns a task that drains `reader` into `buffer` until EOF. Returns
/// `None` if `reader` is absent (the pipe was not captured).
fn spawn_reader<R>(reader: Option<R>, buffer: Arc<Mutex<String>>) -> Option<JoinHandle<()>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut reader = reader?;
    Some(tokio::spawn(async move {
        let mut chunk = [0_u8; READ_CHUNK_BYTES];
        loop {
            match reader.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    let text = String::from_utf8_lossy(&chunk[..n]).into_owned();
                    buffer.lock().await.push_str(&text);
                }
            }
        }
    }))
}

/// Joins a reader task with a bounded wait, aborting it if it has not
/// finished — whatever it wrote to its shared buffer before the bound
/// elapsed is what `run` returns.
async fn join_reader(task: Option<JoinHandle<()>>) {
    let Some(task) = task else {
        return;
    };
    if tokio::time::timeout(READER_JOIN_GRACE, task).await.is_err() {
        warn!("stream reader did not finish within the join grace period");
    }
}
