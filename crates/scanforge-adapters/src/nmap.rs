// crates/scanforge-adapters/src/nmap.rs
// ============================================================================
// Module: ScanForge nmap Adapter
// Description: Validation and command construction for the nmap port
// scanner, the job's seed tool (see `scanforge-core::scheduler::create_job`).
// Purpose: Translate a task's params into a safe nmap invocation.
// Dependencies: scanforge-core, scanforge-executor
// ============================================================================

//! ## Overview
//! `nmap` is the only tool invoked directly by `Scheduler::create_job`;
//! every other adapter is reached only via a follow-up rule. Its `ports`
//! parameter accepts the keywords `top-100`/`top-1000`/`all` or an
//! explicit port-list string (digits, commas, hyphens only).

use async_trait::async_trait;
use scanforge_core::ParamMap;
use scanforge_core::TaskResult;
use scanforge_core::ToolAdapter;
use scanforge_executor::CommandExecutor;

use crate::validation;

/// Timeout for an nmap invocation (distilled spec §4.1).
const TIMEOUT_SECS: u64 = 300;

/// Timing templates nmap accepts from a task; anything else is rejected.
const ALLOWED_TIMING: [&str; 2] = ["T3", "T4"];

/// Default timing template when the task does not specify one.
const DEFAULT_TIMING: &str = "T3";

/// Default port selection when the task does not specify one.
const DEFAULT_PORTS: &str = "top-1000";

/// nmap port scanner adapter.
pub struct NmapAdapter {
    /// Subprocess runner this adapter dispatches its constructed command to.
    executor: CommandExecutor,
}

impl NmapAdapter {
    /// Builds an nmap adapter over the given executor.
    #[must_use]
    pub const fn new(executor: CommandExecutor) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl ToolAdapter for NmapAdapter {
    async fn run(&self, params: &ParamMap) -> TaskResult {
        match build_command(params) {
            Ok(command) => self.executor.run(&command, TIMEOUT_SECS).await,
            Err(reason) => validation::reject(reason),
        }
    }

    fn timeout_secs(&self) -> u64 {
        TIMEOUT_SECS
    }
}

/// Validates `params` and constructs the nmap command line, or returns a
/// rejection reason without constructing anything.
fn build_command(params: &ParamMap) -> Result<String, String> {
    let target = validation::required_str(params, "target")?;
    validation::validate_target(target)?;

    let timing = validation::optional_str(params, "timing")?.unwrap_or(DEFAULT_TIMING);
    if !ALLOWED_TIMING.contains(&timing) {
        return Err(format!("unsupported nmap timing template: {timing}"));
    }

    let ports = validation::optional_str(params, "ports")?.unwrap_or(DEFAULT_PORTS);
    let port_flag = port_flag(ports)?;

    let mut command = format!("nmap -{timing} {port_flag}");
    if let Some(extra_args) = validation::optional_str_list(params, "additional_args")? {
        for arg in extra_args {
            command.push(' ');
            command.push_str(arg);
        }
    }
    command.push(' ');
    command.push_str(target);
    Ok(command)
}

/// Translates the `ports` parameter into the nmap flag that implements it.
fn port_flag(ports: &str) -> Result<String, String> {
    match ports {
        "top-100" => Ok("--top-ports 100".to_string()),
        "top-1000" => Ok("--top-ports 1000".to_string()),
        "all" => Ok("-p-".to_string()),
        explicit if is_port_list(explicit) => Ok(format!("-p {explicit}")),
        other => Err(format!("unsupported nmap ports value: {other}")),
    }
}

/// Returns true if `value` is a comma/hyphen/digit port-list string.
fn is_port_list(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit() || c == ',' || c == '-')
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use scanforge_core::param_map;

    use super::*;

    #[tokio::test]
    async fn injection_attempt_is_rejected_without_launching_a_process() {
        let adapter = NmapAdapter::new(CommandExecutor::new());
        let params = param_map([("target", "127.0.0.1; rm -rf /")]);
        let result = adapter.run(&params).await;
        assert!(!result.success);
        assert_eq!(result.stderr, "Invalid target format");
    }

    #[test]
    fn default_ports_and_timing_build_top_1000_scan() {
        let params = param_map([("target", "127.0.0.1")]);
        let command = build_command(&params).expect("valid params");
        assert_eq!(command, "nmap -T3 --top-ports 1000 127.0.0.1");
    }

    #[test]
    fn explicit_port_list_is_accepted() {
        let params = param_map([("target", "127.0.0.1"), ("ports", "80,443,8080")]);
        let command = build_command(&params).expect("valid params");
        assert_eq!(command, "nmap -T3 -p 80,443,8080 127.0.0.1");
    }

    #[test]
    fn unsupported_timing_template_is_rejected() {
        let params = param_map([("target", "127.0.0.1"), ("timing", "T5")]);
        assert!(build_command(&params).is_err());
    }

    #[test]
    fn malformed_ports_value_is_rejected() {
        let params = param_map([("target", "127.0.0.1"), ("ports", "top-100; rm")]);
        assert!(build_command(&params).is_err());
    }
}
