// crates/scanforge-adapters/src/hydra.rs
// ============================================================================
// Module: ScanForge hydra Adapter
// Description: Validation and command construction for the hydra
// credential-attack tool.
// Purpose: Translate a task's params into a safe hydra invocation.
// Dependencies: scanforge-core, scanforge-executor
// ============================================================================

//! ## Overview
//! hydra requires a user identifier (`username` xor `user_list`) and a
//! password identifier (`password` xor `pass_list`), mirroring the
//! original prototype's `run_hydra`. Parallelism is always constrained to
//! 4 (`-t 4`), regardless of task input.

use async_trait::async_trait;
use scanforge_core::ParamMap;
use scanforge_core::TaskResult;
use scanforge_core::ToolAdapter;
use scanforge_executor::CommandExecutor;

use crate::validation;

/// Timeout for a hydra invocation (distilled spec §4.1).
const TIMEOUT_SECS: u64 = 600;

/// Parallelism hydra is always constrained to, regardless of task input.
const PARALLELISM: u32 = 4;

/// hydra credential-attack adapter.
pub struct HydraAdapter {
    /// Subprocess runner this adapter dispatches its constructed command to.
    executor: CommandExecutor,
}

impl HydraAdapter {
    /// Builds a hydra adapter over the given executor.
    #[must_use]
    pub const fn new(executor: CommandExecutor) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl ToolAdapter for HydraAdapter {
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

/// Validates `params` and constructs the hydra command line.
fn build_command(params: &ParamMap) -> Result<String, String> {
    let target = validation::required_str(params, "target")?;
    validation::validate_target(target)?;
    let service = validation::required_str(params, "service")?;

    let username = validation::optional_str(params, "username")?;
    let user_list = validation::optional_str(params, "user_list")?;
    let user_flag = match (username, user_list) {
        (Some(user), None) => format!("-l {user}"),
        (None, Some(path)) => format!("-L {path}"),
        (None, None) => return Err("hydra requires username or user_list".to_string()),
        (Some(_), Some(_)) => return Err("hydra accepts only one of username or user_list".to_string()),
    };

    let password = validation::optional_str(params, "password")?;
    let pass_list = validation::optional_str(params, "pass_list")?;
    let pass_flag = match (password, pass_list) {
        (Some(pw), None) => format!("-p {pw}"),
        (None, Some(path)) => format!("-P {path}"),
        (None, None) => return Err("hydra requires password or pass_list".to_string()),
        (Some(_), Some(_)) => return Err("hydra accepts only one of password or pass_list".to_string()),
    };

    Ok(format!("hydra -t {PARALLELISM} {user_flag} {pass_flag} {target} {service}"))
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
        let adapter = HydraAdapter::new(CommandExecutor::new());
        let params = param_map([
            ("target", "10.0.0.1; rm -rf /"),
            ("service", "ssh"),
            ("username", "admin"),
            ("password", "hunter2"),
        ]);
        let result = adapter.run(&params).await;
        assert!(!result.success);
    }

    #[test]
    fn single_credentials_build_expected_command() {
        let params = param_map([
            ("target", "10.0.0.1"),
            ("service", "ssh"),
            ("username", "admin"),
            ("password", "hunter2"),
        ]);
        let command = build_command(&params).expect("valid params");
        assert_eq!(command, "hydra -t 4 -l admin -p hunter2 10.0.0.1 ssh");
    }

    #[test]
    fn missing_user_identifier_is_rejected() {
        let params = param_map([("target", "10.0.0.1"), ("service", "ssh"), ("password", "hunter2")]);
        assert!(build_command(&params).is_err());
    }

    #[test]
    fn list_based_credentials_use_capital_flags() {
        let params = param_map([
            ("target", "10.0.0.1"),
            ("service", "ssh"),
            ("user_list", "/wordlists/users.txt"),
            ("pass_list", "/wordlists/passwords.txt"),
        ]);
        let command = build_command(&params).expect("valid params");
        assert_eq!(command, "hydra -t 4 -L /wordlists/users.txt -P /wordlists/passwords.txt 10.0.0.1 ssh");
    }
}
