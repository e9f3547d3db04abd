// crates/scanforge-adapters/src/nuclei.rs
// ============================================================================
// Module: ScanForge nuclei Adapter
// Description: Validation and command construction for the nuclei
// vulnerability scanner, scheduled as a web-detection follow-up task.
// Purpose: Translate a task's params into a safe nuclei invocation.
// Dependencies: scanforge-core, scanforge-executor
// ============================================================================

//! ## Overview
//! `nuclei` is scheduled by `nmap_web_detection` (see
//! `scanforge-core::scheduler::followup`). Its `tags` parameter, if
//! present, must be a list of tokens over `[A-Za-z0-9_-]`; the adapter
//! always appends a rate limit of 50 requests/second regardless of task
//! input, matching the distilled specification's fixed-rate policy.

use async_trait::async_trait;
use scanforge_core::ParamMap;
use scanforge_core::TaskResult;
use scanforge_core::ToolAdapter;
use scanforge_executor::CommandExecutor;

use crate::validation;

/// Timeout for a nuclei invocation (distilled spec §4.1).
const TIMEOUT_SECS: u64 = 600;

/// Requests-per-second ceiling appended to every invocation.
const RATE_LIMIT: u32 = 50;

/// nuclei vulnerability scanner adapter.
pub struct NucleiAdapter {
    /// Subprocess runner this adapter dispatches its constructed command to.
    executor: CommandExecutor,
}

impl NucleiAdapter {
    /// Builds a nuclei adapter over the given executor.
    #[must_use]
    pub const fn new(executor: CommandExecutor) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl ToolAdapter for NucleiAdapter {
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

/// Validates `params` and constructs the nuclei command line.
fn build_command(params: &ParamMap) -> Result<String, String> {
    let target = validation::required_str(params, "target")?;
    validation::validate_target(target)?;

    let mut command = format!("nuclei -u {target} -rl {RATE_LIMIT}");
    if let Some(tags) = validation::optional_str_list(params, "tags")? {
        for tag in tags {
            if !validation::is_token_charset(tag) {
                return Err(format!("nuclei tag has an invalid character: {tag}"));
            }
        }
        command.push_str(" -tags ");
        command.push_str(&tags.join(","));
    }
    Ok(command)
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use scanforge_core::ParamValue;
    use scanforge_core::param_map;

    use super::*;

    #[tokio::test]
    async fn injection_attempt_is_rejected_without_launching_a_process() {
        let adapter = NucleiAdapter::new(CommandExecutor::new());
        let params = param_map([("target", "http://example.com; rm -rf /")]);
        let result = adapter.run(&params).await;
        assert!(!result.success);
    }

    #[test]
    fn rate_limit_is_always_appended() {
        let params = param_map([("target", "http://example.com")]);
        let command = build_command(&params).expect("valid params");
        assert!(command.contains("-rl 50"));
    }

    #[test]
    fn tags_outside_token_charset_are_rejected() {
        let params = param_map([
            ("target", ParamValue::from("http://example.com")),
            ("tags", ParamValue::from(vec!["cve 2021".to_string()])),
        ]);
        assert!(build_command(&params).is_err());
    }

    #[test]
    fn valid_tags_are_joined_with_commas() {
        let params = param_map([
            ("target", ParamValue::from("http://example.com")),
            ("tags", ParamValue::from(vec!["cve-2021".to_string(), "rce".to_string()])),
        ]);
        let command = build_command(&params).expect("valid params");
        assert!(command.contains("-tags cve-2021,rce"));
    }
}
