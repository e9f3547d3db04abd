// crates/scanforge-adapters/src/gobuster.rs
// ============================================================================
// Module: ScanForge gobuster Adapter
// Description: Validation and command construction for the gobuster
// directory/DNS/vhost brute-forcer, scheduled as a web-detection follow-up.
// Purpose: Translate a task's params into a safe gobuster invocation.
// Dependencies: scanforge-core, scanforge-executor
// ============================================================================

//! ## Overview
//! `gobuster` is scheduled alongside `nuclei` by `nmap_web_detection`. Its
//! `mode` parameter is restricted to a closed set; its `wordlist`
//! parameter is a filesystem path and is denylist-checked like any other
//! interpolated string, not validated for existence (the subprocess will
//! report a missing file itself).

use async_trait::async_trait;
use scanforge_core::ParamMap;
use scanforge_core::TaskResult;
use scanforge_core::ToolAdapter;
use scanforge_executor::CommandExecutor;

use crate::validation;

/// Timeout for a gobuster invocation (distilled spec §4.1).
const TIMEOUT_SECS: u64 = 600;

/// Modes gobuster accepts from a task; anything else is rejected.
const ALLOWED_MODES: [&str; 4] = ["dir", "dns", "fuzz", "vhost"];

/// Default mode when the task does not specify one.
const DEFAULT_MODE: &str = "dir";

/// Default wordlist when the task does not specify one.
const DEFAULT_WORDLIST: &str = "/usr/share/wordlists/dirb/common.txt";

/// gobuster directory/DNS/vhost brute-forcer adapter.
pub struct GobusterAdapter {
    /// Subprocess runner this adapter dispatches its constructed command to.
    executor: CommandExecutor,
}

impl GobusterAdapter {
    /// Builds a gobuster adapter over the given executor.
    #[must_use]
    pub const fn new(executor: CommandExecutor) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl ToolAdapter for GobusterAdapter {
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

/// Validates `params` and constructs the gobuster command line.
fn build_command(params: &ParamMap) -> Result<String, String> {
    let url = validation::required_str(params, "url")?;
    validation::validate_target(url)?;

    let mode = validation::optional_str(params, "mode")?.unwrap_or(DEFAULT_MODE);
    if !ALLOWED_MODES.contains(&mode) {
        return Err(format!("unsupported gobuster mode: {mode}"));
    }

    let wordlist = validation::optional_str(params, "wordlist")?.unwrap_or(DEFAULT_WORDLIST);

    Ok(format!("gobuster {mode} -u {url} -w {wordlist}"))
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
        let adapter = GobusterAdapter::new(CommandExecutor::new());
        let params = param_map([("url", "http://example.com; rm -rf /")]);
        let result = adapter.run(&params).await;
        assert!(!result.success);
    }

    #[test]
    fn default_mode_and_wordlist_build_dir_scan() {
        let params = param_map([("url", "http://example.com")]);
        let command = build_command(&params).expect("valid params");
        assert_eq!(command, "gobuster dir -u http://example.com -w /usr/share/wordlists/dirb/common.txt");
    }

    #[test]
    fn unsupported_mode_is_rejected() {
        let params = param_map([("url", "http://example.com"), ("mode", "bruteforce")]);
        assert!(build_command(&params).is_err());
    }

    #[test]
    fn wordlist_denylist_is_enforced() {
        let params = param_map([("url", "http://example.com"), ("wordlist", "/tmp/list.txt; rm -rf /")]);
        assert!(build_command(&params).is_err());
    }
}
