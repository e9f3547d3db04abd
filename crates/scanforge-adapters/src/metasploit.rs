// crates/scanforge-adapters/src/metasploit.rs
// ============================================================================
// Module: ScanForge metasploit Adapter
// Description: Validation, resource-script generation, and command
// construction for the Metasploit console.
// Purpose: Translate an allowlisted module + options into a safe
// `msfconsole` invocation via a generated, then deleted, resource script.
// Dependencies: scanforge-core, scanforge-executor, tempfile, tracing
// ============================================================================

//! ## Overview
//! `module` must be a member of a hard-coded allowlist — strict
//! whitelist, empty by default except the documented seed
//! `exploit/windows/smb/ms17_010_eternalblue` — mirroring the original
//! prototype's `ALLOWED_MODULES`. Options are carried as `KEY=VALUE`
//! strings (the task parameter shape has no nested-map variant; see
//! `scanforge-core::core::params`) and rendered into a `.rc` resource
//! script: `use <module>`, then `set <k> <v>` per option, then
//! `exploit -z`. The script is written to a temp file, referenced via
//! `msfconsole -q -r <rc>`, and removed once the invocation completes,
//! success or failure. The path is reported in `result.extra["resource_script"]`
//! before the file is removed.

use std::io::Write as _;

use async_trait::async_trait;
use scanforge_core::ParamMap;
use scanforge_core::TaskResult;
use scanforge_core::ToolAdapter;
use scanforge_executor::CommandExecutor;
use tracing::info;
use tracing::warn;

use crate::validation;

/// Timeout for a metasploit invocation (distilled spec §4.1).
const TIMEOUT_SECS: u64 = 600;

/// Hard-coded module allowlist. Empty by default except the documented
/// seed module named in the distilled specification.
const ALLOWED_MODULES: [&str; 1] = ["exploit/windows/smb/ms17_010_eternalblue"];

/// Metasploit console adapter.
pub struct MetasploitAdapter {
    /// Subprocess runner this adapter dispatches its constructed command to.
    executor: CommandExecutor,
}

impl MetasploitAdapter {
    /// Builds a metasploit adapter over the given executor.
    #[must_use]
    pub const fn new(executor: CommandExecutor) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl ToolAdapter for MetasploitAdapter {
    async fn run(&self, params: &ParamMap) -> TaskResult {
        let (module, script) = match build_resource_script(params) {
            Ok(parts) => parts,
            Err(reason) => return validation::reject(reason),
        };

        let mut file = match tempfile::Builder::new().prefix("scanforge_msf_").suffix(".rc").tempfile() {
            Ok(file) => file,
            Err(err) => return validation::reject(format!("failed to create resource script: {err}")),
        };
        if let Err(err) = file.write_all(script.as_bytes()) {
            return validation::reject(format!("failed to write resource script: {err}"));
        }

        let path = file.path().display().to_string();
        info!(%module, resource_script = %path, "running metasploit module");

        let command = format!("msfconsole -q -r {path}");
        let mut result = self.executor.run(&command, TIMEOUT_SECS).await;
        result.extra.insert("resource_script".to_string(), serde_json::Value::String(path));

        if let Err(err) = file.close() {
            warn!(error = %err, "failed to remove metasploit resource script");
        }
        result
    }

    fn timeout_secs(&self) -> u64 {
        TIMEOUT_SECS
    }
}

/// Validates `params` against the module allowlist and renders the
/// resource-script body, or returns a rejection reason before any
/// tempfile is created.
fn build_resource_script(params: &ParamMap) -> Result<(String, String), String> {
    let module = validation::required_str(params, "module")?;
    if !ALLOWED_MODULES.contains(&module) {
        return Err(format!("module {module} is not in the allowed whitelist"));
    }

    let mut script = format!("use {module}\n");
    if let Some(options) = validation::optional_str_list(params, "options")? {
        for option in options {
            let (key, value) = option
                .split_once('=')
                .ok_or_else(|| format!("option must be KEY=VALUE: {option}"))?;
            script.push_str("set ");
            script.push_str(key);
            script.push(' ');
            script.push_str(value);
            script.push('\n');
        }
    }
    script.push_str("exploit -z\n");
    Ok((module.to_string(), script))
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
    async fn module_outside_allowlist_is_rejected_without_launching_a_process() {
        let adapter = MetasploitAdapter::new(CommandExecutor::new());
        let params = param_map([("module", "exploit/unix/ftp/vsftpd_234_backdoor")]);
        let result = adapter.run(&params).await;
        assert!(!result.success);
    }

    #[test]
    fn allowlisted_module_renders_use_and_exploit_lines() {
        let params = param_map([("module", "exploit/windows/smb/ms17_010_eternalblue")]);
        let (module, script) = build_resource_script(&params).expect("valid params");
        assert_eq!(module, "exploit/windows/smb/ms17_010_eternalblue");
        assert!(script.starts_with("use exploit/windows/smb/ms17_010_eternalblue\n"));
        assert!(script.ends_with("exploit -z\n"));
    }

    #[test]
    fn options_render_as_set_lines() {
        let params = param_map([
            ("module", "exploit/windows/smb/ms17_010_eternalblue"),
            ("options", "RHOSTS=10.0.0.1"),
        ]);
        // `options` must be a list; a bare string is rejected by the shape check.
        assert!(build_resource_script(&params).is_err());

        let params = scanforge_core::param_map::<_, &str, scanforge_core::ParamValue>([
            ("module", "exploit/windows/smb/ms17_010_eternalblue".into()),
            ("options", vec!["RHOSTS=10.0.0.1".to_string(), "LHOST=10.0.0.5".to_string()].into()),
        ]);
        let (_, script) = build_resource_script(&params).expect("valid params");
        assert!(script.contains("set RHOSTS 10.0.0.1\n"));
        assert!(script.contains("set LHOST 10.0.0.5\n"));
    }

    #[test]
    fn option_value_with_metacharacter_is_rejected() {
        let params = scanforge_core::param_map::<_, &str, scanforge_core::ParamValue>([
            ("module", "exploit/windows/smb/ms17_010_eternalblue".into()),
            ("options", vec!["RHOSTS=10.0.0.1; rm -rf /".to_string()].into()),
        ]);
        assert!(build_resource_script(&params).is_err());
    }

    #[tokio::test]
    async fn result_extra_reports_the_resource_script_path() {
        let adapter = MetasploitAdapter::new(CommandExecutor::new());
        let params = param_map([("module", "exploit/windows/smb/ms17_010_eternalblue")]);
        let result = adapter.run(&params).await;
        let path = result.extra.get("resource_script").and_then(serde_json::Value::as_str).expect("resource_script reported");
        assert!(path.ends_with(".rc"));
    }
}
