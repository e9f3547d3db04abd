// crates/scanforge-adapters/src/validation.rs
// ============================================================================
// Module: ScanForge Adapter Validation Helpers
// Description: Shared denylist, parameter extraction, and rejection
// helpers used by every tool adapter.
// Purpose: Keep the shell-injection denylist and parameter plumbing in one
// place so every adapter enforces it identically.
// Dependencies: scanforge-core
// ============================================================================

//! ## Overview
//! Every adapter validates its parameters *before* constructing a command
//! string, per the distilled specification's "input validation is
//! mandatory and comes before any command construction." A rejection
//! short-circuits into a failed [`TaskResult`] with the reason carried in
//! `stderr`, which the scheduler promotes to `Task::error` — no process is
//! ever launched.

use scanforge_core::ParamMap;
use scanforge_core::TaskResult;

/// Shell metacharacters that must never appear in a string interpolated
/// into a command line (distilled spec §4.1's "conservative denylist").
const SHELL_METACHARACTERS: [char; 3] = [';', '|', '&'];

/// Returns true if `value` contains any denylisted shell metacharacter.
#[must_use]
pub fn contains_shell_metacharacters(value: &str) -> bool {
    value.chars().any(|c| SHELL_METACHARACTERS.contains(&c))
}

/// Builds a rejected [`TaskResult`] carrying `reason` in `stderr`, where
/// the scheduler will find it and populate `Task::error`. No process is
/// launched on this path.
#[must_use]
pub fn reject(reason: impl Into<String>) -> TaskResult {
    TaskResult {
        success: false,
        return_code: -1,
        stdout: String::new(),
        stderr: reason.into(),
        timed_out: false,
        extra: serde_json::Map::new(),
    }
}

/// Extracts a required string parameter, denylist-checking it.
///
/// # Errors
///
/// Returns a human-readable reason when the key is missing, not a
/// string, or fails the shell-metacharacter denylist.
pub fn required_str<'a>(params: &'a ParamMap, key: &str) -> Result<&'a str, String> {
    let value = params.get(key).and_then(|v| v.as_str()).ok_or_else(|| format!("missing required parameter: {key}"))?;
    if contains_shell_metacharacters(value) {
        return Err(format!("parameter {key} contains a disallowed shell metacharacter"));
    }
    Ok(value)
}

/// Extracts an optional string parameter, denylist-checking it when
/// present.
///
/// # Errors
///
/// Returns a human-readable reason when the key is present but not a
/// string, or fails the shell-metacharacter denylist.
pub fn optional_str<'a>(params: &'a ParamMap, key: &str) -> Result<Option<&'a str>, String> {
    let Some(value) = params.get(key) else {
        return Ok(None);
    };
    let value = value.as_str().ok_or_else(|| format!("parameter {key} must be a string"))?;
    if contains_shell_metacharacters(value) {
        return Err(format!("parameter {key} contains a disallowed shell metacharacter"));
    }
    Ok(Some(value))
}

/// Extracts an optional string-list parameter, denylist-checking every
/// entry when present.
///
/// # Errors
///
/// Returns a human-readable reason when the key is present but not a
/// string list, or any entry fails the shell-metacharacter denylist.
pub fn optional_str_list<'a>(params: &'a ParamMap, key: &str) -> Result<Option<&'a [String]>, String> {
    let Some(value) = params.get(key) else {
        return Ok(None);
    };
    let values = value.as_str_list().ok_or_else(|| format!("parameter {key} must be a list of strings"))?;
    for entry in values {
        if contains_shell_metacharacters(entry) {
            return Err(format!("parameter {key} contains a disallowed shell metacharacter"));
        }
    }
    Ok(Some(values))
}

/// Extracts an optional integer parameter.
///
/// # Errors
///
/// Returns a human-readable reason when the key is present but not an
/// integer.
pub fn optional_int(params: &ParamMap, key: &str) -> Result<Option<i64>, String> {
    let Some(value) = params.get(key) else {
        return Ok(None);
    };
    value.as_int().map(Some).ok_or_else(|| format!("parameter {key} must be an integer"))
}

/// Extracts an optional boolean parameter.
///
/// # Errors
///
/// Returns a human-readable reason when the key is present but not a
/// boolean.
pub fn optional_bool(params: &ParamMap, key: &str) -> Result<Option<bool>, String> {
    let Some(value) = params.get(key) else {
        return Ok(None);
    };
    value.as_bool().map(Some).ok_or_else(|| format!("parameter {key} must be a boolean"))
}

/// Validates a target string (IP, hostname, or URL): non-empty and free
/// of shell metacharacters.
///
/// # Errors
///
/// Returns `Err("Invalid target format")` when `target` is empty or
/// contains a denylisted shell metacharacter.
pub fn validate_target(target: &str) -> Result<(), String> {
    if target.trim().is_empty() || contains_shell_metacharacters(target) {
        return Err("Invalid target format".to_string());
    }
    Ok(())
}

/// Returns true if every character of `value` is alphanumeric, `_`, or
/// `-` (the charset nuclei tags are restricted to).
#[must_use]
pub fn is_token_charset(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
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
    use scanforge_core::param_map;

    #[test]
    fn denylist_catches_each_metacharacter() {
        assert!(contains_shell_metacharacters("a;b"));
        assert!(contains_shell_metacharacters("a|b"));
        assert!(contains_shell_metacharacters("a&b"));
        assert!(!contains_shell_metacharacters("a-b.c"));
    }

    #[test]
    fn validate_target_rejects_injection_attempt() {
        assert_eq!(validate_target("127.0.0.1; rm -rf /"), Err("Invalid target format".to_string()));
        assert!(validate_target("127.0.0.1").is_ok());
    }

    #[test]
    fn required_str_rejects_missing_key() {
        let params = param_map::<_, &str, &str>([]);
        assert!(required_str(&params, "target").is_err());
    }

    #[test]
    fn token_charset_rejects_non_token_characters() {
        assert!(is_token_charset("cve-2021"));
        assert!(!is_token_charset("cve 2021"));
        assert!(!is_token_charset(""));
    }
}
