// crates/scanforge-config/src/config.rs
// ============================================================================
// Module: ScanForge Configuration
// Description: Configuration loading and validation for ScanForge.
// Purpose: Provide fail-closed YAML config parsing with built-in defaults.
// Dependencies: serde, serde_yaml, thiserror
// ============================================================================

//! ## Overview
//! `Config::load` mirrors the original prototype's `load_config`: a
//! missing file returns [`Config::default`] (ported unchanged from
//! `MCPConfig::default()` — `log_level = "info"`, `server.host =
//! "127.0.0.1"`, `server.port = 8000`), while a present-but-malformed
//! file fails closed with a typed [`ConfigError`] rather than falling
//! back silently.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Maximum configuration file size accepted before parsing.
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Default log level, ported from the prototype's `MCPConfig.log_level`.
fn default_log_level() -> String {
    "info".to_string()
}

/// Default server bind host, ported from the prototype's `ServerConfig.host`.
fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

/// Default server bind port, ported from the prototype's `ServerConfig.port`.
const fn default_server_port() -> u16 {
    8000
}

/// Default `SQLite` database path.
fn default_database_path() -> PathBuf {
    PathBuf::from("scanforge.db")
}

/// Per-tool binary path override and fixed prefix arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Path to the tool binary (e.g. a sandboxed `nmap` wrapper).
    pub path: String,
    /// Fixed arguments prepended to every invocation of this tool.
    #[serde(default)]
    pub args: Vec<String>,
}

/// Bind address for a future HTTP front end.
///
/// # Invariants
/// - Loaded and validated even though the CLI does not currently serve
///   HTTP, because the distilled specification names this surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind host.
    #[serde(default = "default_server_host")]
    pub host: String,
    /// Bind port.
    #[serde(default = "default_server_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_server_host(), port: default_server_port() }
    }
}

/// `SQLite` database connection settings.
///
/// Replaces the original prototype's MySQL pool configuration; see
/// `DESIGN.md`'s resolution of this open question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the `SQLite` database file.
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: default_database_path() }
    }
}

/// Top-level ScanForge configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Floor log level; CLI `-v` flags may only raise it further.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Per-tool binary path overrides and fixed prefix args.
    #[serde(default)]
    pub tools: HashMap<String, ToolConfig>,
    /// Bind address for a future HTTP front end.
    #[serde(default)]
    pub server: ServerConfig,
    /// `SQLite` database connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            tools: HashMap::new(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
        }
    }
}

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading the configuration file.
    #[error("config io error: {0}")]
    Io(String),
    /// YAML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl Config {
    /// Loads configuration from `path`. A missing file returns
    /// [`Config::default`]; a present file that fails to parse or
    /// validate returns [`ConfigError`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `path` exists but cannot be read,
    /// parsed, or fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let metadata = fs::metadata(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid(format!(
                "config file exceeds size limit: {} bytes (max {MAX_CONFIG_FILE_SIZE})",
                metadata.len()
            )));
        }

        let text = fs::read_to_string(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        let config: Self = serde_yaml::from_str(&text).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates cross-field invariants not expressible through serde defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a tool path is empty.
    fn validate(&self) -> Result<(), ConfigError> {
        for (name, tool) in &self.tools {
            if tool.path.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("tool {name} has an empty path")));
            }
        }
        Ok(())
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

    use std::io::Write as _;

    use super::*;

    #[test]
    fn missing_file_returns_defaults() {
        let config = Config::load(Path::new("/nonexistent/scanforge.yaml")).expect("load succeeds");
        assert_eq!(config, Config::default());
        assert_eq!(config.log_level, "info");
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn valid_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(
            file,
            "log_level: debug\nserver:\n  host: 0.0.0.0\n  port: 9000\ntools:\n  nmap:\n    path: /usr/bin/nmap\n    args: [\"-oX\", \"-\"]\n"
        )
        .expect("write config");

        let config = Config::load(file.path()).expect("load succeeds");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.tools["nmap"].path, "/usr/bin/nmap");
    }

    #[test]
    fn malformed_yaml_is_rejected_without_panicking() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "log_level: [this is not a mapping").expect("write config");

        let result = Config::load(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn empty_tool_path_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "tools:\n  nmap:\n    path: \"\"\n").expect("write config");

        let result = Config::load(file.path());
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
