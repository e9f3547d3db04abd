// crates/scanforge-config/src/lib.rs
// ============================================================================
// Crate: scanforge-config
// Description: YAML configuration loading and validation for ScanForge.
// ============================================================================

//! ## Overview
//! Configuration loads from a YAML file, falling back to built-in
//! defaults (ported from the original prototype's `MCPConfig::default()`)
//! when the file is absent. A malformed file is a fail-closed
//! [`ConfigError`], never a panic (distilled spec §6.4).

pub mod config;

pub use config::Config;
pub use config::ConfigError;
pub use config::DatabaseConfig;
pub use config::ServerConfig;
pub use config::ToolConfig;
