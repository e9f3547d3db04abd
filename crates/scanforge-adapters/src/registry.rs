// crates/scanforge-adapters/src/registry.rs
// ============================================================================
// Module: ScanForge Adapter Registry
// Description: Builds the `tool_name -> ToolAdapter` map the scheduler
// dispatches against.
// Purpose: Centralize the list of tools ScanForge knows how to run.
// Dependencies: scanforge-core, scanforge-executor
// ============================================================================

//! ## Overview
//! The scheduler treats an unrecognized `tool_name` as `ToolNotFound`
//! (distilled spec §4.6). This module is the single place that decides
//! which tool names ScanForge recognizes, so the CLI and any test harness
//! build the same registry the production scheduler does.

use std::collections::HashMap;
use std::sync::Arc;

use scanforge_core::ToolAdapter;
use scanforge_executor::CommandExecutor;

use crate::gobuster::GobusterAdapter;
use crate::hydra::HydraAdapter;
use crate::metasploit::MetasploitAdapter;
use crate::nmap::NmapAdapter;
use crate::nuclei::NucleiAdapter;
use crate::sqlmap::SqlmapAdapter;

/// Builds the full registry of tool adapters, each sharing `executor`.
#[must_use]
pub fn build_adapter_registry(executor: CommandExecutor) -> HashMap<String, Arc<dyn ToolAdapter>> {
    let mut registry: HashMap<String, Arc<dyn ToolAdapter>> = HashMap::new();
    registry.insert("nmap".to_string(), Arc::new(NmapAdapter::new(executor)));
    registry.insert("nuclei".to_string(), Arc::new(NucleiAdapter::new(executor)));
    registry.insert("gobuster".to_string(), Arc::new(GobusterAdapter::new(executor)));
    registry.insert("sqlmap".to_string(), Arc::new(SqlmapAdapter::new(executor)));
    registry.insert("hydra".to_string(), Arc::new(HydraAdapter::new(executor)));
    registry.insert("metasploit".to_string(), Arc::new(MetasploitAdapter::new(executor)));
    registry
}
