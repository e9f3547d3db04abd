// crates/scanforge-adapters/src/lib.rs
// ============================================================================
// Crate: scanforge-adapters
// Description: Per-tool input validation, command construction, and the
// adapter registry the scheduler dispatches against.
// ============================================================================

//! ## Overview
//! Six adapters — nmap, nuclei, gobuster, sqlmap, hydra, metasploit —
//! each a pure function of a task's parameters to a
//! [`scanforge_core::TaskResult`] (distilled spec §4.1). Validation always
//! precedes command construction; a rejected parameter never reaches
//! [`scanforge_executor::CommandExecutor`].

pub mod gobuster;
pub mod hydra;
pub mod metasploit;
pub mod nmap;
pub mod nuclei;
pub mod registry;
pub mod sqlmap;
pub mod validation;

pub use gobuster::GobusterAdapter;
pub use hydra::HydraAdapter;
pub use metasploit::MetasploitAdapter;
pub use nmap::NmapAdapter;
pub use nuclei::NucleiAdapter;
pub use registry::build_adapter_registry;
pub use sqlmap::SqlmapAdapter;
