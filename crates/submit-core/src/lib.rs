//! Submit Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Network/SSH
//! - Process spawning
//! - Runtime specifics
//!
//! All types here represent the core business domain of submit: hosts and
//! their fleet roles, run configuration, remote command construction,
//! runbook rendering, and dispatch reports.

pub mod command;
pub mod config;
pub mod error;
pub mod host;
pub mod ids;
pub mod report;
pub mod revision;
pub mod runbook;

// Re-export commonly used types
pub use command::{remote_command, CommandLine, REMOTE_WORK_DIR};
pub use config::RunConfig;
pub use error::ConfigError;
pub use host::{resolve_hosts, Host, HostRole, HostSet, MASTER_SENTINEL};
pub use ids::DispatchId;
pub use report::{FleetReport, HostReport, HostStatus, RemoteOutput};
pub use revision::RevisionStatus;
