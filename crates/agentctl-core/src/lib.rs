//! Core domain types and port definitions for agentctl.
//!
//! This crate has no process or network side effects. Its only filesystem
//! writes are directory creation and the atomic file replacement in
//! [`atomic`]. Runtime adapters live in `agentctl-runtime`, config
//! persistence in `agentctl-config`.
#![deny(unused_crate_dependencies)]

pub mod atomic;
pub mod domain;
pub mod environment;
pub mod paths;
pub mod ports;

// Re-export commonly used types for convenience
pub use domain::{
    ConfigDocument, DefinitionError, DocumentError, MCP_SERVERS_KEY, ManifestEntry, Outcome,
    ProbeOutcome, ProcessHandle, ProcessManifest, Report, ServerDefinition, ServerPhase,
    ServerReport, StartOutcome, StopOutcome, Transport,
};
pub use atomic::write_atomic;
pub use environment::Environment;
pub use paths::{PathError, ResolvedPaths};
pub use ports::{ProcessInfo, ProcessTable};
