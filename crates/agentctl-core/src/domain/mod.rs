//! Domain types shared by every agentctl crate.

mod config;
mod manifest;
mod report;
mod server;

pub use config::{ConfigDocument, DocumentError, MCP_SERVERS_KEY};
pub use manifest::{ManifestEntry, ProcessHandle, ProcessManifest};
pub use report::{
    Outcome, ProbeOutcome, Report, ServerPhase, ServerReport, StartOutcome, StopOutcome,
};
pub use server::{DefinitionError, ServerDefinition, Transport};
