//! Runtime error types.

use std::io;
use std::path::PathBuf;

use agentctl_core::DefinitionError;
use thiserror::Error;

use crate::resolve::ResolveError;

/// The manifest file could not be read or written.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write manifest {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize manifest: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors raised while starting or stopping one server.
///
/// Everything except [`SupervisorError::Manifest`] is reported per server
/// and does not abort the remaining servers.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("{name}: {source}")]
    Definition {
        name: String,
        #[source]
        source: DefinitionError,
    },

    #[error("Failed to open log files for {name}: {source}")]
    Logs {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to spawn {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("{name} exited during startup ({status})")]
    EarlyExit { name: String, status: String },

    #[error("Failed to stop PID {pid}: {source}")]
    Kill {
        pid: u32,
        #[source]
        source: io::Error,
    },
}

impl SupervisorError {
    /// Whether this error must abort the whole run instead of being
    /// reported against a single server.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Manifest(_))
    }
}
