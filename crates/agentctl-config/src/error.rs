//! Config-related error and warning types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Hard failures: the config file could not be read or written at all.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Recoverable conditions surfaced alongside a loaded document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigWarning {
    /// The file exists but is empty or not a valid document. An empty
    /// document was used instead; the original bytes were copied to
    /// `backup` when that was possible.
    #[error("Config {path} is corrupt ({reason}); continuing with an empty document")]
    ConfigCorrupt {
        path: PathBuf,
        reason: String,
        backup: Option<PathBuf>,
    },
}
