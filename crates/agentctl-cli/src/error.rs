//! CLI-specific error types and exit code mapping.

use agentctl_config::ConfigError;
use agentctl_core::PathError;
use agentctl_runtime::SupervisorError;
use thiserror::Error;

/// Exit code when every server reached a non-error terminal state.
pub const EXIT_OK: i32 = 0;

/// Exit code when at least one server failed.
pub const EXIT_FAILED: i32 = 1;

/// CLI-specific error type.
#[derive(Debug, Clone, Error)]
pub enum CliError {
    /// Argument parsing error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// IO error (file not found, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// Config file or path resolution error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Process supervision error that aborted the run.
    #[error("Process error: {0}")]
    Process(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow Unix conventions:
    /// - 0: Success
    /// - 1: At least one server failed
    /// - 2: Misuse of shell command (invalid arguments)
    /// - 64-78: Reserved for specific error categories (see sysexits.h)
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Arguments(_) => 2, // EX_USAGE
            Self::Io(_) => 74,       // EX_IOERR
            Self::Config(_) => 78,   // EX_CONFIG
            Self::Process(_) => 71,  // EX_OSERR
        }
    }

    /// Classify an error that reached the top level.
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        if let Some(e) = err.downcast_ref::<Self>() {
            return e.clone();
        }
        if let Some(e) = err.downcast_ref::<ConfigError>() {
            return match e {
                ConfigError::Read { .. } | ConfigError::Write { .. } => Self::Io(e.to_string()),
                ConfigError::Serialize(_) => Self::Config(e.to_string()),
            };
        }
        if let Some(e) = err.downcast_ref::<PathError>() {
            return Self::Config(e.to_string());
        }
        if let Some(e) = err.downcast_ref::<SupervisorError>() {
            return match e {
                SupervisorError::Manifest(_) => Self::Io(e.to_string()),
                _ => Self::Process(e.to_string()),
            };
        }
        if let Some(e) = err.downcast_ref::<std::io::Error>() {
            return Self::Io(e.to_string());
        }
        Self::Process(format!("{err:#}"))
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn config_write_failure_is_an_io_error() {
        let err = anyhow::Error::new(ConfigError::Write {
            path: PathBuf::from("/ro/mcp.json"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        });
        assert_eq!(CliError::from_anyhow(&err).exit_code(), 74);
    }

    #[test]
    fn path_errors_map_to_config() {
        let err = anyhow::Error::new(PathError::NoDataDir);
        assert_eq!(CliError::from_anyhow(&err).exit_code(), 78);
    }

    #[test]
    fn cli_errors_keep_their_category() {
        let err = anyhow::Error::new(CliError::Arguments("unknown server".into()));
        let mapped = CliError::from_anyhow(&err);
        assert_eq!(mapped.exit_code(), 2);
        assert_eq!(mapped.to_string(), "Invalid arguments: unknown server");
    }
}
