//! All resolved paths captured in a single struct.
//!
//! Used by the CLI composition root and by `agentctl paths`.

use std::fs;
use std::path::{Path, PathBuf};

use super::error::PathError;
use super::platform::{config_path, data_root, normalize_user_path};
use crate::environment::Environment;

/// Manifest file name, stored beside the server logs.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Every location agentctl reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    /// The IDE's MCP configuration file.
    pub config_path: PathBuf,
    /// Root directory for agentctl data.
    pub data_root: PathBuf,
    /// Per-server stdout/stderr log files.
    pub logs_dir: PathBuf,
    /// Process manifest (JSON array of `{name, pid, startedAt}`).
    pub manifest_path: PathBuf,
    /// Timestamped log archives are created below this directory.
    pub backup_dir: PathBuf,
}

impl ResolvedPaths {
    /// Resolve all paths from the environment.
    pub fn resolve(env: &Environment) -> Result<Self, PathError> {
        Self::resolve_with_overrides(env, None, None)
    }

    /// Resolve with explicit `--config` / `--data-dir` overrides.
    pub fn resolve_with_overrides(
        env: &Environment,
        config_override: Option<&str>,
        data_dir_override: Option<&str>,
    ) -> Result<Self, PathError> {
        let config_path = match config_override {
            Some(raw) => normalize_user_path(raw, env)?,
            None => config_path(env)?,
        };
        let data_root = match data_dir_override {
            Some(raw) => normalize_user_path(raw, env)?,
            None => data_root(env)?,
        };

        Ok(Self::under(config_path, &data_root))
    }

    /// Lay out data paths below an explicit root.
    pub fn under(config_path: PathBuf, data_root: &Path) -> Self {
        let logs_dir = data_root.join("logs");
        Self {
            config_path,
            data_root: data_root.to_path_buf(),
            manifest_path: logs_dir.join(MANIFEST_FILE),
            backup_dir: logs_dir.join("backup"),
            logs_dir,
        }
    }

    /// Create the logs directory if it does not exist yet.
    pub fn ensure_dirs(&self) -> Result<(), PathError> {
        fs::create_dir_all(&self.logs_dir).map_err(|e| PathError::CreateFailed {
            path: self.logs_dir.clone(),
            reason: e.to_string(),
        })
    }
}

impl std::fmt::Display for ResolvedPaths {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "config_path = {}", self.config_path.display())?;
        writeln!(f, "data_root = {}", self.data_root.display())?;
        writeln!(f, "logs_dir = {}", self.logs_dir.display())?;
        writeln!(f, "manifest_path = {}", self.manifest_path.display())?;
        write!(f, "backup_dir = {}", self.backup_dir.display())
    }
}
