//! Resolution of a server's `command` to an absolute executable path.
//!
//! Search order:
//! 1. An absolute command is checked as-is, then by basename
//! 2. A command containing a path separator is resolved against the
//!    environment's captured working directory
//! 3. Every `PATH` entry of the injected environment, in order
//!
//! Every candidate is kept so a failure can list what was tried.

use std::fmt;
use std::path::{Path, PathBuf};

use agentctl_core::Environment;

/// Result of resolving a command.
#[derive(Debug, Clone)]
pub struct ResolveResult {
    pub resolved_path: PathBuf,
    /// Every candidate checked, including the successful one.
    pub attempts: Vec<Attempt>,
}

/// One candidate path and what was found there.
#[derive(Debug, Clone)]
pub struct Attempt {
    pub candidate: PathBuf,
    pub outcome: AttemptOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Ok,
    NotFound,
    NotAFile,
    NotExecutable,
    IoError(String),
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::NotFound => write!(f, "not found"),
            Self::NotAFile => write!(f, "not a file"),
            Self::NotExecutable => write!(f, "not executable"),
            Self::IoError(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Command is empty")]
    EmptyCommand,

    #[error("Could not resolve '{command}' to an executable. Tried:\n{attempts}")]
    NotResolved { command: String, attempts: String },
}

impl ResolveError {
    fn not_resolved(command: &str, attempts: &[Attempt]) -> Self {
        let listed = attempts
            .iter()
            .map(|a| format!("  {}: {}", a.candidate.display(), a.outcome))
            .collect::<Vec<_>>()
            .join("\n");

        Self::NotResolved {
            command: command.to_string(),
            attempts: if listed.is_empty() {
                "  (PATH is empty)".to_string()
            } else {
                listed
            },
        }
    }
}

/// Filesystem checks, injectable for tests.
pub trait FsProvider {
    fn check_executable(&self, path: &Path) -> AttemptOutcome;
}

/// The real filesystem.
pub struct SystemFs;

impl FsProvider for SystemFs {
    fn check_executable(&self, path: &Path) -> AttemptOutcome {
        let metadata = match std::fs::metadata(path) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return AttemptOutcome::NotFound,
            Err(e) => return AttemptOutcome::IoError(e.to_string()),
        };

        if !metadata.is_file() {
            return AttemptOutcome::NotAFile;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if metadata.permissions().mode() & 0o111 == 0 {
                return AttemptOutcome::NotExecutable;
            }
        }

        AttemptOutcome::Ok
    }
}

/// Resolve `command` using `PATH` from `env`.
pub fn resolve_executable(command: &str, env: &Environment) -> Result<ResolveResult, ResolveError> {
    resolve_executable_with_fs(command, env, &SystemFs)
}

/// Resolve with an injected filesystem.
pub fn resolve_executable_with_fs(
    command: &str,
    env: &Environment,
    fs: &dyn FsProvider,
) -> Result<ResolveResult, ResolveError> {
    let command = command.trim();
    if command.is_empty() {
        return Err(ResolveError::EmptyCommand);
    }

    let mut attempts = Vec::new();
    let path = Path::new(command);

    if path.is_absolute() {
        if check(path.to_path_buf(), fs, &mut attempts) {
            return Ok(ResolveResult {
                resolved_path: path.to_path_buf(),
                attempts,
            });
        }
        // Absolute path failed, fall back to searching for the basename
        return match path.file_name().and_then(|n| n.to_str()) {
            Some(basename) => search_path(basename, env, fs, attempts),
            None => Err(attempts),
        }
        .map_err(|attempts| ResolveError::not_resolved(command, &attempts));
    }

    if path.components().count() > 1 {
        let candidate = env
            .cwd()
            .map_or_else(|| path.to_path_buf(), |cwd| cwd.join(path));
        if check(candidate.clone(), fs, &mut attempts) {
            return Ok(ResolveResult {
                resolved_path: candidate,
                attempts,
            });
        }
        return Err(ResolveError::not_resolved(command, &attempts));
    }

    search_path(command, env, fs, attempts)
        .map_err(|attempts| ResolveError::not_resolved(command, &attempts))
}

fn search_path(
    command: &str,
    env: &Environment,
    fs: &dyn FsProvider,
    mut attempts: Vec<Attempt>,
) -> Result<ResolveResult, Vec<Attempt>> {
    for dir in env.path_entries() {
        for candidate in candidates(&dir, command) {
            if check(candidate.clone(), fs, &mut attempts) {
                return Ok(ResolveResult {
                    resolved_path: candidate,
                    attempts,
                });
            }
        }
    }
    Err(attempts)
}

#[cfg(not(windows))]
fn candidates(dir: &Path, command: &str) -> Vec<PathBuf> {
    vec![dir.join(command)]
}

#[cfg(windows)]
fn candidates(dir: &Path, command: &str) -> Vec<PathBuf> {
    if Path::new(command).extension().is_some() {
        return vec![dir.join(command)];
    }
    ["exe", "cmd", "bat"]
        .iter()
        .map(|ext| dir.join(format!("{command}.{ext}")))
        .collect()
}

/// Record the attempt; true when the candidate is usable.
fn check(candidate: PathBuf, fs: &dyn FsProvider, attempts: &mut Vec<Attempt>) -> bool {
    let outcome = fs.check_executable(&candidate);
    let ok = outcome == AttemptOutcome::Ok;
    attempts.push(Attempt { candidate, outcome });
    ok
}
