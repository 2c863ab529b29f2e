//! Per-server log files.
//!
//! Each server writes stdout and stderr to its own append-mode file pair
//! under the logs directory. An orchestrated stop copies the pair into a
//! timestamped backup directory and truncates the live files.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use agentctl_core::ResolvedPaths;
use chrono::Local;
use tracing::debug;

/// Open stdout/stderr sinks for one server.
#[derive(Debug)]
pub struct LogSinks {
    pub stdout: File,
    pub stderr: File,
    pub stdout_path: PathBuf,
    pub stderr_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct LogManager {
    logs_dir: PathBuf,
    backup_dir: PathBuf,
}

impl LogManager {
    pub const fn new(logs_dir: PathBuf, backup_dir: PathBuf) -> Self {
        Self {
            logs_dir,
            backup_dir,
        }
    }

    pub fn from_paths(paths: &ResolvedPaths) -> Self {
        Self::new(paths.logs_dir.clone(), paths.backup_dir.clone())
    }

    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    /// `(<name>.out.log, <name>.err.log)`. Unsafe characters in the name
    /// are replaced by `_` and a hash of the original name is appended, so
    /// `a/b` and `a_b` never share files.
    pub fn paths_for(&self, name: &str) -> (PathBuf, PathBuf) {
        let stem = file_stem(name);
        (
            self.logs_dir.join(format!("{stem}.out.log")),
            self.logs_dir.join(format!("{stem}.err.log")),
        )
    }

    /// Open (creating if needed) the append-mode sink pair for `name`.
    pub fn sinks_for(&self, name: &str) -> io::Result<LogSinks> {
        fs::create_dir_all(&self.logs_dir)?;
        let (stdout_path, stderr_path) = self.paths_for(name);

        Ok(LogSinks {
            stdout: open_append(&stdout_path)?,
            stderr: open_append(&stderr_path)?,
            stdout_path,
            stderr_path,
        })
    }

    /// Archive under a fresh `<YYYYmmdd-HHMMSS>` directory, then truncate.
    pub fn archive_and_clear(&self, name: &str) -> io::Result<Option<PathBuf>> {
        self.archive_and_clear_at(name, &backup_stamp())
    }

    /// Copy the live files into `backup/<stamp>/`, then truncate them.
    ///
    /// Missing or empty files are skipped. Returns the backup directory
    /// when at least one file was copied.
    pub fn archive_and_clear_at(&self, name: &str, stamp: &str) -> io::Result<Option<PathBuf>> {
        let target = self.backup_dir.join(stamp);
        let (stdout_path, stderr_path) = self.paths_for(name);
        let mut archived = false;

        for live in [stdout_path, stderr_path] {
            let len = match fs::metadata(&live) {
                Ok(meta) => meta.len(),
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e),
            };
            if len == 0 {
                continue;
            }

            fs::create_dir_all(&target)?;
            if let Some(file_name) = live.file_name() {
                fs::copy(&live, target.join(file_name))?;
            }
            OpenOptions::new().write(true).truncate(true).open(&live)?;
            archived = true;
        }

        if archived {
            debug!(server = %name, backup = %target.display(), "Logs archived");
        }
        Ok(archived.then_some(target))
    }
}

/// Timestamp used for backup directory names.
pub fn backup_stamp() -> String {
    Local::now().format("%Y%m%d-%H%M%S").to_string()
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if stem.is_empty() || stem.chars().all(|c| c == '.') {
        format!("_-{:08x}", name_hash(name))
    } else if stem == name {
        stem
    } else {
        format!("{stem}-{:08x}", name_hash(name))
    }
}

/// 32-bit FNV-1a; stable across builds, unlike `DefaultHasher`.
fn name_hash(name: &str) -> u32 {
    name.bytes().fold(0x811c_9dc5_u32, |hash, byte| {
        (hash ^ u32::from(byte)).wrapping_mul(0x0100_0193)
    })
}
