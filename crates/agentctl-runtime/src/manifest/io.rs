//! Atomic manifest file I/O.
//!
//! Format: a JSON array of `{name, pid, startedAt, pattern?}` objects.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use agentctl_core::{ManifestEntry, ProcessManifest, write_atomic};
use tracing::warn;

use crate::error::ManifestError;

/// Manifest file at a fixed path.
#[derive(Debug)]
pub struct ManifestStore {
    path: PathBuf,
    // Serializes load-modify-save cycles from concurrent per-server tasks
    lock: Mutex<()>,
}

impl ManifestStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the manifest. A missing file is empty; an unparseable one is
    /// logged and treated as empty, since the pattern sweep still finds
    /// the processes it listed.
    pub fn load(&self) -> Result<ProcessManifest, ManifestError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(ProcessManifest::new()),
            Err(source) => {
                return Err(ManifestError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        if content.trim().is_empty() {
            return Ok(ProcessManifest::new());
        }

        match serde_json::from_str(&content) {
            Ok(manifest) => Ok(manifest),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Manifest unreadable, treating as empty"
                );
                Ok(ProcessManifest::new())
            }
        }
    }

    /// Load, apply `f`, and write back atomically when `f` changed anything.
    pub fn update<R>(
        &self,
        f: impl FnOnce(&mut ProcessManifest) -> R,
    ) -> Result<R, ManifestError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut manifest = self.load()?;
        let before = manifest.clone();
        let result = f(&mut manifest);
        if manifest != before {
            self.save(&manifest)?;
        }
        Ok(result)
    }

    /// Record a freshly spawned process and persist immediately.
    pub fn append(&self, entry: ManifestEntry) -> Result<(), ManifestError> {
        self.update(|manifest| manifest.push(entry))
    }

    /// Drop the entry for `name`/`pid`. Returns whether one existed.
    pub fn remove(&self, name: &str, pid: u32) -> Result<bool, ManifestError> {
        self.update(|manifest| manifest.remove(name, pid))
    }

    fn save(&self, manifest: &ProcessManifest) -> Result<(), ManifestError> {
        let mut json = serde_json::to_string_pretty(manifest)?;
        json.push('\n');
        write_atomic(&self.path, json.as_bytes()).map_err(|source| ManifestError::Write {
            path: self.path.clone(),
            source,
        })
    }
}
