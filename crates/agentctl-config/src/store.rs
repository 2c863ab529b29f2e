//! Loading, merging and atomically saving the IDE config document.
//!
//! Saves go through [`write_atomic`], so a crash mid-write leaves the
//! previous file intact.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use agentctl_core::{ConfigDocument, ServerDefinition, write_atomic};
use chrono::Utc;
use tracing::{debug, warn};

use crate::error::{ConfigError, ConfigWarning};

/// A loaded document plus any recoverable problems found while loading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOutcome {
    pub document: ConfigDocument,
    pub warnings: Vec<ConfigWarning>,
}

/// Reads and writes the config file at a fixed path.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted document.
    ///
    /// A missing file yields an empty document with no warnings. An empty,
    /// non-UTF-8 or unparseable file yields an empty document and a
    /// [`ConfigWarning::ConfigCorrupt`]; the corrupt bytes are copied aside
    /// first so the next save cannot destroy them. Only I/O failures other
    /// than "not found" are errors.
    pub fn load(&self) -> Result<LoadOutcome, ConfigError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Config file absent, starting empty");
                return Ok(LoadOutcome::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        match parse_document(&bytes) {
            Ok(document) => Ok(LoadOutcome {
                document,
                warnings: Vec::new(),
            }),
            Err(reason) => {
                let backup = self.preserve_corrupt(&bytes);
                warn!(
                    path = %self.path.display(),
                    reason = %reason,
                    "Config file is corrupt, using an empty document"
                );
                Ok(LoadOutcome {
                    document: ConfigDocument::new(),
                    warnings: vec![ConfigWarning::ConfigCorrupt {
                        path: self.path.clone(),
                        reason,
                        backup,
                    }],
                })
            }
        }
    }

    /// Merge `incoming` definitions into `existing`.
    ///
    /// Absent names are inserted. Present names get only their managed
    /// fields (`command`, `args`, `env`, `type`) overwritten; every other
    /// stored key survives. Names not in `incoming` are untouched. Merging
    /// the same set twice gives the same document as merging it once.
    pub fn merge(
        mut existing: ConfigDocument,
        incoming: &BTreeMap<String, ServerDefinition>,
    ) -> ConfigDocument {
        for (name, definition) in incoming {
            if *name == definition.name {
                existing.upsert(definition);
            } else {
                let mut renamed = definition.clone();
                renamed.name.clone_from(name);
                existing.upsert(&renamed);
            }
        }
        existing
    }

    /// Serialize deterministically and replace the file atomically.
    pub fn save(&self, document: &ConfigDocument) -> Result<(), ConfigError> {
        let json = document.to_pretty_json()?;
        write_atomic(&self.path, json.as_bytes()).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), "Config saved");
        Ok(())
    }

    /// Copy corrupt bytes verbatim to `<file>.corrupt-<timestamp>`; best
    /// effort.
    fn preserve_corrupt(&self, bytes: &[u8]) -> Option<PathBuf> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return None;
        }

        let file_name = self.path.file_name()?.to_string_lossy();
        let stamp = Utc::now().format("%Y%m%d-%H%M%S");
        let backup = self.path.with_file_name(format!("{file_name}.corrupt-{stamp}"));

        match fs::write(&backup, bytes) {
            Ok(()) => Some(backup),
            Err(e) => {
                warn!(path = %backup.display(), error = %e, "Could not preserve corrupt config");
                None
            }
        }
    }
}

fn parse_document(bytes: &[u8]) -> Result<ConfigDocument, String> {
    let content =
        std::str::from_utf8(bytes).map_err(|e| format!("file is not valid UTF-8: {e}"))?;
    if content.trim().is_empty() {
        return Err("file is empty".to_string());
    }

    let value: serde_json::Value = serde_json::from_str(content).map_err(|e| e.to_string())?;
    ConfigDocument::from_value(value).map_err(|e| e.to_string())
}
