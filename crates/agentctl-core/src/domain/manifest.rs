//! Process manifest: the durable record of processes this tool started.
//!
//! The supervisor may exit while its children keep running, so a later
//! invocation finds them through the manifest rather than through any
//! in-memory handle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One process the supervisor believes it started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub name: String,
    pub pid: u32,
    pub started_at: DateTime<Utc>,
    /// Command-line fragment the process was started with, used to detect
    /// PID reuse before signalling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl ManifestEntry {
    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }
}

/// Handle to a spawned, detached server process.
///
/// Carries no OS child handle: the process may outlive the supervisor and
/// be stopped by a different invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessHandle {
    pub name: String,
    pub pid: u32,
    pub started_at: DateTime<Utc>,
}

impl ProcessHandle {
    pub fn new(name: impl Into<String>, pid: u32) -> Self {
        Self {
            name: name.into(),
            pid,
            started_at: Utc::now(),
        }
    }
}

impl From<&ProcessHandle> for ManifestEntry {
    fn from(handle: &ProcessHandle) -> Self {
        Self {
            name: handle.name.clone(),
            pid: handle.pid,
            started_at: handle.started_at,
            pattern: None,
        }
    }
}

/// Ordered list of manifest entries, serialized as a JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessManifest {
    entries: Vec<ManifestEntry>,
}

impl ProcessManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ManifestEntry) {
        self.entries.push(entry);
    }

    /// Entries recorded for `name`, oldest first.
    pub fn entries_for<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ManifestEntry> {
        self.entries.iter().filter(move |e| e.name == name)
    }

    /// Remove the entry matching `name` and `pid`. Returns whether one was removed.
    pub fn remove(&mut self, name: &str, pid: u32) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| !(e.name == name && e.pid == pid));
        self.entries.len() != before
    }

    /// Keep only entries for which `keep` returns true; returns the dropped ones.
    pub fn retain_with<F>(&mut self, mut keep: F) -> Vec<ManifestEntry>
    where
        F: FnMut(&ManifestEntry) -> bool,
    {
        let (kept, dropped) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|e| keep(e));
        self.entries = kept;
        dropped
    }

    /// Distinct server names, in first-seen order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for entry in &self.entries {
            if !names.contains(&entry.name) {
                names.push(entry.name.clone());
            }
        }
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, pid: u32) -> ManifestEntry {
        ManifestEntry {
            name: name.to_string(),
            pid,
            started_at: Utc::now(),
            pattern: None,
        }
    }

    #[test]
    fn serializes_as_camel_case_array() {
        let mut manifest = ProcessManifest::new();
        manifest.push(entry("github", 42));

        let json = serde_json::to_string(&manifest).unwrap();
        assert!(json.starts_with('['));
        assert!(json.contains("\"startedAt\""));

        let back: ProcessManifest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, manifest);
    }

    #[test]
    fn pattern_is_optional_on_disk() {
        let bare = r#"[{"name":"fs","pid":9,"startedAt":"2024-05-01T10:00:00Z"}]"#;
        let manifest: ProcessManifest = serde_json::from_str(bare).unwrap();
        assert_eq!(manifest.iter().next().unwrap().pattern, None);

        let mut with = ProcessManifest::new();
        with.push(entry("fs", 9).with_pattern("server-filesystem"));
        let json = serde_json::to_string(&with).unwrap();
        assert!(json.contains("\"pattern\":\"server-filesystem\""));
    }

    #[test]
    fn remove_targets_name_and_pid() {
        let mut manifest = ProcessManifest::new();
        manifest.push(entry("a", 1));
        manifest.push(entry("a", 2));
        manifest.push(entry("b", 1));

        assert!(manifest.remove("a", 1));
        assert!(!manifest.remove("a", 1));
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.entries_for("a").count(), 1);
        assert_eq!(manifest.names(), vec!["a", "b"]);
    }

    #[test]
    fn retain_with_returns_dropped_entries() {
        let mut manifest = ProcessManifest::new();
        manifest.push(entry("a", 1));
        manifest.push(entry("b", 2));

        let dropped = manifest.retain_with(|e| e.pid != 2);
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].name, "b");
        assert_eq!(manifest.len(), 1);
    }

    #[test]
    fn handle_converts_to_entry() {
        let handle = ProcessHandle::new("fs", 7);
        let entry = ManifestEntry::from(&handle);
        assert_eq!(entry.name, "fs");
        assert_eq!(entry.pid, 7);
        assert_eq!(entry.started_at, handle.started_at);
    }
}
