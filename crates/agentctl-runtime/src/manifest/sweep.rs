//! Removal of manifest entries whose process is gone.

use agentctl_core::{ManifestEntry, ProcessTable};
use tracing::{debug, info};

use super::io::ManifestStore;
use super::verify::{EntryState, classify};
use crate::error::ManifestError;
use crate::process::group_members;

/// Drop every entry whose PID no longer exists or was reused by an
/// unrelated process. Nothing is signalled. Returns the dropped entries.
///
/// An entry whose launcher exited but whose process group still has live
/// workers is kept, so a later stop can still reach them.
pub fn cleanup_stale(
    store: &ManifestStore,
    table: &dyn ProcessTable,
) -> Result<Vec<ManifestEntry>, ManifestError> {
    let dropped = store.update(|manifest| {
        manifest.retain_with(|entry| {
            let state = classify(entry.pid, entry.pattern.as_deref(), table);
            if state == EntryState::Gone && !group_members(entry.pid, table).is_empty() {
                debug!(
                    server = %entry.name,
                    pid = entry.pid,
                    "Launcher gone but its workers remain, keeping entry"
                );
                return true;
            }
            if state != EntryState::Alive {
                debug!(
                    server = %entry.name,
                    pid = entry.pid,
                    state = ?state,
                    "Dropping stale manifest entry"
                );
            }
            state == EntryState::Alive
        })
    })?;

    if !dropped.is_empty() {
        info!(count = dropped.len(), "Removed stale manifest entries");
    }
    Ok(dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockTable;
    use agentctl_core::ProcessHandle;

    #[test]
    fn removes_dead_and_reused_entries_only() {
        let temp = tempfile::tempdir().unwrap();
        let store = ManifestStore::new(temp.path().join("manifest.json"));
        let entry = |name: &str, pid| {
            ManifestEntry::from(&ProcessHandle::new(name, pid)).with_pattern(format!("pkg-{name}"))
        };
        store.append(entry("live", 1)).unwrap();
        store.append(entry("dead", 2)).unwrap();
        store.append(entry("reused", 3)).unwrap();

        let mut table = MockTable::new();
        table.expect_cmdline().returning(|pid| match pid {
            1 => Some("npx pkg-live".to_string()),
            3 => Some("python something-else".to_string()),
            _ => None,
        });
        // No process belongs to the dead entry's group
        table.expect_snapshot().returning(Vec::new);

        let dropped = cleanup_stale(&store, &table).unwrap();
        let names: Vec<_> = dropped.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["dead", "reused"]);
        assert_eq!(store.load().unwrap().names(), vec!["live"]);
    }
}
