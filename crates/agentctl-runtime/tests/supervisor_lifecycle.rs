//! End-to-end supervisor behavior against real processes.
//!
//! Servers are `sleep` processes with a unique duration argument, which
//! doubles as their process-table identity.
#![cfg(unix)]

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use agentctl_core::{
    Environment, ManifestEntry, ProcessHandle, ProcessTable, ResolvedPaths, ServerDefinition,
    StartOutcome, StopOutcome,
};
use agentctl_runtime::{KillPolicy, Supervisor, SupervisorConfig, SystemProcessTable};

static NEXT: AtomicU32 = AtomicU32::new(0);

/// A `sleep` definition whose argument no other process shares.
fn sleeper(name: &str) -> ServerDefinition {
    let n = NEXT.fetch_add(1, Ordering::SeqCst);
    let arg = format!("{}.{}", 86_400 + n, std::process::id());
    ServerDefinition::stdio(name, "sleep", [arg])
}

fn supervisor(root: &Path) -> Supervisor {
    let paths = ResolvedPaths::under(root.join("mcp.json"), root);
    let env = Environment::new().with_var("PATH", "/bin:/usr/bin");
    Supervisor::new(&paths, env, Arc::new(SystemProcessTable::new())).with_config(
        SupervisorConfig {
            probe_timeout: Duration::from_secs(2),
            settle: Duration::from_millis(150),
            kill: KillPolicy::default(),
        },
    )
}

fn running(definition: &ServerDefinition) -> usize {
    SystemProcessTable::new()
        .find_matching(&definition.process_pattern())
        .len()
}

#[tokio::test]
async fn second_start_spawns_nothing() {
    let temp = tempfile::tempdir().unwrap();
    let sup = supervisor(temp.path());
    let defs = vec![sleeper("alpha")];

    let first = sup.ensure_running(&defs, false).await.unwrap();
    assert!(matches!(first.get("alpha"), Some(StartOutcome::Started { .. })));
    assert_eq!(first.entries()[0].alive, Some(true));

    let second = sup.ensure_running(&defs, false).await.unwrap();
    assert_eq!(second.get("alpha"), Some(&StartOutcome::AlreadyRunning));
    assert_eq!(running(&defs[0]), 1);
    assert_eq!(sup.manifest().load().unwrap().len(), 1);

    assert!(sup.stop("alpha").await.unwrap());
    assert_eq!(running(&defs[0]), 0);
}

#[tokio::test]
async fn force_restart_leaves_exactly_one_instance() {
    let temp = tempfile::tempdir().unwrap();
    let sup = supervisor(temp.path());
    let def = sleeper("beta");

    // Two live duplicates, both tracked
    sup.spawn(&def).await.unwrap();
    sup.spawn(&def).await.unwrap();
    assert_eq!(running(&def), 2);

    let report = sup
        .ensure_running(std::slice::from_ref(&def), true)
        .await
        .unwrap();
    let Some(StartOutcome::Started { pid }) = report.get("beta") else {
        panic!("expected a fresh start, got {report:?}");
    };

    assert_eq!(SystemProcessTable::new().find_matching(&def.process_pattern()), vec![*pid]);
    let manifest = sup.manifest().load().unwrap();
    let pids: Vec<u32> = manifest.entries_for("beta").map(|e| e.pid).collect();
    assert_eq!(pids, vec![*pid]);

    sup.stop("beta").await.unwrap();
}

#[tokio::test]
async fn stop_reaches_workers_started_by_a_launcher() {
    let temp = tempfile::tempdir().unwrap();
    let sup = supervisor(temp.path());
    // Like `npx`, the launcher's command line carries the identity pattern
    // while the worker it starts does not
    let worker = format!("sleep {}.{}", 77, std::process::id());
    let def = ServerDefinition::stdio(
        "wrapped",
        "sh",
        ["-c".to_string(), format!("{worker} & wait")],
    );

    let handle = sup.spawn(&def).await.unwrap();
    let table = SystemProcessTable::new();
    let workers: Vec<u32> = table
        .find_matching(&worker)
        .into_iter()
        .filter(|pid| *pid != handle.pid)
        .collect();
    assert_eq!(workers.len(), 1, "launcher did not start its worker");

    assert!(sup.stop("wrapped").await.unwrap());
    assert!(table.find_matching(&worker).is_empty(), "worker outlived stop");
    assert!(sup.manifest().load().unwrap().is_empty());
}

#[tokio::test]
async fn one_failure_does_not_block_the_rest() {
    let temp = tempfile::tempdir().unwrap();
    let sup = supervisor(temp.path());
    let good = sleeper("gamma");
    let missing = ServerDefinition::stdio("broken", "definitely-not-a-real-binary-7f3a", ["x"]);

    let report = sup
        .ensure_running(&[good, missing], false)
        .await
        .unwrap();

    assert!(matches!(report.get("gamma"), Some(StartOutcome::Started { .. })));
    let Some(StartOutcome::Failed { reason }) = report.get("broken") else {
        panic!("expected failure, got {report:?}");
    };
    assert!(reason.contains("definitely-not-a-real-binary-7f3a"));
    assert_eq!(report.exit_code(), 1);

    sup.stop("gamma").await.unwrap();
}

#[tokio::test]
async fn stale_manifest_entry_is_dropped_on_stop() {
    let temp = tempfile::tempdir().unwrap();
    let sup = supervisor(temp.path());
    sup.manifest()
        .append(ManifestEntry::from(&ProcessHandle::new("ghost", 999_999)))
        .unwrap();

    assert!(!sup.stop("ghost").await.unwrap());
    assert!(sup.manifest().load().unwrap().is_empty());
}

#[tokio::test]
async fn stop_all_stops_untracked_registered_servers_and_archives_logs() {
    let temp = tempfile::tempdir().unwrap();
    let mut sup = supervisor(temp.path());
    let tracked = sleeper("delta");
    let untracked = sleeper("epsilon");
    sup.register([tracked.clone(), untracked.clone()]);

    sup.spawn(&tracked).await.unwrap();
    sup.spawn(&untracked).await.unwrap();
    // Simulate a manifest lost in a crash for one of them
    sup.manifest()
        .update(|m| m.retain_with(|e| e.name != "epsilon"))
        .unwrap();
    std::fs::write(sup.logs().paths_for("delta").0, "hello\n").unwrap();

    let report = sup.stop_all().await.unwrap();
    assert!(matches!(report.get("delta"), Some(StopOutcome::Stopped { .. })));
    assert!(matches!(report.get("epsilon"), Some(StopOutcome::Stopped { .. })));
    assert!(report.is_success());
    assert_eq!(running(&tracked) + running(&untracked), 0);
    assert!(sup.manifest().load().unwrap().is_empty());

    let backups: Vec<_> = std::fs::read_dir(temp.path().join("logs").join("backup"))
        .unwrap()
        .collect();
    assert_eq!(backups.len(), 1);
    assert_eq!(
        std::fs::metadata(sup.logs().paths_for("delta").0).unwrap().len(),
        0
    );

    // Re-running finds nothing left to do
    let again = sup.stop_all().await.unwrap();
    assert_eq!(again.get("delta"), Some(&StopOutcome::NotRunning));
}

#[tokio::test]
async fn probes_answer_within_the_timeout() {
    let temp = tempfile::tempdir().unwrap();
    let sup = supervisor(temp.path());
    let unreachable = ServerDefinition::stdio("net", "sleep", ["1"])
        .with_transport(agentctl_core::Transport::Tcp { port: 1 });
    let absent = sleeper("zeta");

    let started = Instant::now();
    let report = sup.test_all(&[unreachable, absent]).await;
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(report.len(), 2);
    assert!(report.entries().iter().all(|e| e.alive == Some(false)));
    assert_eq!(report.exit_code(), 1);
}
