//! Process supervisor: start, stop and probe helper servers.
//!
//! Children are detached and outlive this process. The manifest is the
//! only link between an invocation that started a server and a later one
//! that stops it; a process-table sweep by identity pattern covers
//! manifests lost across crashes.
//!
//! Operations on different servers run concurrently. For one server,
//! stop-then-spawn under `force` always runs in that order.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use agentctl_core::{
    Environment, ManifestEntry, Outcome, ProbeOutcome, ProcessHandle, ProcessTable, Report,
    ResolvedPaths, ServerDefinition, ServerPhase, StartOutcome, StopOutcome,
};
use futures_util::future::join_all;
use tracing::{debug, info, warn};

use crate::error::SupervisorError;
use crate::health::HealthProber;
use crate::logs::{LogManager, backup_stamp};
use crate::manifest::{EntryState, ManifestStore, classify, cleanup_stale};
use crate::process::{
    DetachedCommand, KillOutcome, KillPolicy, group_members, kill_pid, spawn_detached,
};
use crate::resolve::resolve_executable;

/// Default bound for a single liveness probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Default window in which an exiting child counts as a failed spawn.
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorConfig {
    pub probe_timeout: Duration,
    pub settle: Duration,
    pub kill: KillPolicy,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            settle: DEFAULT_SETTLE,
            kill: KillPolicy::default(),
        }
    }
}

pub struct Supervisor {
    env: Environment,
    table: Arc<dyn ProcessTable>,
    prober: HealthProber,
    manifest: ManifestStore,
    logs: LogManager,
    known: BTreeMap<String, ServerDefinition>,
    config: SupervisorConfig,
}

impl Supervisor {
    /// Supervisor writing its manifest and logs under `paths`.
    ///
    /// `env` is the base environment of every spawned child.
    pub fn new(paths: &ResolvedPaths, env: Environment, table: Arc<dyn ProcessTable>) -> Self {
        Self {
            env,
            prober: HealthProber::new(Arc::clone(&table)),
            table,
            manifest: ManifestStore::new(paths.manifest_path.clone()),
            logs: LogManager::from_paths(paths),
            known: BTreeMap::new(),
            config: SupervisorConfig::default(),
        }
    }

    #[must_use]
    pub const fn with_config(mut self, config: SupervisorConfig) -> Self {
        self.config = config;
        self
    }

    /// Make server identities known for pattern sweeps by `stop`/`stop_all`.
    pub fn register<I>(&mut self, definitions: I)
    where
        I: IntoIterator<Item = ServerDefinition>,
    {
        for definition in definitions {
            self.known.insert(definition.name.clone(), definition);
        }
    }

    pub const fn manifest(&self) -> &ManifestStore {
        &self.manifest
    }

    pub const fn logs(&self) -> &LogManager {
        &self.logs
    }

    pub const fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// Liveness of `definition`, bounded by the probe timeout.
    pub async fn is_alive(&self, definition: &ServerDefinition) -> bool {
        self.prober
            .probe(definition, self.config.probe_timeout)
            .await
    }

    /// Launch `definition` detached and record it in the manifest.
    ///
    /// The child's environment is the supervisor's environment with the
    /// definition's `env` (placeholders expanded) layered on top.
    pub async fn spawn(
        &self,
        definition: &ServerDefinition,
    ) -> Result<ProcessHandle, SupervisorError> {
        let name = definition.name.as_str();
        let resolved = resolve_executable(&definition.command, &self.env)?;
        debug!(
            server = %name,
            program = %resolved.resolved_path.display(),
            "Command resolved"
        );

        let overrides =
            definition
                .expanded_env(&self.env)
                .map_err(|source| SupervisorError::Definition {
                    name: name.to_string(),
                    source,
                })?;

        let mut env: BTreeMap<String, String> = self
            .env
            .vars()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        env.extend(overrides);

        let sinks = self
            .logs
            .sinks_for(name)
            .map_err(|source| SupervisorError::Logs {
                name: name.to_string(),
                source,
            })?;

        let pid = spawn_detached(
            DetachedCommand {
                name,
                program: &resolved.resolved_path,
                args: &definition.args,
                env: env.into_iter().collect(),
            },
            sinks,
            self.config.settle,
        )
        .await?;

        let handle = ProcessHandle::new(name, pid);
        self.manifest
            .append(ManifestEntry::from(&handle).with_pattern(definition.process_pattern()))?;
        Ok(handle)
    }

    /// Stop the server called `name`.
    ///
    /// Uses the manifest entries for `name`; when there are none, falls back
    /// to a process-table match on the registered identity pattern. Stale
    /// entries are removed. Returns false when nothing was running.
    pub async fn stop(&self, name: &str) -> Result<bool, SupervisorError> {
        let pattern = self.known.get(name).map(ServerDefinition::process_pattern);
        let stopped = self.terminate(name, pattern, false).await?;
        Ok(!stopped.is_empty())
    }

    /// Bring every definition to a running state.
    ///
    /// Without `force`, a server is spawned only when its probe says it is
    /// down. With `force`, every instance (manifest and pattern matches) is
    /// stopped first, so exactly one remains afterwards. A failure for one
    /// server does not affect the others.
    pub async fn ensure_running(
        &self,
        definitions: &[ServerDefinition],
        force: bool,
    ) -> Result<Report<StartOutcome>, SupervisorError> {
        let results = join_all(
            definitions
                .iter()
                .map(|definition| self.ensure_one(definition, force)),
        )
        .await;

        let mut report = Report::new();
        for (definition, result) in definitions.iter().zip(results) {
            let (outcome, alive) = result?;
            report.push(definition.name.clone(), outcome);
            if let Some(alive) = alive {
                report.set_alive(&definition.name, alive);
            }
        }
        Ok(report)
    }

    /// Stop every manifest entry and sweep registered patterns.
    ///
    /// Safe to re-run: targets are re-derived from the manifest and the
    /// process table each time. Logs of every server that stopped cleanly
    /// are archived under one timestamped directory.
    pub async fn stop_all(&self) -> Result<Report<StopOutcome>, SupervisorError> {
        let mut names = self.manifest.load()?.names();
        for name in self.known.keys() {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        self.stop_many(names, true).await
    }

    /// Stop the named servers, as `stop` does, and archive their logs.
    pub async fn stop_servers(
        &self,
        names: &[String],
    ) -> Result<Report<StopOutcome>, SupervisorError> {
        self.stop_many(names.to_vec(), false).await
    }

    /// Probe every definition concurrently.
    pub async fn test_all(&self, definitions: &[ServerDefinition]) -> Report<ProbeOutcome> {
        let mut report = Report::new();
        for (name, alive) in self
            .prober
            .probe_all(definitions, self.config.probe_timeout)
            .await
        {
            report.push(name.clone(), ProbeOutcome::from_alive(alive));
            report.set_alive(&name, alive);
        }
        report
    }

    /// Drop manifest entries whose process no longer exists.
    pub fn cleanup_stale(&self) -> Result<Vec<ManifestEntry>, SupervisorError> {
        Ok(cleanup_stale(&self.manifest, self.table.as_ref())?)
    }

    async fn stop_many(
        &self,
        names: Vec<String>,
        sweep: bool,
    ) -> Result<Report<StopOutcome>, SupervisorError> {
        let results = join_all(names.iter().map(|name| async move {
            let pattern = self.known.get(name).map(ServerDefinition::process_pattern);
            self.terminate(name, pattern, sweep).await
        }))
        .await;

        let stamp = backup_stamp();
        let mut report = Report::new();
        for (name, result) in names.into_iter().zip(results) {
            let outcome = match result {
                Ok(pids) if pids.is_empty() => StopOutcome::NotRunning,
                Ok(pids) => StopOutcome::Stopped { pids },
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(server = %name, error = %e, "Stop failed");
                    StopOutcome::Failed {
                        reason: e.to_string(),
                    }
                }
            };

            if !outcome.is_failure() {
                if let Err(e) = self.logs.archive_and_clear_at(&name, &stamp) {
                    warn!(server = %name, error = %e, "Could not archive logs");
                }
            }
            report.push(name, outcome);
        }
        Ok(report)
    }

    async fn ensure_one(
        &self,
        definition: &ServerDefinition,
        force: bool,
    ) -> Result<(StartOutcome, Option<bool>), SupervisorError> {
        let name = definition.name.as_str();

        if force {
            match self
                .terminate(name, Some(definition.process_pattern()), true)
                .await
            {
                Ok(pids) if !pids.is_empty() => {
                    info!(server = %name, pids = ?pids, "Stopped for restart");
                }
                Ok(_) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(server = %name, error = %e, "Could not stop for restart");
                    return Ok((
                        StartOutcome::Failed {
                            reason: e.to_string(),
                        },
                        None,
                    ));
                }
            }
        } else {
            let phase = ServerPhase::after_probe(self.is_alive(definition).await);
            debug!(server = %name, phase = ?phase, "Probed");
            if phase == ServerPhase::AlreadyRunning {
                return Ok((StartOutcome::AlreadyRunning, Some(true)));
            }
        }

        let result = self.spawn(definition).await;
        let phase = ServerPhase::after_spawn(result.is_ok());
        debug!(server = %name, phase = ?phase, "Spawn finished");

        match result {
            Ok(handle) => {
                let alive = self.is_alive(definition).await;
                Ok((StartOutcome::Started { pid: handle.pid }, Some(alive)))
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!(server = %name, error = %e, "Spawn failed");
                Ok((
                    StartOutcome::Failed {
                        reason: e.to_string(),
                    },
                    Some(false),
                ))
            }
        }
    }

    /// Terminate the processes of `name`; returns the PIDs that exited.
    ///
    /// Manifest entries are verified before signalling: gone or reused PIDs
    /// are dropped from the manifest without a signal. The pattern sweep
    /// runs when `sweep` is set or the manifest had no entry for `name`.
    async fn terminate(
        &self,
        name: &str,
        pattern: Option<String>,
        sweep: bool,
    ) -> Result<Vec<u32>, SupervisorError> {
        let entries: Vec<ManifestEntry> =
            self.manifest.load()?.entries_for(name).cloned().collect();
        let mut stopped = Vec::new();

        for entry in &entries {
            let identity = entry.pattern.as_deref().or(pattern.as_deref());
            match classify(entry.pid, identity, self.table.as_ref()) {
                EntryState::Alive => {
                    if self.kill(name, entry.pid).await? {
                        stopped.push(entry.pid);
                    }
                }
                EntryState::Gone => {
                    // A launcher that died can leave its workers behind
                    let orphans = group_members(entry.pid, self.table.as_ref());
                    if orphans.is_empty() {
                        debug!(server = %name, pid = entry.pid, "Manifest PID already gone");
                    } else if self.kill(name, entry.pid).await? {
                        info!(
                            server = %name,
                            pid = entry.pid,
                            workers = ?orphans,
                            "Stopped workers left by an exited launcher"
                        );
                        stopped.push(entry.pid);
                    }
                }
                EntryState::Reused { cmdline } => {
                    warn!(
                        server = %name,
                        pid = entry.pid,
                        cmdline = %cmdline,
                        "PID was reused by another process, not signalling"
                    );
                }
            }
            self.manifest.remove(name, entry.pid)?;
        }

        if sweep || entries.is_empty() {
            if let Some(pattern) = pattern.filter(|p| !p.is_empty()) {
                for pid in self.table.find_matching(&pattern) {
                    if !stopped.contains(&pid) && self.kill(name, pid).await? {
                        info!(server = %name, pid = pid, "Stopped untracked instance");
                        stopped.push(pid);
                    }
                }
            }
        }

        Ok(stopped)
    }

    async fn kill(&self, name: &str, pid: u32) -> Result<bool, SupervisorError> {
        match kill_pid(pid, self.table.as_ref(), self.config.kill).await {
            Ok(KillOutcome::Terminated) => {
                info!(server = %name, pid = pid, "Stopped");
                Ok(true)
            }
            Ok(KillOutcome::AlreadyGone) => Ok(false),
            Err(source) => Err(SupervisorError::Kill { pid, source }),
        }
    }
}
