//! Per-server outcomes and aggregate reports.
//!
//! Component operations return outcome values rather than errors; only the
//! caller of the aggregate report decides the final exit status.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Shared behavior of per-server outcome values.
pub trait Outcome {
    /// Whether this outcome should make the aggregate operation fail.
    fn is_failure(&self) -> bool;
}

/// Result of ensuring one server is running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum StartOutcome {
    /// Probe found the server alive; nothing was spawned.
    AlreadyRunning,
    /// A new process was spawned.
    Started { pid: u32 },
    /// Spawning failed (missing executable, permission denied, early exit).
    Failed { reason: String },
    /// Not attempted, typically because a credential is missing.
    Skipped { reason: String },
}

impl Outcome for StartOutcome {
    fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl fmt::Display for StartOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyRunning => write!(f, "already-running"),
            Self::Started { pid } => write!(f, "started (pid {pid})"),
            Self::Failed { reason } => write!(f, "failed: {reason}"),
            Self::Skipped { reason } => write!(f, "skipped: {reason}"),
        }
    }
}

/// Result of stopping one server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum StopOutcome {
    /// At least one live process was terminated.
    Stopped { pids: Vec<u32> },
    /// Nothing was running. Not an error.
    NotRunning,
    /// A process could not be terminated.
    Failed { reason: String },
}

impl Outcome for StopOutcome {
    fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl fmt::Display for StopOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped { pids } => {
                let pids: Vec<String> = pids.iter().map(u32::to_string).collect();
                write!(f, "stopped (pid {})", pids.join(", "))
            }
            Self::NotRunning => write!(f, "not-running"),
            Self::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

/// Result of a liveness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProbeOutcome {
    Alive,
    Down,
}

impl ProbeOutcome {
    pub const fn from_alive(alive: bool) -> Self {
        if alive { Self::Alive } else { Self::Down }
    }
}

impl Outcome for ProbeOutcome {
    fn is_failure(&self) -> bool {
        matches!(self, Self::Down)
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alive => write!(f, "alive"),
            Self::Down => write!(f, "down"),
        }
    }
}

/// Per-server, per-invocation lifecycle.
///
/// `Unknown -> Probed -> {AlreadyRunning | NeedsStart} -> {Started | StartFailed} -> ReportedFinal`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerPhase {
    Unknown,
    Probed,
    AlreadyRunning,
    NeedsStart,
    Started,
    StartFailed,
    ReportedFinal,
}

impl ServerPhase {
    /// Transition out of `Probed` given the probe result.
    pub const fn after_probe(alive: bool) -> Self {
        if alive {
            Self::AlreadyRunning
        } else {
            Self::NeedsStart
        }
    }

    /// Transition out of `NeedsStart` given the spawn result.
    pub const fn after_spawn(ok: bool) -> Self {
        if ok { Self::Started } else { Self::StartFailed }
    }

    /// Whether the phase can feed the final report.
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::AlreadyRunning | Self::Started | Self::StartFailed | Self::ReportedFinal
        )
    }
}

/// Outcome for one named server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerReport<T> {
    pub name: String,
    pub outcome: T,
    /// Liveness observed by the re-check after the operation, when performed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alive: Option<bool>,
}

/// Aggregate of per-server outcomes, in processing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report<T> {
    entries: Vec<ServerReport<T>>,
}

impl<T> Default for Report<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: Outcome> Report<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, outcome: T) {
        self.entries.push(ServerReport {
            name: name.into(),
            outcome,
            alive: None,
        });
    }

    /// Record the post-operation liveness for `name`.
    pub fn set_alive(&mut self, name: &str, alive: bool) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.name == name) {
            entry.alive = Some(alive);
        }
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| &e.outcome)
    }

    pub fn entries(&self) -> &[ServerReport<T>] {
        &self.entries
    }

    pub fn failures(&self) -> impl Iterator<Item = &ServerReport<T>> {
        self.entries.iter().filter(|e| e.outcome.is_failure())
    }

    /// True when every server reached a non-error terminal state.
    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Process exit status for this report: 0 on success, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        i32::from(!self.is_success())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append all entries of another report.
    pub fn extend(&mut self, other: Self) {
        self.entries.extend(other.entries);
    }
}
