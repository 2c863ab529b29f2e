//! Runtime adapters for agentctl.
//!
//! Spawns helper servers as detached processes, tracks them in a durable
//! manifest, probes their liveness and manages their log files.
#![deny(unused_crate_dependencies)]

mod error;
pub mod health;
pub mod logs;
pub mod manifest;
pub mod process;
pub mod resolve;
pub mod supervisor;

pub use error::{ManifestError, SupervisorError};
pub use health::HealthProber;
pub use logs::{LogManager, LogSinks, backup_stamp};
pub use manifest::{EntryState, ManifestStore, classify, cleanup_stale};
pub use process::{KillOutcome, KillPolicy, SystemProcessTable, kill_pid};
pub use resolve::{
    Attempt, AttemptOutcome, FsProvider, ResolveError, ResolveResult, SystemFs,
    resolve_executable, resolve_executable_with_fs,
};
pub use supervisor::{DEFAULT_PROBE_TIMEOUT, DEFAULT_SETTLE, Supervisor, SupervisorConfig};
