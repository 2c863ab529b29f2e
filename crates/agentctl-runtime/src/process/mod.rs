//! OS process handling: detached spawn, signal escalation and the
//! `sysinfo`-backed process table.

mod shutdown;
mod spawn;
mod table;

pub use shutdown::{KillOutcome, KillPolicy, group_members, kill_pid, pid_exists};
pub use spawn::{DetachedCommand, spawn_detached};
pub use table::SystemProcessTable;
