//! Terminate detached server processes by PID.
//!
//! The supervisor holds no `Child` handle for the processes it stops (they
//! may have been started by an earlier invocation), so it cannot reap them.
//! Exit is observed through the process table, where zombies count as gone.
//!
//! Servers are spawned as leaders of their own process group, and launchers
//! such as `npx` run the real server as a grandchild inside that group.
//! When the target owns its group, every signal goes to the whole group and
//! the stop only completes once no live member remains.

use std::io;
use std::time::Duration;

use agentctl_core::ProcessTable;
#[cfg(unix)]
use tokio::time::sleep;
#[cfg(unix)]
use tracing::debug;

#[cfg(unix)]
use nix::errno::Errno;
#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::{Pid, getpgid, getpgrp};

/// Interval between exit checks while waiting.
#[cfg(unix)]
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long to wait after each signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KillPolicy {
    /// Wait after SIGTERM before escalating.
    pub term_grace: Duration,
    /// Wait after SIGKILL before giving up.
    pub kill_grace: Duration,
}

impl Default for KillPolicy {
    fn default() -> Self {
        Self {
            term_grace: Duration::from_secs(2),
            kill_grace: Duration::from_secs(2),
        }
    }
}

/// What happened to the target process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillOutcome {
    /// The process was alive and has now exited.
    Terminated,
    /// No such process when the first signal was sent.
    AlreadyGone,
}

/// Whether `pid` exists at all (zombies included).
///
/// Uses `kill` with the null signal, which checks existence without
/// delivering anything.
#[cfg(unix)]
pub fn pid_exists(pid: u32) -> bool {
    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    match signal::kill(Pid::from_raw(raw), None) {
        Ok(()) => true,
        Err(Errno::ESRCH) => false,
        // Exists but belongs to someone else
        Err(_) => true,
    }
}

#[cfg(not(unix))]
pub fn pid_exists(_pid: u32) -> bool {
    false
}

/// Whether `pid` owns a process group other than the caller's.
///
/// A group keeps the id of the process that created it, and the kernel
/// does not hand out an id still in use as a group id. So a surviving group
/// whose leader has exited still identifies that leader's workers.
#[cfg(unix)]
fn owns_group(pid: Pid) -> bool {
    if pid == getpgrp() {
        return false;
    }
    match getpgid(Some(pid)) {
        Ok(pgid) => pgid == pid,
        Err(_) => signal::killpg(pid, None).is_ok(),
    }
}

/// Live (non-zombie) members of the process group led by `pgid`.
#[cfg(unix)]
pub fn group_members(pgid: u32, table: &dyn ProcessTable) -> Vec<u32> {
    let Ok(raw) = i32::try_from(pgid) else {
        return Vec::new();
    };
    let group = Pid::from_raw(raw);
    if group == getpgrp() {
        return Vec::new();
    }

    table
        .snapshot()
        .into_iter()
        .filter(|p| {
            i32::try_from(p.pid)
                .is_ok_and(|member| getpgid(Some(Pid::from_raw(member))) == Ok(group))
        })
        .map(|p| p.pid)
        .collect()
}

#[cfg(not(unix))]
pub fn group_members(_pgid: u32, _table: &dyn ProcessTable) -> Vec<u32> {
    Vec::new()
}

/// Stop a process (and the group it leads) with SIGTERM -> SIGKILL
/// escalation.
///
/// # Strategy
/// 1. Send SIGTERM to the group, or to the PID when it leads none
/// 2. Poll until the leader and every group member are gone, or
///    `term_grace` elapses
/// 3. Send SIGKILL the same way
/// 4. Poll until everything is gone or `kill_grace` elapses
///
/// ESRCH at any point means the target is already gone, which is not an
/// error. An unreaped zombie counts as exited.
pub async fn kill_pid(
    pid: u32,
    table: &dyn ProcessTable,
    policy: KillPolicy,
) -> io::Result<KillOutcome> {
    #[cfg(unix)]
    {
        kill_pid_unix(pid, table, policy).await
    }

    #[cfg(not(unix))]
    {
        let _ = (pid, table, policy);
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "stopping processes by PID is only supported on Unix",
        ))
    }
}

#[cfg(unix)]
async fn kill_pid_unix(
    pid: u32,
    table: &dyn ProcessTable,
    policy: KillPolicy,
) -> io::Result<KillOutcome> {
    let raw = i32::try_from(pid).map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidInput, format!("PID {pid} out of range"))
    })?;
    let nix_pid = Pid::from_raw(raw);
    let group = owns_group(nix_pid);
    if group {
        debug!(pid = pid, "Signalling process group");
    }

    // Phase 1: SIGTERM
    match send(nix_pid, group, Signal::SIGTERM) {
        Ok(()) => {}
        Err(Errno::ESRCH) => return Ok(KillOutcome::AlreadyGone),
        Err(e) => return Err(io::Error::other(e)),
    }

    if wait_for_exit(pid, group, table, policy.term_grace).await {
        return Ok(KillOutcome::Terminated);
    }

    // Phase 2: SIGKILL
    debug!(pid = pid, group = group, "SIGTERM ignored, sending SIGKILL");
    match send(nix_pid, group, Signal::SIGKILL) {
        Ok(()) => {}
        Err(Errno::ESRCH) => return Ok(KillOutcome::Terminated),
        Err(e) => return Err(io::Error::other(e)),
    }

    if wait_for_exit(pid, group, table, policy.kill_grace).await {
        return Ok(KillOutcome::Terminated);
    }

    Err(io::Error::new(
        io::ErrorKind::TimedOut,
        format!("process {pid} did not exit after SIGKILL"),
    ))
}

#[cfg(unix)]
fn send(pid: Pid, group: bool, sig: Signal) -> nix::Result<()> {
    if group {
        signal::killpg(pid, sig)
    } else {
        signal::kill(pid, sig)
    }
}

#[cfg(unix)]
async fn wait_for_exit(pid: u32, group: bool, table: &dyn ProcessTable, grace: Duration) -> bool {
    let polls = (grace.as_millis() / POLL_INTERVAL.as_millis()).max(1);
    for _ in 0..polls {
        sleep(POLL_INTERVAL).await;
        let leader_gone = !pid_exists(pid) || !table.is_running(pid);
        if leader_gone && (!group || group_members(pid, table).is_empty()) {
            return true;
        }
    }
    false
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::process::SystemProcessTable;
    use tokio::process::Command;

    #[tokio::test]
    async fn already_gone_is_not_an_error() {
        let outcome = kill_pid(999_999, &SystemProcessTable::new(), KillPolicy::default()).await;
        assert_eq!(outcome.unwrap(), KillOutcome::AlreadyGone);
    }

    #[tokio::test]
    async fn terminates_and_counts_zombie_as_gone() {
        let mut child = Command::new("sleep")
            .arg("60.7171")
            .spawn()
            .expect("failed to spawn sleep");
        let pid = child.id().expect("no PID");

        // The child stays an unreaped zombie until `wait` below
        let outcome = kill_pid(pid, &SystemProcessTable::new(), KillPolicy::default()).await;
        assert_eq!(outcome.unwrap(), KillOutcome::Terminated);

        let _ = child.wait().await;
        assert!(!pid_exists(pid));
    }

    #[tokio::test]
    async fn stopping_a_group_leader_reaches_its_workers() {
        let table = SystemProcessTable::new();
        let mut launcher = Command::new("sh")
            .args(["-c", "sleep 60.7272 & wait"])
            .process_group(0)
            .spawn()
            .expect("failed to spawn launcher");
        let leader = launcher.id().expect("no PID");
        tokio::time::sleep(Duration::from_millis(200)).await;

        // The launcher's own command line also contains the worker's
        let workers: Vec<u32> = table
            .find_matching("sleep 60.7272")
            .into_iter()
            .filter(|pid| *pid != leader)
            .collect();
        assert_eq!(workers.len(), 1);
        assert!(group_members(leader, &table).contains(&workers[0]));

        let outcome = kill_pid(leader, &table, KillPolicy::default()).await;
        assert_eq!(outcome.unwrap(), KillOutcome::Terminated);
        assert!(table.find_matching("sleep 60.7272").is_empty());
        assert!(group_members(leader, &table).is_empty());

        let _ = launcher.wait().await;
    }

    #[test]
    fn own_group_is_never_a_target() {
        let table = SystemProcessTable::new();
        let own = u32::try_from(getpgrp().as_raw()).unwrap();
        assert!(group_members(own, &table).is_empty());
        assert!(!owns_group(getpgrp()));
    }

    #[test]
    fn pid_exists_for_self() {
        assert!(pid_exists(std::process::id()));
        assert!(!pid_exists(999_999));
    }
}
