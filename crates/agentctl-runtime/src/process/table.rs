//! `sysinfo`-backed process table.

use agentctl_core::{ProcessInfo, ProcessTable};
use sysinfo::{
    Pid, Process, ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, System, UpdateKind,
};

/// Reads the live OS process table on every call.
///
/// Zombies, threads and the calling process are left out.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessTable;

impl SystemProcessTable {
    pub const fn new() -> Self {
        Self
    }

    fn with_cmd() -> ProcessRefreshKind {
        ProcessRefreshKind::nothing().with_cmd(UpdateKind::Always)
    }

    fn load(targets: ProcessesToUpdate<'_>, kind: ProcessRefreshKind) -> System {
        let mut system = System::new();
        system.refresh_processes_specifics(targets, true, kind);
        system
    }
}

fn counts(pid: Pid, process: &Process) -> bool {
    pid.as_u32() != std::process::id()
        && process.thread_kind().is_none()
        && !matches!(process.status(), ProcessStatus::Zombie | ProcessStatus::Dead)
}

fn render_cmdline(process: &Process) -> String {
    let args: Vec<_> = process
        .cmd()
        .iter()
        .map(|arg| arg.to_string_lossy())
        .collect();

    if args.is_empty() {
        process.name().to_string_lossy().into_owned()
    } else {
        args.join(" ")
    }
}

impl ProcessTable for SystemProcessTable {
    fn snapshot(&self) -> Vec<ProcessInfo> {
        let system = Self::load(ProcessesToUpdate::All, Self::with_cmd());
        system
            .processes()
            .iter()
            .filter(|(pid, process)| counts(**pid, process))
            .map(|(pid, process)| ProcessInfo::new(pid.as_u32(), render_cmdline(process)))
            .collect()
    }

    fn cmdline(&self, pid: u32) -> Option<String> {
        let target = Pid::from_u32(pid);
        let system = Self::load(ProcessesToUpdate::Some(&[target]), Self::with_cmd());
        system
            .process(target)
            .filter(|process| counts(target, process))
            .map(render_cmdline)
    }

    fn is_running(&self, pid: u32) -> bool {
        let target = Pid::from_u32(pid);
        let system = Self::load(ProcessesToUpdate::Some(&[target]), ProcessRefreshKind::nothing());
        system
            .process(target)
            .is_some_and(|process| counts(target, process))
    }
}
