//! Detached process creation.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::SupervisorError;
use crate::logs::LogSinks;

/// Everything needed to launch one server process.
#[derive(Debug)]
pub struct DetachedCommand<'a> {
    pub name: &'a str,
    pub program: &'a Path,
    pub args: &'a [String],
    /// Complete child environment; nothing is inherited implicitly.
    pub env: Vec<(String, String)>,
}

/// Spawn a process that outlives the caller.
///
/// The child gets its own process group (Unix) or a detached console
/// (Windows), a null stdin, and the log sinks for stdout/stderr. If it
/// exits within `settle` the spawn is reported as failed; otherwise the
/// child handle is dropped without killing the process and its PID is
/// returned.
pub async fn spawn_detached(
    command: DetachedCommand<'_>,
    sinks: LogSinks,
    settle: Duration,
) -> Result<u32, SupervisorError> {
    let name = command.name;
    let mut cmd = Command::new(command.program);
    cmd.args(command.args)
        .env_clear()
        .envs(command.env)
        .stdin(Stdio::null())
        .stdout(Stdio::from(sinks.stdout))
        .stderr(Stdio::from(sinks.stderr))
        .kill_on_drop(false);

    #[cfg(unix)]
    cmd.process_group(0);

    #[cfg(windows)]
    {
        const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
        const DETACHED_PROCESS: u32 = 0x0000_0008;
        cmd.creation_flags(CREATE_NEW_PROCESS_GROUP | DETACHED_PROCESS);
    }

    let mut child = cmd.spawn().map_err(|source| SupervisorError::Spawn {
        name: name.to_string(),
        source,
    })?;

    let Some(pid) = child.id() else {
        // Only possible if the child was already reaped
        return Err(SupervisorError::EarlyExit {
            name: name.to_string(),
            status: "exited before its PID could be read".to_string(),
        });
    };
    debug!(server = %name, pid = pid, "Process spawned, waiting for settle window");

    match timeout(settle, child.wait()).await {
        Ok(Ok(status)) => {
            return Err(SupervisorError::EarlyExit {
                name: name.to_string(),
                status: status.to_string(),
            });
        }
        Ok(Err(e)) => {
            warn!(
                server = %name,
                pid = pid,
                error = %e,
                "Could not observe child during settle window"
            );
        }
        Err(_) => {}
    }

    // Dropping the handle does not signal the child; it keeps running in
    // its own process group.
    drop(child);

    info!(
        server = %name,
        pid = pid,
        stdout = %sinks.stdout_path.display(),
        "Spawned server"
    );
    Ok(pid)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::logs::LogManager;
    use std::path::PathBuf;

    fn env() -> Vec<(String, String)> {
        vec![("PATH".to_string(), "/bin:/usr/bin".to_string())]
    }

    #[tokio::test]
    async fn early_exit_is_a_spawn_failure() {
        let temp = tempfile::tempdir().unwrap();
        let logs = LogManager::new(temp.path().join("logs"), temp.path().join("backup"));
        let args = vec!["-c".to_string(), "echo boom >&2; exit 3".to_string()];

        let result = spawn_detached(
            DetachedCommand {
                name: "boom",
                program: &PathBuf::from("/bin/sh"),
                args: &args,
                env: env(),
            },
            logs.sinks_for("boom").unwrap(),
            Duration::from_secs(2),
        )
        .await;

        assert!(matches!(result, Err(SupervisorError::EarlyExit { .. })));
        let stderr = std::fs::read_to_string(logs.paths_for("boom").1).unwrap();
        assert!(stderr.contains("boom"));
    }

    #[tokio::test]
    async fn long_running_child_survives_handle_drop() {
        let temp = tempfile::tempdir().unwrap();
        let logs = LogManager::new(temp.path().join("logs"), temp.path().join("backup"));
        let args = vec!["30.5151".to_string()];

        let pid = spawn_detached(
            DetachedCommand {
                name: "sleeper",
                program: &PathBuf::from("/bin/sleep"),
                args: &args,
                env: env(),
            },
            logs.sinks_for("sleeper").unwrap(),
            Duration::from_millis(100),
        )
        .await
        .unwrap();

        assert!(crate::process::pid_exists(pid));
        let table = crate::process::SystemProcessTable::new();
        crate::process::kill_pid(pid, &table, crate::process::KillPolicy::default())
            .await
            .unwrap();
    }
}
