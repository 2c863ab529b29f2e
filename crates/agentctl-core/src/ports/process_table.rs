//! Process table port.
//!
//! Liveness of stdio servers is approximated by matching command lines in
//! the OS process table. The port keeps that scan injectable so the
//! supervisor and prober can be tested without real processes.

/// One row of the process table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: u32,
    /// Full command line, arguments joined by single spaces.
    pub cmdline: String,
}

impl ProcessInfo {
    pub fn new(pid: u32, cmdline: impl Into<String>) -> Self {
        Self {
            pid,
            cmdline: cmdline.into(),
        }
    }

    /// Fuzzy match: the command line contains `pattern` as a substring.
    pub fn matches(&self, pattern: &str) -> bool {
        !pattern.is_empty() && self.cmdline.contains(pattern)
    }
}

/// Read-only view of running processes.
///
/// Implementations must exclude zombies and the calling process itself.
pub trait ProcessTable: Send + Sync {
    /// Snapshot of all live processes.
    fn snapshot(&self) -> Vec<ProcessInfo>;

    /// PIDs of live processes whose command line contains `pattern`.
    fn find_matching(&self, pattern: &str) -> Vec<u32> {
        self.snapshot()
            .into_iter()
            .filter(|p| p.matches(pattern))
            .map(|p| p.pid)
            .collect()
    }

    /// Command line of a single live process.
    fn cmdline(&self, pid: u32) -> Option<String> {
        self.snapshot()
            .into_iter()
            .find(|p| p.pid == pid)
            .map(|p| p.cmdline)
    }

    /// Whether `pid` is a live, non-zombie process.
    fn is_running(&self, pid: u32) -> bool {
        self.cmdline(pid).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<ProcessInfo>);

    impl ProcessTable for Fixed {
        fn snapshot(&self) -> Vec<ProcessInfo> {
            self.0.clone()
        }
    }

    #[test]
    fn find_matching_uses_substring() {
        let table = Fixed(vec![
            ProcessInfo::new(1, "npm exec @modelcontextprotocol/server-github"),
            ProcessInfo::new(2, "node /usr/lib/mcp-server-github/dist/index.js"),
            ProcessInfo::new(3, "bash"),
        ]);

        assert_eq!(table.find_matching("server-github"), vec![1, 2]);
        assert!(table.find_matching("").is_empty());
        assert_eq!(table.cmdline(3).as_deref(), Some("bash"));
        assert_eq!(table.cmdline(4), None);
        assert!(table.is_running(2));
        assert!(!table.is_running(4));
    }
}
