//! Verification that a recorded PID still belongs to the server.

use agentctl_core::ProcessTable;

/// What a manifest PID refers to right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryState {
    /// Live and, when a pattern is known, still matching it.
    Alive,
    /// No such process, or only a zombie remains.
    Gone,
    /// Live, but the command line no longer matches: the PID was reused.
    Reused { cmdline: String },
}

/// Classify `pid` against the identity `pattern` it was started with.
///
/// Without a pattern a live PID is trusted as-is.
pub fn classify(pid: u32, pattern: Option<&str>, table: &dyn ProcessTable) -> EntryState {
    let Some(cmdline) = table.cmdline(pid) else {
        return EntryState::Gone;
    };

    match pattern {
        Some(pattern) if !pattern.is_empty() && !cmdline.contains(pattern) => {
            EntryState::Reused { cmdline }
        }
        _ => EntryState::Alive,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockTable;
    use mockall::predicate::eq;

    #[test]
    fn classifies_live_gone_and_reused() {
        let mut table = MockTable::new();
        table
            .expect_cmdline()
            .with(eq(10))
            .returning(|_| Some("node npx @modelcontextprotocol/server-github".to_string()));
        table.expect_cmdline().with(eq(11)).returning(|_| None);
        table
            .expect_cmdline()
            .with(eq(12))
            .returning(|_| Some("vim notes.txt".to_string()));

        assert_eq!(classify(10, Some("server-github"), &table), EntryState::Alive);
        assert_eq!(classify(11, Some("server-github"), &table), EntryState::Gone);
        assert!(matches!(
            classify(12, Some("server-github"), &table),
            EntryState::Reused { .. }
        ));
        assert_eq!(classify(12, None, &table), EntryState::Alive);
    }
}
