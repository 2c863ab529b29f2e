//! Cleanup command handler.

use anyhow::Result;

use crate::bootstrap::CliContext;

/// Drop manifest entries whose process is gone. Nothing is signalled.
pub fn execute(ctx: &CliContext) -> Result<()> {
    let supervisor = ctx.supervisor(&[]);
    let dropped = supervisor.cleanup_stale()?;

    if dropped.is_empty() {
        println!("Manifest is clean");
    }
    for entry in &dropped {
        println!("removed stale entry {} (pid {})", entry.name, entry.pid);
    }
    Ok(())
}
