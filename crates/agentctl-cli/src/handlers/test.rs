//! Test command handler: probe every desired server.

use anyhow::Result;

use agentctl_config::ReconcileOptions;

use crate::bootstrap::CliContext;
use crate::presentation::{print_report, print_skipped, print_warnings};

/// Probe the desired servers concurrently; exits 1 when any is down.
///
/// The config file is read but never written.
pub async fn execute(ctx: &mut CliContext) -> Result<i32> {
    let options = ReconcileOptions {
        dry_run: true,
        prompt: None,
    };
    let reconciliation = ctx.reconcile(&options)?;
    print_warnings(&reconciliation.warnings);

    let supervisor = ctx.supervisor(&reconciliation.desired);
    let report = supervisor.test_all(&reconciliation.desired).await;

    print_report("health", &report);
    print_skipped(&reconciliation.skipped);
    Ok(report.exit_code())
}
