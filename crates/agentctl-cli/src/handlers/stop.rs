//! Stop command handler.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::presentation::print_report;

/// Stop the named servers, or every server when `names` is empty.
///
/// No credentials are resolved and the config file is not written; the
/// config entries and the built-in catalog only supply identity patterns.
pub async fn execute(ctx: &CliContext, names: &[String]) -> Result<i32> {
    let known = ctx.known_definitions()?;
    let supervisor = ctx.supervisor(&known);

    let report = if names.is_empty() {
        supervisor.stop_all().await?
    } else {
        supervisor.stop_servers(names).await?
    };

    print_report("stop", &report);
    Ok(report.exit_code())
}
