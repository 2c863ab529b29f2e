//! Start and restart command handlers.
//!
//! Both run the full orchestration: reconcile the config file, drop stale
//! manifest entries, then bring every desired server up. Servers left out
//! by reconciliation appear in the report as skipped (or failed, for
//! entries that could not be parsed).

use anyhow::Result;

use agentctl_config::{CredentialPrompt, ReconcileOptions, SkipReason};
use agentctl_core::StartOutcome;

use crate::bootstrap::CliContext;
use crate::error::EXIT_OK;
use crate::presentation::{print_report, print_skipped, print_warnings};
use crate::utils::StdinPrompt;

/// Arguments of `agentctl start`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StartArgs {
    pub force: bool,
    pub prompt: bool,
    pub dry_run: bool,
}

/// Execute the start command; returns the process exit code.
pub async fn execute(ctx: &mut CliContext, args: StartArgs) -> Result<i32> {
    let stdin_prompt = StdinPrompt;
    let options = ReconcileOptions {
        dry_run: args.dry_run,
        prompt: args
            .prompt
            .then_some(&stdin_prompt as &dyn CredentialPrompt),
    };

    let reconciliation = ctx.reconcile(&options)?;
    print_warnings(&reconciliation.warnings);
    let supervisor = ctx.supervisor(&reconciliation.desired);

    if args.dry_run {
        let probes = supervisor.test_all(&reconciliation.desired).await;
        print_report("current state (dry run)", &probes);
        for entry in probes.entries() {
            let action = match (entry.alive, args.force) {
                (Some(true), false) => continue,
                (Some(true), true) => "restart",
                _ => "start",
            };
            println!("would {action} {}", entry.name);
        }
        print_skipped(&reconciliation.skipped);
        return Ok(EXIT_OK);
    }

    supervisor.cleanup_stale()?;
    let mut report = supervisor
        .ensure_running(&reconciliation.desired, args.force)
        .await?;
    for skipped in &reconciliation.skipped {
        report.push(skipped.name.clone(), skip_outcome(&skipped.reason));
    }

    print_report(if args.force { "restart" } else { "start" }, &report);
    Ok(report.exit_code())
}

/// Execute the restart command: a forced start.
pub async fn restart(ctx: &mut CliContext, prompt: bool) -> Result<i32> {
    let args = StartArgs {
        force: true,
        prompt,
        dry_run: false,
    };
    execute(ctx, args).await
}

fn skip_outcome(reason: &SkipReason) -> StartOutcome {
    if reason.is_failure() {
        StartOutcome::Failed {
            reason: reason.to_string(),
        }
    } else {
        StartOutcome::Skipped {
            reason: reason.to_string(),
        }
    }
}
