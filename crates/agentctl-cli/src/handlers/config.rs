//! Config command handlers.

use anyhow::Result;

use agentctl_config::{CredentialPrompt, ReconcileOptions};
use agentctl_core::ConfigDocument;

use crate::bootstrap::CliContext;
use crate::config_commands::ConfigCommand;
use crate::error::EXIT_OK;
use crate::presentation::{print_skipped, print_warnings, truncate_string};
use crate::utils::StdinPrompt;

/// Execute a config subcommand; returns the process exit code.
pub fn execute(ctx: &mut CliContext, command: &ConfigCommand) -> Result<i32> {
    match command {
        ConfigCommand::Show => show(ctx),
        ConfigCommand::Sync { dry_run, prompt } => sync(ctx, *dry_run, *prompt),
    }
}

fn show(ctx: &CliContext) -> Result<i32> {
    let loaded = ctx.store.load()?;
    print_warnings(&loaded.warnings);

    println!("{}", ctx.store.path().display());
    if loaded.document.is_empty() {
        println!("No MCP servers configured");
        return Ok(EXIT_OK);
    }
    for row in server_rows(&loaded.document) {
        println!("{row}");
    }
    Ok(EXIT_OK)
}

fn sync(ctx: &mut CliContext, dry_run: bool, prompt: bool) -> Result<i32> {
    let stdin_prompt = StdinPrompt;
    let options = ReconcileOptions {
        dry_run,
        prompt: prompt.then_some(&stdin_prompt as &dyn CredentialPrompt),
    };
    let reconciliation = ctx.reconcile(&options)?;
    print_warnings(&reconciliation.warnings);

    if reconciliation.saved {
        println!("Wrote {}", ctx.store.path().display());
    } else {
        println!("Dry run, {} left untouched", ctx.store.path().display());
    }
    for name in reconciliation.desired_names() {
        println!("desired {name}");
    }
    print_skipped(&reconciliation.skipped);

    let failed = reconciliation.skipped.iter().any(|s| s.reason.is_failure());
    Ok(i32::from(failed))
}

/// One table row per server: name, status, transport, command and the
/// names (never the values) of its env entries.
fn server_rows(document: &ConfigDocument) -> Vec<String> {
    let mut rows = vec![
        format!(
            "{:<20}  {:<9}  {:<9}  {:<40}  ENV",
            "NAME", "STATUS", "TRANSPORT", "COMMAND"
        ),
        "-".repeat(90),
    ];

    for name in document.server_names() {
        let row = match document.definition(name) {
            Some(Ok(definition)) => {
                let status = if document.is_disabled(name) {
                    "disabled"
                } else {
                    "enabled"
                };
                let command = std::iter::once(definition.command.as_str())
                    .chain(definition.args.iter().map(String::as_str))
                    .collect::<Vec<_>>()
                    .join(" ");
                let env_keys: Vec<&str> = definition.env.keys().map(String::as_str).collect();
                format!(
                    "{:<20}  {status:<9}  {:<9}  {:<40}  {}",
                    truncate_string(name, 20),
                    definition.transport.to_string(),
                    truncate_string(&command, 40),
                    env_keys.join(",")
                )
            }
            Some(Err(e)) => format!("{:<20}  {:<9}  {e}", truncate_string(name, 20), "invalid"),
            None => continue,
        };
        rows.push(row);
    }
    rows
}
