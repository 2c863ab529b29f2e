//! Rendering of per-server reports.

use std::fmt::Display;

use agentctl_config::{ConfigWarning, SkippedServer};
use agentctl_core::{Outcome, Report};

use super::tables::{format_optional, print_separator, truncate_string};

const NAME_WIDTH: usize = 24;
const OUTCOME_WIDTH: usize = 52;

/// Print a report as `NAME  OUTCOME  ALIVE` rows followed by a summary.
pub fn print_report<T: Outcome + Display>(title: &str, report: &Report<T>) {
    if report.is_empty() {
        println!("{title}: no servers");
        return;
    }

    println!("{title}");
    println!("{:<NAME_WIDTH$}  {:<OUTCOME_WIDTH$}  ALIVE", "NAME", "OUTCOME");
    print_separator(NAME_WIDTH + OUTCOME_WIDTH + 9);
    for entry in report.entries() {
        println!(
            "{:<NAME_WIDTH$}  {:<OUTCOME_WIDTH$}  {}",
            truncate_string(&entry.name, NAME_WIDTH),
            truncate_string(&entry.outcome.to_string(), OUTCOME_WIDTH),
            format_optional(entry.alive.as_ref(), "-"),
        );
    }
    println!();
    println!("{}", summary_line(report));
}

/// `"3 servers, 1 failed"`-style summary.
pub fn summary_line<T: Outcome>(report: &Report<T>) -> String {
    let failed = report.failures().count();
    let noun = if report.len() == 1 { "server" } else { "servers" };
    if failed == 0 {
        format!("{} {noun}, all ok", report.len())
    } else {
        format!("{} {noun}, {failed} failed", report.len())
    }
}

/// Servers the reconciliation pass left out, one line each.
pub fn print_skipped(skipped: &[SkippedServer]) {
    for server in skipped {
        println!("skipped {}: {}", server.name, server.reason);
    }
}

/// Config warnings go to stderr so stdout stays parseable.
pub fn print_warnings(warnings: &[ConfigWarning]) {
    for warning in warnings {
        eprintln!("warning: {warning}");
        if let ConfigWarning::ConfigCorrupt {
            backup: Some(backup),
            ..
        } = warning
        {
            eprintln!("         previous content saved to {}", backup.display());
        }
    }
}
