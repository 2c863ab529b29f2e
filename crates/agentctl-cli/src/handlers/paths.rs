//! Paths command handler.
//!
//! Displays all resolved paths for diagnostics and debugging.

use crate::bootstrap::CliContext;

/// Print every resolved path in `key = value` format.
pub fn execute(ctx: &CliContext) {
    println!("{}", ctx.paths);
}
