//! Command handlers.
//!
//! Handlers are thin wrappers that:
//! 1. Turn CLI arguments into library options
//! 2. Call the config and runtime crates through `CliContext`
//! 3. Format output for the terminal and pick the exit code
//!
//! Orchestration commands return the exit code of their aggregate report.

pub mod cleanup;
pub mod config;
pub mod paths;
pub mod start;
pub mod stop;
pub mod test;
