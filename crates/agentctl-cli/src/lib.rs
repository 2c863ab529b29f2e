//! `agentctl` command-line adapter.
//!
//! The binary in `main.rs` is the composition root; everything it needs
//! is exposed here so handlers and the parser can be tested directly.
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Dev-dependencies used by tests/ only
#[cfg(test)]
use tempfile as _;
#[cfg(test)]
use tokio_test as _;

// Used by main.rs only
use dotenvy as _;
use tokio as _;
use tracing_subscriber as _;

pub mod bootstrap;
pub mod commands;
pub mod config_commands;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;
pub mod utils;

pub use bootstrap::{CliConfig, CliContext, bootstrap};
pub use commands::Commands;
pub use config_commands::ConfigCommand;
pub use error::{CliError, EXIT_FAILED, EXIT_OK};
pub use parser::Cli;
