//! Main CLI parser and top-level argument handling.
//!
//! This module defines the root CLI structure with global options.

use clap::Parser;

use crate::commands::Commands;

/// Keep the IDE's MCP helper servers configured and running.
#[derive(Parser)]
#[command(name = "agentctl")]
#[command(about = "Configure, start, stop and probe MCP helper servers")]
#[command(version)]
pub struct Cli {
    /// IDE MCP config file (default: ~/.cursor/mcp.json)
    #[arg(long, global = true, env = "AGENTCTL_CONFIG")]
    pub config: Option<String>,

    /// Directory for logs and the process manifest
    #[arg(long = "data-dir", global = true, env = "AGENTCTL_DATA_DIR")]
    pub data_dir: Option<String>,

    /// Workspace root exposed to the filesystem server (default: current directory)
    #[arg(long, global = true)]
    pub workspace: Option<String>,

    /// Upper bound for each liveness probe, in milliseconds
    #[arg(long = "probe-timeout-ms", global = true, default_value_t = 2000)]
    pub probe_timeout_ms: u64,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
