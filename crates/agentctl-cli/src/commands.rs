//! Main commands enum and primary subcommands.

use clap::Subcommand;

use crate::config_commands::ConfigCommand;

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Sync the config file, then start every configured server that is down
    Start {
        /// Stop and respawn servers even when they are running
        #[arg(short, long)]
        force: bool,
        /// Ask for missing credentials instead of skipping their servers
        #[arg(long)]
        prompt: bool,
        /// Show what would happen without writing or spawning anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Stop and respawn every configured server
    Restart {
        /// Ask for missing credentials instead of skipping their servers
        #[arg(long)]
        prompt: bool,
    },

    /// Stop servers (all of them when no name is given)
    Stop {
        /// Server names to stop
        names: Vec<String>,
    },

    /// Probe every configured server and report alive/down
    Test,

    /// Drop manifest entries whose process no longer exists
    Cleanup,

    /// Inspect or sync the IDE config file
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Show resolved paths for config, logs and manifest
    Paths,
}
