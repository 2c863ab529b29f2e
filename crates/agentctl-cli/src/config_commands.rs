//! Configuration management subcommands.

use clap::Subcommand;

/// Config file commands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// List configured servers (secret values are not shown)
    Show,
    /// Merge the built-in servers into the config file
    Sync {
        /// Show the result without writing the file
        #[arg(long)]
        dry_run: bool,
        /// Ask for missing credentials instead of skipping their servers
        #[arg(long)]
        prompt: bool,
    },
}
