//! CLI entry point - the composition root.
//!
//! This is the ONLY place where infrastructure is wired together via
//! bootstrap. Command dispatch routes to handlers.

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use agentctl_cli::handlers::start::StartArgs;
use agentctl_cli::{Cli, CliConfig, CliError, Commands, bootstrap, handlers};

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .ok();
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let Some(command) = cli.command.as_ref() else {
        Cli::command().print_help()?;
        return Ok(agentctl_cli::EXIT_OK);
    };

    let mut ctx = bootstrap(CliConfig::from_cli(&cli))?;

    let code = match command {
        Commands::Start {
            force,
            prompt,
            dry_run,
        } => {
            let args = StartArgs {
                force: *force,
                prompt: *prompt,
                dry_run: *dry_run,
            };
            handlers::start::execute(&mut ctx, args).await?
        }
        Commands::Restart { prompt } => handlers::start::restart(&mut ctx, *prompt).await?,
        Commands::Stop { names } => handlers::stop::execute(&ctx, names).await?,
        Commands::Test => handlers::test::execute(&mut ctx).await?,
        Commands::Cleanup => {
            handlers::cleanup::execute(&ctx)?;
            agentctl_cli::EXIT_OK
        }
        Commands::Config { command } => handlers::config::execute(&mut ctx, command)?,
        Commands::Paths => {
            handlers::paths::execute(&ctx);
            agentctl_cli::EXIT_OK
        }
    };
    Ok(code)
}

#[tokio::main]
async fn main() {
    // Load .env before the environment snapshot is taken
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            let mapped = CliError::from_anyhow(&e);
            eprintln!("error: {e:#}");
            mapped.exit_code()
        }
    };
    std::process::exit(code);
}
