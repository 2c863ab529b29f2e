//! CLI bootstrap - the composition root.
//!
//! This module is the ONLY place where infrastructure is wired together
//! for the CLI adapter:
//! - Environment snapshot and resolved paths (via agentctl-core)
//! - Config store, credential resolver and catalog (via agentctl-config)
//! - Process table and supervisor (via agentctl-runtime)
//!
//! Command handlers receive the composed `CliContext`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use agentctl_config::{
    Catalog, ConfigStore, CredentialResolver, ReconcileOptions, Reconciliation, reconcile,
};
use agentctl_core::paths::absolutize;
use agentctl_core::{Environment, ResolvedPaths, ServerDefinition};
use agentctl_runtime::{Supervisor, SupervisorConfig, SystemProcessTable};

use crate::parser::Cli;

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// `--config` override.
    pub config_path: Option<String>,
    /// `--data-dir` override.
    pub data_dir: Option<String>,
    /// Workspace root handed to the filesystem server.
    pub workspace: Option<PathBuf>,
    /// Upper bound for each liveness probe.
    pub probe_timeout: Duration,
}

impl CliConfig {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            config_path: cli.config.clone(),
            data_dir: cli.data_dir.clone(),
            workspace: cli.workspace.as_ref().map(PathBuf::from),
            probe_timeout: Duration::from_millis(cli.probe_timeout_ms),
        }
    }
}

/// Fully composed context for CLI commands.
pub struct CliContext {
    /// Snapshot of the process environment; credentials found during
    /// reconciliation are mirrored into it.
    pub env: Environment,
    pub paths: ResolvedPaths,
    pub store: ConfigStore,
    pub catalog: Catalog,
    pub resolver: CredentialResolver,
    pub supervisor_config: SupervisorConfig,
}

impl CliContext {
    /// Run the reconciliation pass against the config file.
    pub fn reconcile(&mut self, options: &ReconcileOptions<'_>) -> Result<Reconciliation> {
        let reconciliation = reconcile(
            &self.store,
            &mut self.env,
            &self.catalog,
            &self.resolver,
            options,
        )?;
        for warning in &reconciliation.warnings {
            warn!("{warning}");
        }
        Ok(reconciliation)
    }

    /// Every identity the supervisor should know for pattern sweeps: valid
    /// config entries plus the built-in catalog, without resolving any
    /// credential.
    pub fn known_definitions(&self) -> Result<Vec<ServerDefinition>> {
        let loaded = self.store.load()?;
        let mut definitions: Vec<ServerDefinition> = self
            .catalog
            .entries()
            .iter()
            .map(|entry| entry.definition.clone())
            .collect();

        for name in loaded.document.server_names() {
            match loaded.document.definition(name) {
                Some(Ok(definition)) => {
                    definitions.retain(|d| d.name != definition.name);
                    definitions.push(definition);
                }
                Some(Err(e)) => debug!(server = %name, error = %e, "Ignoring invalid entry"),
                None => {}
            }
        }
        Ok(definitions)
    }

    /// A supervisor over the current environment that knows `definitions`.
    pub fn supervisor(&self, definitions: &[ServerDefinition]) -> Supervisor {
        let mut supervisor = Supervisor::new(
            &self.paths,
            self.env.clone(),
            Arc::new(SystemProcessTable::new()),
        )
        .with_config(self.supervisor_config);
        supervisor.register(definitions.iter().cloned());
        supervisor
    }
}

/// Bootstrap the CLI application.
///
/// Captures the process environment once, resolves paths (creating the
/// logs directory) and assembles the config-side services.
pub fn bootstrap(config: CliConfig) -> Result<CliContext> {
    let env = Environment::from_process();
    let paths = ResolvedPaths::resolve_with_overrides(
        &env,
        config.config_path.as_deref(),
        config.data_dir.as_deref(),
    )?;
    paths.ensure_dirs()?;

    let workspace = match config.workspace {
        Some(dir) => absolutize(&dir, &env)?,
        None => env
            .cwd()
            .cloned()
            .context("Cannot determine current directory")?,
    };
    debug!(paths = %paths, workspace = %workspace.display(), "Bootstrapped");

    Ok(CliContext {
        store: ConfigStore::new(paths.config_path.clone()),
        catalog: Catalog::builtin(&workspace),
        resolver: CredentialResolver::for_environment(&env),
        supervisor_config: SupervisorConfig {
            probe_timeout: config.probe_timeout,
            ..SupervisorConfig::default()
        },
        env,
        paths,
    })
}
