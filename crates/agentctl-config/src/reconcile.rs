//! One reconciliation pass over the IDE config.
//!
//! Load, resolve credentials for the catalog, merge, save, and derive the
//! desired server set. Per-server problems are collected as values; only
//! a failure to read or write the config file is an error.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use agentctl_core::{ConfigDocument, DefinitionError, Environment, ServerDefinition};
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, CredentialSpec};
use crate::credentials::{CredentialResolver, ResolvedCredential, is_usable_secret};
use crate::error::{ConfigError, ConfigWarning};
use crate::store::{ConfigStore, LoadOutcome};

/// Asks the user for a credential no source could provide.
pub trait CredentialPrompt {
    fn ask(&self, server: &str, spec: &CredentialSpec) -> Option<String>;
}

/// Why a server is left out of the desired set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// None of the credential's names resolved to a value.
    CredentialMissing { names: Vec<String> },
    /// The stored entry carries `"disabled": true`.
    Disabled,
    /// The stored entry could not be interpreted.
    Invalid(DefinitionError),
}

impl SkipReason {
    /// Missing credentials and disabled entries are expected states;
    /// malformed entries are not.
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Invalid(_))
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CredentialMissing { names } => {
                write!(f, "credential missing (set {})", names.join(" or "))
            }
            Self::Disabled => write!(f, "disabled in config"),
            Self::Invalid(e) => write!(f, "invalid entry: {e}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedServer {
    pub name: String,
    pub reason: SkipReason,
}

#[derive(Default)]
pub struct ReconcileOptions<'p> {
    /// Compute everything but leave the file untouched.
    pub dry_run: bool,
    /// Consulted after every automatic source came up empty.
    pub prompt: Option<&'p dyn CredentialPrompt>,
}

impl fmt::Debug for ReconcileOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReconcileOptions")
            .field("dry_run", &self.dry_run)
            .field("prompt", &self.prompt.is_some())
            .finish()
    }
}

/// Result of a reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// The merged document (what was saved, or would have been).
    pub document: ConfigDocument,
    /// Servers that should be running, in name order.
    pub desired: Vec<ServerDefinition>,
    pub skipped: Vec<SkippedServer>,
    pub warnings: Vec<ConfigWarning>,
    pub saved: bool,
}

impl Reconciliation {
    pub fn is_skipped(&self, name: &str) -> bool {
        self.skipped.iter().any(|s| s.name == name)
    }

    pub fn desired_names(&self) -> impl Iterator<Item = &str> {
        self.desired.iter().map(|d| d.name.as_str())
    }
}

/// Run one pass: load, resolve, merge, save, derive the desired set.
///
/// Resolved credentials are mirrored into `env` under every synonym so
/// later placeholder expansion and spawned children see them.
pub fn reconcile(
    store: &ConfigStore,
    env: &mut Environment,
    catalog: &Catalog,
    resolver: &CredentialResolver,
    options: &ReconcileOptions<'_>,
) -> Result<Reconciliation, ConfigError> {
    let LoadOutcome { document, warnings } = store.load()?;

    let mut generated = BTreeMap::new();
    let mut skipped = Vec::new();

    for entry in catalog.entries() {
        let mut definition = entry.definition.clone();

        if let Some(spec) = &entry.credential {
            let found = resolver
                .resolve_spec(entry.name(), spec, env, &document)
                .or_else(|| prompt_for(options.prompt, entry.name(), spec));

            let Some(credential) = found else {
                warn!(
                    server = %entry.name(),
                    names = ?spec.names,
                    "Credential missing, skipping server"
                );
                skipped.push(SkippedServer {
                    name: entry.name().to_string(),
                    reason: SkipReason::CredentialMissing {
                        names: spec.names.clone(),
                    },
                });
                continue;
            };

            info!(server = %entry.name(), source = %credential.source, "Credential resolved");
            env.mirror(&spec.names, &credential.value);
            definition.env.insert(spec.env_key.clone(), credential.value);
        }

        generated.insert(definition.name.clone(), definition);
    }

    let document = ConfigStore::merge(document, &generated);
    let saved = if options.dry_run {
        debug!(path = %store.path().display(), "Dry run, config not written");
        false
    } else {
        store.save(&document)?;
        true
    };

    let already_skipped: BTreeSet<String> = skipped.iter().map(|s| s.name.clone()).collect();
    let mut desired = Vec::new();

    for name in document.server_names() {
        if already_skipped.contains(name) {
            continue;
        }
        if document.is_disabled(name) {
            debug!(server = %name, "Server disabled in config");
            skipped.push(SkippedServer {
                name: name.to_string(),
                reason: SkipReason::Disabled,
            });
            continue;
        }

        match document.definition(name) {
            Some(Ok(definition)) => match definition.expanded_env(env) {
                Ok(_) => desired.push(definition),
                Err(DefinitionError::UnresolvedPlaceholder { var }) => {
                    warn!(server = %name, var = %var, "Placeholder unresolved, skipping server");
                    skipped.push(SkippedServer {
                        name: name.to_string(),
                        reason: SkipReason::CredentialMissing { names: vec![var] },
                    });
                }
                Err(e) => skipped.push(SkippedServer {
                    name: name.to_string(),
                    reason: SkipReason::Invalid(e),
                }),
            },
            Some(Err(e)) => {
                warn!(server = %name, error = %e, "Ignoring malformed server entry");
                skipped.push(SkippedServer {
                    name: name.to_string(),
                    reason: SkipReason::Invalid(e),
                });
            }
            None => {}
        }
    }

    Ok(Reconciliation {
        document,
        desired,
        skipped,
        warnings,
        saved,
    })
}

fn prompt_for(
    prompt: Option<&dyn CredentialPrompt>,
    server: &str,
    spec: &CredentialSpec,
) -> Option<ResolvedCredential> {
    let value = prompt?.ask(server, spec)?;
    let value = value.trim().to_string();
    is_usable_secret(&value).then(|| ResolvedCredential {
        value,
        source: "interactive prompt".to_string(),
    })
}
