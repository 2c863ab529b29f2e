//! Persistence of the IDE's MCP config file and credential resolution.
//!
//! The [`reconcile`] pass ties the pieces together: it loads the
//! document, resolves the credentials the built-in catalog needs, merges
//! the generated definitions without touching unrelated user data, saves
//! the result and derives the set of servers that should be running.
#![deny(unused_crate_dependencies)]

// Dev-dependencies used by tests/ only
#[cfg(test)]
use proptest as _;

pub mod catalog;
pub mod credentials;
mod error;
pub mod reconcile;
pub mod store;

pub use catalog::{Catalog, CatalogEntry, CredentialSpec};
pub use credentials::{
    ConfigEntrySource, CredentialResolver, CredentialSource, EnvVarSource, ResolvedCredential,
    ShellProfileSource,
};
pub use error::{ConfigError, ConfigWarning};
pub use reconcile::{
    CredentialPrompt, ReconcileOptions, Reconciliation, SkipReason, SkippedServer, reconcile,
};
pub use store::{ConfigStore, LoadOutcome};
