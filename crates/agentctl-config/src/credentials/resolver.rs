//! Ordered credential resolution.

use std::fmt;
use std::path::PathBuf;

use agentctl_core::{ConfigDocument, Environment};
use tracing::debug;

use super::is_usable_secret;
use super::source::{ConfigEntrySource, CredentialSource, EnvVarSource, ShellProfileSource};
use crate::catalog::CredentialSpec;

/// A secret plus the description of the source that produced it.
///
/// `Debug` redacts the value.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedCredential {
    pub value: String,
    pub source: String,
}

impl fmt::Debug for ResolvedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedCredential")
            .field("value", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

/// Builds the standard source order and runs it.
///
/// Order: primary environment variable, synonym variables, the value
/// stored in the config document, then shell profiles (when enabled).
#[derive(Debug, Clone, Default)]
pub struct CredentialResolver {
    profile_files: Vec<PathBuf>,
}

impl CredentialResolver {
    /// Resolver that also scrapes the default shell profiles under `home`.
    pub fn for_environment(env: &Environment) -> Self {
        Self {
            profile_files: ShellProfileSource::default_files(env),
        }
    }

    /// Resolver that never reads shell profiles.
    pub fn without_profiles() -> Self {
        Self::default()
    }

    /// Resolver scraping exactly these profile files.
    pub const fn with_profile_files(profile_files: Vec<PathBuf>) -> Self {
        Self { profile_files }
    }

    /// Return the first usable value from `sources`, in order.
    ///
    /// Never fails: an absent credential is `None` and the caller decides
    /// whether to prompt or skip. Only the source description is logged.
    pub fn resolve(sources: &[Box<dyn CredentialSource + '_>]) -> Option<ResolvedCredential> {
        for source in sources {
            if let Some(value) = source.lookup().filter(|v| is_usable_secret(v)) {
                let source = source.describe();
                debug!(source = %source, "Credential found");
                return Some(ResolvedCredential { value, source });
            }
        }
        debug!(tried = sources.len(), "No credential source produced a value");
        None
    }

    /// The standard source list for `spec` on server `server`.
    pub fn sources_for<'a>(
        &self,
        server: &str,
        spec: &CredentialSpec,
        env: &'a Environment,
        document: &'a ConfigDocument,
    ) -> Vec<Box<dyn CredentialSource + 'a>> {
        let mut sources: Vec<Box<dyn CredentialSource + 'a>> = spec
            .names
            .iter()
            .map(|name| {
                Box::new(EnvVarSource::new(env, name.clone())) as Box<dyn CredentialSource + 'a>
            })
            .collect();

        let mut keys = vec![spec.env_key.clone()];
        keys.extend(spec.names.iter().filter(|n| **n != spec.env_key).cloned());
        sources.push(Box::new(ConfigEntrySource::new(document, server, keys)));

        if !self.profile_files.is_empty() {
            sources.push(Box::new(ShellProfileSource::new(
                self.profile_files.clone(),
                spec.names.clone(),
            )));
        }
        sources
    }

    /// Resolve `spec` through the standard source order.
    pub fn resolve_spec(
        &self,
        server: &str,
        spec: &CredentialSpec,
        env: &Environment,
        document: &ConfigDocument,
    ) -> Option<ResolvedCredential> {
        let sources = self.sources_for(server, spec, env, document);
        let found = Self::resolve(&sources);
        if found.is_none() {
            debug!(server = %server, names = ?spec.names, "Credential missing");
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    struct Counting<'a> {
        value: Option<&'static str>,
        calls: &'a Cell<u32>,
    }

    fn counting<'a>(
        value: Option<&'static str>,
        calls: &'a Cell<u32>,
    ) -> Box<dyn CredentialSource + 'a> {
        Box::new(Counting { value, calls })
    }

    impl CredentialSource for Counting<'_> {
        fn describe(&self) -> String {
            "counting".to_string()
        }

        fn lookup(&self) -> Option<String> {
            self.calls.set(self.calls.get() + 1);
            self.value.map(str::to_string)
        }
    }

    fn github_spec() -> CredentialSpec {
        CredentialSpec::new(
            ["GITHUB_PERSONAL_ACCESS_TOKEN", "GITHUB_TOKEN"],
            "GITHUB_PERSONAL_ACCESS_TOKEN",
        )
    }

    #[test]
    fn resolve_stops_at_first_usable_value() {
        let first = Cell::new(0);
        let second = Cell::new(0);
        let third = Cell::new(0);
        let sources = vec![
            counting(Some(""), &first),
            counting(Some("found"), &second),
            counting(Some("later"), &third),
        ];

        let resolved = CredentialResolver::resolve(&sources).unwrap();
        assert_eq!(resolved.value, "found");
        assert_eq!((first.get(), second.get(), third.get()), (1, 1, 0));
    }

    #[test]
    fn resolve_returns_none_when_every_source_is_empty() {
        let calls = Cell::new(0);
        let sources = vec![counting(None, &calls)];
        assert!(CredentialResolver::resolve(&sources).is_none());
        assert!(CredentialResolver::resolve(&[]).is_none());
    }

    #[test]
    fn alternate_variable_is_found() {
        let env = Environment::new().with_var("GITHUB_TOKEN", "ghp_alt");
        let resolved = CredentialResolver::without_profiles()
            .resolve_spec("github", &github_spec(), &env, &ConfigDocument::new())
            .unwrap();
        assert_eq!(resolved.value, "ghp_alt");
        assert_eq!(resolved.source, "environment variable GITHUB_TOKEN");
    }

    #[test]
    fn environment_beats_config_beats_profile() {
        let temp = tempfile::tempdir().unwrap();
        let profile = temp.path().join(".zshrc");
        std::fs::write(&profile, "export GITHUB_TOKEN=from-profile\n").unwrap();
        let resolver = CredentialResolver::with_profile_files(vec![profile]);

        let document = ConfigDocument::from_value(json!({
            "mcpServers": { "github": {
                "command": "npx",
                "env": { "GITHUB_PERSONAL_ACCESS_TOKEN": "from-config" }
            }}
        }))
        .unwrap();
        let spec = github_spec();

        let env = Environment::new().with_var("GITHUB_PERSONAL_ACCESS_TOKEN", "from-env");
        let value = |env: &Environment, doc: &ConfigDocument| {
            resolver.resolve_spec("github", &spec, env, doc).map(|c| c.value)
        };

        assert_eq!(value(&env, &document).as_deref(), Some("from-env"));
        assert_eq!(value(&Environment::new(), &document).as_deref(), Some("from-config"));
        assert_eq!(
            value(&Environment::new(), &ConfigDocument::new()).as_deref(),
            Some("from-profile")
        );
    }

    #[test]
    fn debug_output_redacts_value() {
        let credential = ResolvedCredential {
            value: "ghp_secret".to_string(),
            source: "test".to_string(),
        };
        let rendered = format!("{credential:?}");
        assert!(!rendered.contains("ghp_secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
