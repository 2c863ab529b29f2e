//! Built-in server catalog.
//!
//! These are the helpers agentctl writes into the IDE config on every
//! reconciliation. Servers the user added by hand are never generated here
//! but are still supervised when they appear in the document.

use std::path::Path;

use agentctl_core::ServerDefinition;

/// Launcher used by every built-in entry.
const NPX: &str = "npx";

/// A credential a server needs, known under one or more variable names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialSpec {
    /// Primary name first, then synonyms. All are kept mirrored once a
    /// value is found.
    pub names: Vec<String>,
    /// Key under the server's `env` table that receives the value.
    pub env_key: String,
}

impl CredentialSpec {
    pub fn new<I, S>(names: I, env_key: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            env_key: env_key.into(),
        }
    }

    pub fn primary(&self) -> &str {
        self.names.first().map_or(self.env_key.as_str(), String::as_str)
    }
}

/// One generated server plus the credential it depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub definition: ServerDefinition,
    pub credential: Option<CredentialSpec>,
}

impl CatalogEntry {
    pub const fn new(definition: ServerDefinition) -> Self {
        Self {
            definition,
            credential: None,
        }
    }

    #[must_use]
    pub fn requires(mut self, credential: CredentialSpec) -> Self {
        self.credential = Some(credential);
        self
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }
}

/// Ordered set of generated servers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub const fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// A catalog that generates nothing; only hand-written entries run.
    pub const fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// The stock helper set, with the filesystem server rooted at `workspace`.
    pub fn builtin(workspace: &Path) -> Self {
        let npx = |package: &str, extra: &[String]| {
            let mut args = vec!["-y".to_string(), package.to_string()];
            args.extend_from_slice(extra);
            args
        };

        Self::new(vec![
            CatalogEntry::new(ServerDefinition::stdio(
                "filesystem",
                NPX,
                npx(
                    "@modelcontextprotocol/server-filesystem",
                    &[workspace.display().to_string()],
                ),
            )),
            CatalogEntry::new(ServerDefinition::stdio(
                "puppeteer",
                NPX,
                npx("@modelcontextprotocol/server-puppeteer", &[]),
            )),
            CatalogEntry::new(ServerDefinition::stdio(
                "brave-search",
                NPX,
                npx("@modelcontextprotocol/server-brave-search", &[]),
            ))
            .requires(CredentialSpec::new(["BRAVE_API_KEY"], "BRAVE_API_KEY")),
            CatalogEntry::new(ServerDefinition::stdio(
                "github",
                NPX,
                npx("@modelcontextprotocol/server-github", &[]),
            ))
            .requires(CredentialSpec::new(
                ["GITHUB_PERSONAL_ACCESS_TOKEN", "GITHUB_TOKEN"],
                "GITHUB_PERSONAL_ACCESS_TOKEN",
            )),
        ])
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|entry| entry.name() == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(CatalogEntry::name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn builtin_roots_filesystem_at_workspace() {
        let catalog = Catalog::builtin(Path::new("/work/project"));
        let fs = catalog.get("filesystem").unwrap();
        assert_eq!(fs.definition.args.last().map(String::as_str), Some("/work/project"));
        assert!(fs.credential.is_none());
    }

    #[test]
    fn builtin_identity_patterns_are_distinct() {
        let catalog = Catalog::builtin(Path::new("/w"));
        let patterns: HashSet<String> = catalog
            .entries()
            .iter()
            .map(|e| e.definition.process_pattern())
            .collect();
        assert_eq!(patterns.len(), catalog.entries().len());
    }

    #[test]
    fn github_token_has_a_synonym() {
        let catalog = Catalog::builtin(Path::new("/w"));
        let spec = catalog.get("github").unwrap().credential.clone().unwrap();
        assert_eq!(spec.primary(), "GITHUB_PERSONAL_ACCESS_TOKEN");
        assert_eq!(spec.names.len(), 2);
        assert_eq!(spec.env_key, spec.primary());
    }
}
