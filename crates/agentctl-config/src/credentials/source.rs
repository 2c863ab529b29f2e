//! Concrete credential sources.

use std::fs;
use std::path::PathBuf;

use agentctl_core::{ConfigDocument, Environment};
use regex::Regex;
use tracing::debug;

use super::is_usable_secret;

/// One place a credential may be found.
///
/// Implementations must be read-only: looking up a value never changes
/// the underlying source.
pub trait CredentialSource {
    /// Human-readable origin, safe to log.
    fn describe(&self) -> String;

    /// The value held by this source, if any.
    fn lookup(&self) -> Option<String>;
}

/// A single variable in the injected environment.
#[derive(Debug, Clone)]
pub struct EnvVarSource<'a> {
    env: &'a Environment,
    var: String,
}

impl<'a> EnvVarSource<'a> {
    pub fn new(env: &'a Environment, var: impl Into<String>) -> Self {
        Self {
            env,
            var: var.into(),
        }
    }
}

impl CredentialSource for EnvVarSource<'_> {
    fn describe(&self) -> String {
        format!("environment variable {}", self.var)
    }

    fn lookup(&self) -> Option<String> {
        self.env.var(&self.var).map(str::to_string)
    }
}

/// A value already stored under `mcpServers.<server>.env` in the config.
///
/// `keys` are tried in order. Placeholders such as `${NAME}` do not count.
#[derive(Debug, Clone)]
pub struct ConfigEntrySource<'a> {
    document: &'a ConfigDocument,
    server: String,
    keys: Vec<String>,
}

impl<'a> ConfigEntrySource<'a> {
    pub fn new(document: &'a ConfigDocument, server: impl Into<String>, keys: Vec<String>) -> Self {
        Self {
            document,
            server: server.into(),
            keys,
        }
    }
}

impl CredentialSource for ConfigEntrySource<'_> {
    fn describe(&self) -> String {
        format!("config entry {}", self.server)
    }

    fn lookup(&self) -> Option<String> {
        self.keys
            .iter()
            .filter_map(|key| self.document.env_value(&self.server, key))
            .find(|value| is_usable_secret(value))
            .map(str::to_string)
    }
}

/// `NAME=value` / `export NAME="value"` lines in shell startup files.
///
/// Files are read in order; within one file the last assignment wins, as
/// it would when the shell sources it. Commented-out lines never match.
#[derive(Debug, Clone)]
pub struct ShellProfileSource {
    files: Vec<PathBuf>,
    names: Vec<String>,
}

impl ShellProfileSource {
    pub const fn new(files: Vec<PathBuf>, names: Vec<String>) -> Self {
        Self { files, names }
    }

    /// The usual interactive-shell startup files under `home`.
    pub fn default_files(env: &Environment) -> Vec<PathBuf> {
        env.home()
            .map(|home| {
                [".zshrc", ".bashrc", ".bash_profile", ".profile"]
                    .iter()
                    .map(|file| home.join(file))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn assignment_pattern(name: &str) -> Option<Regex> {
        let pattern = format!(
            r#"(?m)^[ \t]*(?:export[ \t]+)?{}[ \t]*=[ \t]*(?:"([^"\n]*)"|'([^'\n]*)'|([^\s#;]+))"#,
            regex::escape(name)
        );
        Regex::new(&pattern).ok()
    }

    fn scan(text: &str, pattern: &Regex) -> Option<String> {
        pattern
            .captures_iter(text)
            .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)))
            .map(|m| m.as_str().to_string())
            .filter(|value| is_usable_secret(value))
            .last()
    }
}

impl CredentialSource for ShellProfileSource {
    fn describe(&self) -> String {
        "shell profile".to_string()
    }

    fn lookup(&self) -> Option<String> {
        let patterns: Vec<Regex> = self
            .names
            .iter()
            .filter_map(|name| Self::assignment_pattern(name))
            .collect();

        for file in &self.files {
            let Ok(text) = fs::read_to_string(file) else {
                continue;
            };
            if let Some(value) = patterns.iter().find_map(|p| Self::scan(&text, p)) {
                debug!(file = %file.display(), "Credential found in shell profile");
                return Some(value);
            }
        }
        None
    }
}
