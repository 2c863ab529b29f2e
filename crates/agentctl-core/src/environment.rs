//! Explicit environment snapshot.
//!
//! Components never read process-global state directly. The composition
//! root captures the environment once via [`Environment::from_process`]
//! and passes it down; tests build one by hand.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::PathBuf;

#[cfg(unix)]
const PATH_SEPARATOR: char = ':';
#[cfg(windows)]
const PATH_SEPARATOR: char = ';';

/// Variables, home and working directory, passed explicitly to every
/// consumer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<String, String>,
    home: Option<PathBuf>,
    cwd: Option<PathBuf>,
}

impl Environment {
    /// Create an empty environment with no variables and no directories.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the current process environment.
    ///
    /// Variables whose names or values are not valid UTF-8 are skipped. An
    /// unreadable working directory is recorded as unknown.
    pub fn from_process() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();

        Self {
            vars,
            home: dirs::home_dir(),
            cwd: std::env::current_dir().ok(),
        }
    }

    /// Builder-style variable assignment.
    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Builder-style home directory assignment.
    #[must_use]
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    /// Builder-style working directory assignment.
    #[must_use]
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Look up a variable. Empty values are treated as unset.
    pub fn var(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Whether a non-empty value is present under `key`.
    pub fn is_set(&self, key: &str) -> bool {
        self.var(key).is_some()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    /// Assign the same value under every synonym in `keys`.
    pub fn mirror<S: AsRef<str>>(&mut self, keys: &[S], value: &str) {
        for key in keys {
            self.set(key.as_ref(), value);
        }
    }

    /// The user's home directory, if known.
    pub fn home(&self) -> Option<&PathBuf> {
        self.home.as_ref()
    }

    /// The working directory captured at startup, if known.
    pub fn cwd(&self) -> Option<&PathBuf> {
        self.cwd.as_ref()
    }

    /// Iterate over all variables in key order.
    pub fn vars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Split `PATH` into its non-empty entries.
    pub fn path_entries(&self) -> Vec<PathBuf> {
        self.var("PATH")
            .map(|path| {
                path.split(PATH_SEPARATOR)
                    .filter(|entry| !entry.is_empty())
                    .map(PathBuf::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Variables as `OsString` pairs, ready for `Command::envs`.
    pub fn to_os_pairs(&self) -> Vec<(OsString, OsString)> {
        self.vars
            .iter()
            .map(|(k, v)| (OsString::from(k), OsString::from(v)))
            .collect()
    }
}
