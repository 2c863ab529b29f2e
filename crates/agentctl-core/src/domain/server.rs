//! Server definition domain types.
//!
//! A `ServerDefinition` describes one helper process: what to execute,
//! with which arguments and environment, and how to tell whether it is
//! alive.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::environment::Environment;

/// Errors raised while interpreting a stored server entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("server entry is not a JSON object")]
    NotAnObject,

    #[error("server entry has no command")]
    MissingCommand,

    #[error("invalid `{field}` field: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("unknown transport type: {0}")]
    UnknownTransport(String),

    #[error("environment placeholder ${{{var}}} could not be resolved")]
    UnresolvedPlaceholder { var: String },
}

/// How the supervisor talks to (and probes) a server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Transport {
    /// Request/response over the child's stdio; liveness is a process-table match.
    #[default]
    Stdio,
    /// Loopback TCP port; liveness is a bounded connect attempt.
    Tcp { port: u16 },
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::Tcp { port } => write!(f, "tcp:{port}"),
        }
    }
}

impl FromStr for Transport {
    type Err = DefinitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("stdio") {
            return Ok(Self::Stdio);
        }
        if let Some(port) = s.strip_prefix("tcp:") {
            return port
                .parse::<u16>()
                .ok()
                .filter(|p| *p != 0)
                .map(|port| Self::Tcp { port })
                .ok_or_else(|| DefinitionError::UnknownTransport(s.to_string()));
        }
        Err(DefinitionError::UnknownTransport(s.to_string()))
    }
}

/// One logical helper process.
///
/// Regenerated on every reconciliation pass and immutable for the rest of
/// the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerDefinition {
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub transport: Transport,
}

impl ServerDefinition {
    /// Create a stdio server definition.
    pub fn stdio<I, S>(name: impl Into<String>, command: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            command: command.into(),
            args: args.into_iter().map(Into::into).collect(),
            env: BTreeMap::new(),
            transport: Transport::Stdio,
        }
    }

    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    /// Interpret a stored `mcpServers.<name>` object.
    ///
    /// Unknown keys are ignored here; they stay in the stored entry.
    pub fn from_entry(name: &str, entry: &Value) -> Result<Self, DefinitionError> {
        let obj = entry.as_object().ok_or(DefinitionError::NotAnObject)?;

        let command = match obj.get("command") {
            Some(Value::String(c)) if !c.trim().is_empty() => c.clone(),
            Some(Value::String(_)) | None | Some(Value::Null) => {
                return Err(DefinitionError::MissingCommand);
            }
            Some(_) => {
                return Err(DefinitionError::InvalidField {
                    field: "command",
                    reason: "expected a string".to_string(),
                });
            }
        };

        let args = match obj.get("args") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| DefinitionError::InvalidField {
                            field: "args",
                            reason: format!("expected strings, found {item}"),
                        })
                })
                .collect::<Result<_, _>>()?,
            Some(_) => {
                return Err(DefinitionError::InvalidField {
                    field: "args",
                    reason: "expected an array".to_string(),
                });
            }
        };

        let env = match obj.get("env") {
            None | Some(Value::Null) => BTreeMap::new(),
            Some(Value::Object(vars)) => vars
                .iter()
                .map(|(k, v)| match v {
                    Value::String(s) => Ok((k.clone(), s.clone())),
                    Value::Number(n) => Ok((k.clone(), n.to_string())),
                    Value::Bool(b) => Ok((k.clone(), b.to_string())),
                    _ => Err(DefinitionError::InvalidField {
                        field: "env",
                        reason: format!("value for {k} is not a scalar"),
                    }),
                })
                .collect::<Result<_, _>>()?,
            Some(_) => {
                return Err(DefinitionError::InvalidField {
                    field: "env",
                    reason: "expected an object".to_string(),
                });
            }
        };

        let transport = match obj.get("type") {
            None | Some(Value::Null) => Transport::Stdio,
            Some(Value::String(t)) => t.parse()?,
            Some(_) => {
                return Err(DefinitionError::InvalidField {
                    field: "type",
                    reason: "expected a string".to_string(),
                });
            }
        };

        Ok(Self {
            name: name.to_string(),
            command,
            args,
            env,
            transport,
        })
    }

    /// The fields this tool owns inside a stored entry.
    ///
    /// Merging writes exactly these keys and leaves every other key alone.
    pub fn managed_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("command".to_string(), Value::String(self.command.clone()));
        fields.insert(
            "args".to_string(),
            Value::Array(self.args.iter().cloned().map(Value::String).collect()),
        );
        fields.insert(
            "env".to_string(),
            Value::Object(
                self.env
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            ),
        );
        fields.insert("type".to_string(), Value::String(self.transport.to_string()));
        fields
    }

    /// Command-line fragment used to find this server in the process table.
    ///
    /// The first non-flag argument (the package name for `npx`-style
    /// launchers), or the command's file name when there is none. This is a
    /// substring heuristic: two servers sharing the fragment cannot be told
    /// apart.
    pub fn process_pattern(&self) -> String {
        self.args
            .iter()
            .find(|arg| !arg.starts_with('-') && !arg.is_empty())
            .cloned()
            .unwrap_or_else(|| {
                Path::new(&self.command)
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or(&self.command)
                    .to_string()
            })
    }

    /// Expand `${NAME}` placeholders in `env` values from `environment`.
    pub fn expanded_env(
        &self,
        environment: &Environment,
    ) -> Result<BTreeMap<String, String>, DefinitionError> {
        self.env
            .iter()
            .map(|(k, v)| Ok((k.clone(), expand_placeholders(v, environment)?)))
            .collect()
    }

    /// Names of variables referenced through `${NAME}` placeholders.
    pub fn placeholder_vars(&self) -> Vec<String> {
        self.env
            .values()
            .flat_map(|v| placeholders(v))
            .collect()
    }
}

fn placeholders(value: &str) -> Vec<String> {
    let mut found = Vec::new();
    let mut rest = value;
    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            break;
        };
        found.push(after[..end].to_string());
        rest = &after[end + 1..];
    }
    found
}

fn expand_placeholders(value: &str, environment: &Environment) -> Result<String, DefinitionError> {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // Unterminated placeholder is kept literally
            out.push_str(&rest[start..]);
            return Ok(out);
        };
        let var = &after[..end];
        let resolved = environment
            .var(var)
            .ok_or_else(|| DefinitionError::UnresolvedPlaceholder {
                var: var.to_string(),
            })?;
        out.push_str(resolved);
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn transport_parses_and_displays() {
        assert_eq!("stdio".parse::<Transport>().unwrap(), Transport::Stdio);
        assert_eq!(
            "tcp:8931".parse::<Transport>().unwrap(),
            Transport::Tcp { port: 8931 }
        );
        assert_eq!(Transport::Tcp { port: 8931 }.to_string(), "tcp:8931");
        assert!("sse".parse::<Transport>().is_err());
        assert!("tcp:0".parse::<Transport>().is_err());
        assert!("tcp:http".parse::<Transport>().is_err());
    }

    #[test]
    fn from_entry_reads_all_fields() {
        let entry = json!({
            "command": "npx",
            "args": ["-y", "@modelcontextprotocol/server-github"],
            "env": {"GITHUB_PERSONAL_ACCESS_TOKEN": "t0k3n"},
            "type": "stdio",
            "alwaysAllow": ["search"]
        });

        let def = ServerDefinition::from_entry("github", &entry).unwrap();
        assert_eq!(def.name, "github");
        assert_eq!(def.command, "npx");
        assert_eq!(def.args.len(), 2);
        assert_eq!(def.env["GITHUB_PERSONAL_ACCESS_TOKEN"], "t0k3n");
        assert_eq!(def.transport, Transport::Stdio);
    }

    #[test]
    fn from_entry_defaults_missing_optional_fields() {
        let def = ServerDefinition::from_entry("bare", &json!({"command": "server"})).unwrap();
        assert!(def.args.is_empty());
        assert!(def.env.is_empty());
        assert_eq!(def.transport, Transport::Stdio);
    }

    #[test]
    fn from_entry_rejects_bad_shapes() {
        assert_eq!(
            ServerDefinition::from_entry("x", &json!("npx")),
            Err(DefinitionError::NotAnObject)
        );
        assert_eq!(
            ServerDefinition::from_entry("x", &json!({"args": []})),
            Err(DefinitionError::MissingCommand)
        );
        assert!(matches!(
            ServerDefinition::from_entry("x", &json!({"command": "a", "args": "b"})),
            Err(DefinitionError::InvalidField { field: "args", .. })
        ));
        assert!(matches!(
            ServerDefinition::from_entry("x", &json!({"command": "a", "type": "sse"})),
            Err(DefinitionError::UnknownTransport(_))
        ));
    }

    #[test]
    fn managed_fields_round_trip_through_from_entry() {
        let def = ServerDefinition::stdio("fs", "npx", ["-y", "pkg", "/tmp"])
            .with_env("A", "1")
            .with_transport(Transport::Tcp { port: 4000 });

        let value = Value::Object(def.managed_fields());
        assert_eq!(ServerDefinition::from_entry("fs", &value).unwrap(), def);
    }

    #[test]
    fn process_pattern_prefers_first_positional_arg() {
        let npx =
            ServerDefinition::stdio("gh", "npx", ["-y", "@modelcontextprotocol/server-github"]);
        assert_eq!(npx.process_pattern(), "@modelcontextprotocol/server-github");

        let bare = ServerDefinition::stdio("srv", "/usr/local/bin/my-server", ["--quiet"]);
        assert_eq!(bare.process_pattern(), "my-server");
    }

    #[test]
    fn expanded_env_substitutes_placeholders() {
        let def = ServerDefinition::stdio("gh", "npx", ["pkg"])
            .with_env("TOKEN", "${GITHUB_TOKEN}")
            .with_env("MIXED", "prefix-${USER}-suffix")
            .with_env("PLAIN", "value");
        let env = Environment::new()
            .with_var("GITHUB_TOKEN", "secret")
            .with_var("USER", "dev");

        let expanded = def.expanded_env(&env).unwrap();
        assert_eq!(expanded["TOKEN"], "secret");
        assert_eq!(expanded["MIXED"], "prefix-dev-suffix");
        assert_eq!(expanded["PLAIN"], "value");
        assert_eq!(def.placeholder_vars(), vec!["USER", "GITHUB_TOKEN"]);
    }

    #[test]
    fn expanded_env_reports_unresolved_placeholder() {
        let def = ServerDefinition::stdio("gh", "npx", ["pkg"]).with_env("TOKEN", "${MISSING}");
        assert_eq!(
            def.expanded_env(&Environment::new()),
            Err(DefinitionError::UnresolvedPlaceholder {
                var: "MISSING".to_string()
            })
        );
    }
}
