//! The IDE's MCP configuration document.
//!
//! The document is kept as raw JSON so that keys this tool does not
//! understand (top-level or per-server) survive every write unchanged.
//! `serde_json::Map` keeps keys sorted, which makes serialization
//! deterministic.

use serde_json::{Map, Value};
use thiserror::Error;

use super::server::{DefinitionError, ServerDefinition};

/// Top-level key holding the server table.
pub const MCP_SERVERS_KEY: &str = "mcpServers";

/// Why a parsed JSON value cannot be used as a config document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("top-level value is not a JSON object")]
    RootNotObject,

    #[error("`mcpServers` is not an object: {found}")]
    ServersNotObject { found: String },
}

/// Parsed configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDocument {
    servers: Map<String, Value>,
    extra: Map<String, Value>,
}

impl ConfigDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from a parsed JSON value.
    ///
    /// Fails when the root is not an object or `mcpServers` is present but
    /// not an object.
    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        let Value::Object(mut root) = value else {
            return Err(DocumentError::RootNotObject);
        };

        let servers = match root.remove(MCP_SERVERS_KEY) {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(servers)) => servers,
            Some(other) => {
                return Err(DocumentError::ServersNotObject {
                    found: other.to_string(),
                });
            }
        };

        Ok(Self {
            servers,
            extra: root,
        })
    }

    /// Serialize back to a JSON value.
    pub fn to_value(&self) -> Value {
        let mut root = self.extra.clone();
        root.insert(
            MCP_SERVERS_KEY.to_string(),
            Value::Object(self.servers.clone()),
        );
        Value::Object(root)
    }

    /// Pretty-printed JSON with a trailing newline.
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        let mut out = serde_json::to_string_pretty(&self.to_value())?;
        out.push('\n');
        Ok(out)
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty() && self.extra.is_empty()
    }

    /// Names of all stored servers, sorted.
    pub fn server_names(&self) -> impl Iterator<Item = &str> {
        self.servers.keys().map(String::as_str)
    }

    /// Raw stored entry for a server.
    pub fn entry(&self, name: &str) -> Option<&Value> {
        self.servers.get(name)
    }

    /// Top-level keys other than `mcpServers`.
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Parse a stored entry into a definition.
    pub fn definition(&self, name: &str) -> Option<Result<ServerDefinition, DefinitionError>> {
        self.servers
            .get(name)
            .map(|entry| ServerDefinition::from_entry(name, entry))
    }

    /// Whether the entry carries `"disabled": true`.
    pub fn is_disabled(&self, name: &str) -> bool {
        self.servers
            .get(name)
            .and_then(|entry| entry.get("disabled"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// A string value stored under `mcpServers.<server>.env.<key>`.
    pub fn env_value(&self, server: &str, key: &str) -> Option<&str> {
        self.servers
            .get(server)?
            .get("env")?
            .get(key)?
            .as_str()
    }

    /// Write a definition's managed fields into its entry.
    ///
    /// Inserts the entry when absent. When present, only `command`, `args`,
    /// `env` and `type` are overwritten; any other key already stored under
    /// that name is preserved.
    pub fn upsert(&mut self, definition: &ServerDefinition) {
        let slot = self
            .servers
            .entry(definition.name.clone())
            .or_insert_with(|| Value::Object(Map::new()));

        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }

        if let Value::Object(entry) = slot {
            for (key, value) in definition.managed_fields() {
                entry.insert(key, value);
            }
        }
    }

    /// Remove a server entry, returning it.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.servers.remove(name)
    }
}
