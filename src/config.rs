//! Warehouse and source configuration
//!
//! Values come from a TOML file, from environment variables, or both; env
//! values override file values. Empty variables count as unset.
//!
//! | Variable | Field | Default |
//! |---|---|---|
//! | `DATABRICKS_HOST` | `host` | required |
//! | `DATABRICKS_TOKEN` | `token` | required |
//! | `DATABRICKS_WAREHOUSE_ID` | `warehouse_id` | required |
//! | `DATABRICKS_CATALOG` | `catalog` | `blade_poc` |
//! | `DATABRICKS_SCHEMA` | `schema` | `logistics` |
//! | `BLADE_DATA_PATH` | `data_path` | `mock_blade_data/` |
//! | `BLADE_DATA_SOURCE` | `data_source` | `BLADE_LOGISTICS` |

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::warehouse::WarehouseTarget;

pub const ENV_HOST: &str = "DATABRICKS_HOST";
pub const ENV_TOKEN: &str = "DATABRICKS_TOKEN";
pub const ENV_WAREHOUSE_ID: &str = "DATABRICKS_WAREHOUSE_ID";
pub const ENV_CATALOG: &str = "DATABRICKS_CATALOG";
pub const ENV_SCHEMA: &str = "DATABRICKS_SCHEMA";
pub const ENV_DATA_PATH: &str = "BLADE_DATA_PATH";
pub const ENV_DATA_SOURCE: &str = "BLADE_DATA_SOURCE";

pub const DEFAULT_CATALOG: &str = "blade_poc";
pub const DEFAULT_SCHEMA: &str = "logistics";
pub const DEFAULT_DATA_PATH: &str = "mock_blade_data/";
pub const DEFAULT_DATA_SOURCE: &str = "BLADE_LOGISTICS";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required setting '{field}' ({env_var})")]
    Missing {
        field: &'static str,
        env_var: &'static str,
    },

    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(String),
}

impl ConfigError {
    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            ConfigError::Missing { field, env_var } => format!(
                "Missing required setting '{field}'.\n\nHint: Set {env_var} in the environment or in a .env file."
            ),
            ConfigError::Io { path, source } => format!(
                "Cannot read config file {}: {source}\n\nHint: Check that the file exists and is readable.",
                path.display()
            ),
            ConfigError::Parse(msg) => {
                format!("Invalid config file: {msg}\n\nHint: Check the TOML syntax and field names.")
            }
        }
    }
}

/// Connection and source settings
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WarehouseConfig {
    pub host: String,
    token: String,
    pub warehouse_id: String,
    pub catalog: String,
    pub schema: String,
    pub data_path: PathBuf,
    pub data_source: String,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            token: String::new(),
            warehouse_id: String::new(),
            catalog: DEFAULT_CATALOG.to_string(),
            schema: DEFAULT_SCHEMA.to_string(),
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            data_source: DEFAULT_DATA_SOURCE.to_string(),
        }
    }
}

impl WarehouseConfig {
    /// Defaults overridden by the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by values from `lookup`
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::default().with_overrides(lookup)
    }

    /// Parse a TOML document; absent fields keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Replace fields with non-empty values from `lookup`
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_HOST) {
            self.host = v;
        }
        if let Some(v) = get(ENV_TOKEN) {
            self.token = v;
        }
        if let Some(v) = get(ENV_WAREHOUSE_ID) {
            self.warehouse_id = v;
        }
        if let Some(v) = get(ENV_CATALOG) {
            self.catalog = v;
        }
        if let Some(v) = get(ENV_SCHEMA) {
            self.schema = v;
        }
        if let Some(v) = get(ENV_DATA_PATH) {
            self.data_path = PathBuf::from(v);
        }
        if let Some(v) = get(ENV_DATA_SOURCE) {
            self.data_source = v;
        }
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Check that the connection settings are present
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("host", ENV_HOST, &self.host),
            ("token", ENV_TOKEN, &self.token),
            ("warehouse_id", ENV_WAREHOUSE_ID, &self.warehouse_id),
            ("catalog", ENV_CATALOG, &self.catalog),
            ("schema", ENV_SCHEMA, &self.schema),
        ];

        for (field, env_var, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing { field, env_var });
            }
        }
        Ok(())
    }

    /// Destination warehouse and namespace
    pub fn target(&self) -> WarehouseTarget {
        WarehouseTarget::new(&self.warehouse_id, &self.catalog, &self.schema)
    }
}

impl std::fmt::Debug for WarehouseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let token = if self.token.is_empty() { "<unset>" } else { "<redacted>" };
        f.debug_struct("WarehouseConfig")
            .field("host", &self.host)
            .field("token", &token)
            .field("warehouse_id", &self.warehouse_id)
            .field("catalog", &self.catalog)
            .field("schema", &self.schema)
            .field("data_path", &self.data_path)
            .field("data_source", &self.data_source)
            .finish()
    }
}
