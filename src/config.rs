//! Configuration for the todo backend.
//!
//! Supports YAML file and environment variable overrides. The cursor
//! signing secret is deliberately config-only: it must never be checked
//! into source, and `load()` refuses to run without one.

use serde::Deserialize;
use std::path::Path;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "TODOSERV_CONFIG";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "TODOSERV_LOG";
/// Environment variable for the cursor signing secret.
pub const CURSOR_SECRET_ENV_VAR: &str = "TODOSERV_CURSOR_SECRET";
/// Environment variable for the todo table name.
pub const TABLE_NAME_ENV_VAR: &str = "TODOSERV_TABLE_NAME";
/// Environment variable for a local DynamoDB endpoint.
pub const DYNAMO_ENDPOINT_ENV_VAR: &str = "TODOSERV_DYNAMO_ENDPOINT";
/// Environment variable for the search store endpoint.
pub const SEARCH_ENDPOINT_ENV_VAR: &str = "TODOSERV_SEARCH_ENDPOINT";

/// Backend configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Primary store configuration.
    pub store: StoreConfig,
    /// Search store configuration.
    pub search: SearchConfig,
    /// Pagination cursor configuration.
    pub cursor: CursorConfig,
}

/// Primary store configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// DynamoDB table holding todo items.
    pub table_name: String,
    /// Endpoint override for local development.
    pub endpoint_url: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            table_name: "todos".to_string(),
            endpoint_url: None,
        }
    }
}

/// Search store configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Base URL of the search store's HTTP API.
    pub endpoint: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            timeout_secs: 30,
        }
    }
}

/// Pagination cursor configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CursorConfig {
    /// HMAC signing secret; required, no in-source default.
    pub secret: String,
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. Config file
    /// 3. Defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var(CONFIG_ENV_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        let mut config = if Path::new(&config_path).exists() {
            Self::from_file(&config_path)?
        } else {
            Self::default()
        };

        config.apply_env_overrides();

        if config.cursor.secret.is_empty() {
            return Err(ConfigError::MissingCursorSecret);
        }
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;

        serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(table) = std::env::var(TABLE_NAME_ENV_VAR) {
            self.store.table_name = table;
        }
        if let Ok(endpoint) = std::env::var(DYNAMO_ENDPOINT_ENV_VAR) {
            self.store.endpoint_url = Some(endpoint);
        }
        if let Ok(endpoint) = std::env::var(SEARCH_ENDPOINT_ENV_VAR) {
            self.search.endpoint = endpoint;
        }
        if let Ok(secret) = std::env::var(CURSOR_SECRET_ENV_VAR) {
            self.cursor.secret = secret;
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}': {1}")]
    FileRead(String, String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Cursor signing secret not configured (set TODOSERV_CURSOR_SECRET)")]
    MissingCursorSecret,
}
