//! Configuration for the Docket query engine and its CLI

use crate::error::{DocketError, Result};
use crate::query::SearchField;
use docket_common::{
    parse_bool, split_list, DEFAULT_DATABASE_FILENAME, DEFAULT_PAGE_LIMIT, DEFAULT_SERVER_PORT,
    DEFAULT_STORE_TIMEOUT_SECS, MAX_PAGE_LIMIT,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Page size used when the request does not supply `limit`
    pub default_limit: u32,
    /// Upper bound `limit` is clamped to
    pub max_limit: u32,
    /// Fields searched when the request does not supply `searchFields`
    pub default_search_fields: Vec<SearchField>,
    /// Timeout applied to each store read, in seconds
    pub store_timeout_secs: u64,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub server: ServerConfig,
}

/// SQLite store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
    /// Write logs to this file instead of stderr
    pub file: Option<PathBuf>,
}

/// HTTP server configuration for `docket serve`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_PAGE_LIMIT,
            max_limit: MAX_PAGE_LIMIT,
            default_search_fields: vec![SearchField::Title, SearchField::Description],
            store_timeout_secs: DEFAULT_STORE_TIMEOUT_SECS,
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DATABASE_FILENAME),
            max_connections: 5,
            connect_timeout_secs: 10,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_SERVER_PORT,
        }
    }
}

impl QueryConfig {
    /// Timeout applied to each store read
    #[must_use]
    pub const fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }

    /// Load configuration from a YAML (`.yaml`/`.yml`) or JSON file
    ///
    /// Keys missing from the file keep their default values.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            DocketError::Io(std::io::Error::other(format!(
                "Failed to read config file {}: {e}",
                path.display()
            )))
        })?;

        if is_yaml(path) {
            serde_yaml::from_str(&content).map_err(|e| {
                DocketError::configuration(format!("Failed to parse YAML config: {e}"))
            })
        } else {
            serde_json::from_str(&content).map_err(|e| {
                DocketError::configuration(format!("Failed to parse JSON config: {e}"))
            })
        }
    }

    /// Save configuration to a file, choosing the format from the extension
    ///
    /// # Errors
    /// Returns an error if serialization or writing fails
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = if is_yaml(path) {
            serde_yaml::to_string(self).map_err(|e| {
                DocketError::configuration(format!("Failed to serialize YAML config: {e}"))
            })?
        } else {
            serde_json::to_string_pretty(self)?
        };
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Defaults overridden by `DOCKET_*` environment variables
    ///
    /// # Errors
    /// Returns an error if a variable is set to an unparsable value
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Override fields from `DOCKET_*` environment variables
    ///
    /// # Errors
    /// Returns an error if a variable is set to an unparsable value
    pub fn apply_env(&mut self) -> Result<()> {
        if let Some(v) = env_parse::<u32>("DOCKET_DEFAULT_LIMIT")? {
            self.default_limit = v;
        }
        if let Some(v) = env_parse::<u32>("DOCKET_MAX_LIMIT")? {
            self.max_limit = v;
        }
        if let Ok(fields) = std::env::var("DOCKET_SEARCH_FIELDS") {
            self.default_search_fields = split_list(&fields)
                .iter()
                .map(|f| f.parse::<SearchField>())
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| {
                    DocketError::configuration(format!("Invalid DOCKET_SEARCH_FIELDS value: {e}"))
                })?;
        }
        if let Some(v) = env_parse::<u64>("DOCKET_STORE_TIMEOUT")? {
            self.store_timeout_secs = v;
        }
        if let Ok(path) = std::env::var("DOCKET_DATABASE_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Some(v) = env_parse::<u32>("DOCKET_DB_MAX_CONNECTIONS")? {
            self.database.max_connections = v;
        }
        if let Ok(level) = std::env::var("DOCKET_LOG_LEVEL") {
            self.logging.level = level.to_lowercase();
        }
        if let Ok(json) = std::env::var("DOCKET_LOG_JSON") {
            self.logging.json = parse_bool(&json).ok_or_else(|| {
                DocketError::configuration(format!("Invalid DOCKET_LOG_JSON value: {json}"))
            })?;
        }
        if let Ok(file) = std::env::var("DOCKET_LOG_FILE") {
            self.logging.file = Some(PathBuf::from(file));
        }
        if let Ok(host) = std::env::var("DOCKET_HOST") {
            self.server.host = host;
        }
        if let Some(v) = env_parse::<u16>("DOCKET_PORT")? {
            self.server.port = v;
        }
        Ok(())
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// Returns an error describing the first invalid setting
    pub fn validate(&self) -> Result<()> {
        if self.max_limit == 0 {
            return Err(DocketError::configuration("max_limit must be at least 1"));
        }
        if self.default_limit == 0 || self.default_limit > self.max_limit {
            return Err(DocketError::configuration(format!(
                "default_limit must be between 1 and max_limit ({})",
                self.max_limit
            )));
        }
        if self.default_search_fields.is_empty() {
            return Err(DocketError::configuration(
                "default_search_fields cannot be empty",
            ));
        }
        if self.store_timeout_secs == 0 {
            return Err(DocketError::configuration(
                "store_timeout_secs must be greater than 0",
            ));
        }
        if self.database.max_connections == 0 {
            return Err(DocketError::configuration(
                "database.max_connections must be greater than 0",
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(DocketError::configuration(format!(
                "Invalid log level: {}. Must be one of: {}",
                self.logging.level,
                valid_levels.join(", ")
            )));
        }
        Ok(())
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml" | "yml")
    )
}

fn env_parse<T: FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| DocketError::configuration(format!("Invalid {name} value: {raw}"))),
        Err(_) => Ok(None),
    }
}
