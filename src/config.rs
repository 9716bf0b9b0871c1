//! Configuration for kurly-store
//!
//! Values are layered: built-in defaults, then `~/.kurly-store/config.toml`
//! (or an explicit path), then environment variables. The resolved
//! [`AppConfig`] is passed explicitly into every operation so the same
//! binary can target several environments.

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnectOptions;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::env::{database as env_db, paths as env_paths, qdrant as env_qdrant};
use crate::error::StoreError;
use crate::services::qdrant::{Distance, RetryConfig};

lazy_static! {
    static ref SCHEMA_NAME: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
    static ref COLLECTION_NAME: Regex = Regex::new(r"^[A-Za-z0-9_-]+$").unwrap();
}

pub const DEFAULT_COLLECTION: &str = "kurly_skin";
pub const DEFAULT_VECTOR_SIZE: u64 = 1024;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub qdrant: QdrantConfig,
    #[serde(default)]
    pub retry: RetrySettings,
    /// Directory for provisioning lock files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Full connection URL; overrides host/port/user/password/name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub name: String,
    /// Postgres schema holding the tables and views (defaults to search_path)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: "localhost".to_string(),
            port: 5432,
            user: "root".to_string(),
            password: None,
            name: "kurly_reviews".to_string(),
            schema: None,
            max_connections: 5,
        }
    }
}

impl DatabaseConfig {
    /// Pool connect options. `url` wins when set; otherwise the parts are
    /// passed as-is, so reserved characters in the password need no escaping.
    pub fn connect_options(&self) -> std::result::Result<PgConnectOptions, StoreError> {
        if let Some(url) = &self.url {
            return PgConnectOptions::from_str(url).map_err(|e| {
                StoreError::invalid_config(format!("invalid database url: {e}"))
            });
        }

        let mut options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .database(&self.name);
        if let Some(password) = &self.password {
            options = options.password(password);
        }
        Ok(options)
    }

    /// Connection target for logs, never including the password
    pub fn display_url(&self) -> String {
        if self.url.is_some() {
            return format!("{} (from url)", self.name);
        }
        format!("{}@{}:{}/{}", self.user, self.host, self.port, self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QdrantConfig {
    pub url: String,
    pub collection: String,
    pub vector_size: u64,
    pub distance: Distance,
    pub timeout_secs: u64,
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6333".to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            vector_size: DEFAULT_VECTOR_SIZE,
            distance: Distance::Cosine,
            timeout_secs: 10,
        }
    }
}

impl QdrantConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Retry policy for the vector store health check
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: usize,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub total_timeout_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay_ms: 250,
            max_delay_ms: 5_000,
            total_timeout_ms: 30_000,
        }
    }
}

impl From<&RetrySettings> for RetryConfig {
    fn from(settings: &RetrySettings) -> Self {
        RetryConfig::new(settings.max_attempts)
            .with_initial_delay(Duration::from_millis(settings.initial_delay_ms))
            .with_max_delay(Duration::from_millis(settings.max_delay_ms))
            .with_total_timeout(Duration::from_millis(settings.total_timeout_ms))
    }
}

impl AppConfig {
    /// Get the default config file path (~/.kurly-store/config.toml)
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(env_paths::CONFIG_FILE) {
            return Ok(PathBuf::from(path));
        }
        Ok(config_dir()?.join("config.toml"))
    }

    /// Load defaults, then the config file, then environment overrides.
    ///
    /// A missing file at the default location is not an error; a missing
    /// file at an explicit path is.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = match explicit_path {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = Self::default_path()?;
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        // The file may hold a database password
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = fs::Permissions::from_mode(0o600);
            fs::set_permissions(path, permissions).with_context(|| {
                format!("Failed to set permissions on config file: {}", path.display())
            })?;
        }

        Ok(())
    }

    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var(env_db::DATABASE_URL) {
            self.database.url = Some(url);
        }
        if let Ok(host) = std::env::var(env_db::DB_HOST) {
            self.database.host = host;
        }
        if let Ok(port) = std::env::var(env_db::DB_PORT) {
            self.database.port = port
                .parse()
                .with_context(|| format!("{} is not a valid port: {port}", env_db::DB_PORT))?;
        }
        if let Ok(user) = std::env::var(env_db::DB_USER) {
            self.database.user = user;
        }
        if let Ok(password) = std::env::var(env_db::DB_PASSWORD) {
            self.database.password = Some(password);
        }
        if let Ok(name) = std::env::var(env_db::DB_NAME) {
            self.database.name = name;
        }
        if let Ok(schema) = std::env::var(env_db::DB_SCHEMA) {
            self.database.schema = Some(schema);
        }
        if let Ok(url) = std::env::var(env_qdrant::QDRANT_URL) {
            self.qdrant.url = url;
        }
        if let Ok(collection) = std::env::var(env_qdrant::COLLECTION) {
            self.qdrant.collection = collection;
        }
        Ok(())
    }

    pub fn validate(&self) -> std::result::Result<(), StoreError> {
        if self.database.url.is_none() && self.database.name.trim().is_empty() {
            return Err(StoreError::invalid_config("database name cannot be empty"));
        }
        if self.database.max_connections == 0 {
            return Err(StoreError::invalid_config(
                "database.max_connections must be at least 1",
            ));
        }
        if let Some(schema) = &self.database.schema {
            validate_schema_name(schema)?;
        }
        validate_collection_name(&self.qdrant.collection)?;
        if self.qdrant.url.trim().is_empty() {
            return Err(StoreError::invalid_config("qdrant.url cannot be empty"));
        }
        if self.qdrant.vector_size == 0 {
            return Err(StoreError::invalid_config(
                "qdrant.vector_size must be greater than zero",
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(StoreError::invalid_config(
                "retry.max_attempts must be at least 1",
            ));
        }
        Ok(())
    }

    /// Directory holding provisioning lock files
    pub fn lock_dir(&self) -> Result<PathBuf> {
        match &self.lock_dir {
            Some(dir) => Ok(dir.clone()),
            None => config_dir(),
        }
    }
}

/// The kurly-store configuration directory (~/.kurly-store)
pub fn config_dir() -> Result<PathBuf> {
    let home_dir = dirs::home_dir().context("Could not find home directory")?;
    Ok(home_dir.join(".kurly-store"))
}

/// Postgres schema names are interpolated into DDL, so only plain identifiers pass
pub fn validate_schema_name(name: &str) -> std::result::Result<(), StoreError> {
    if SCHEMA_NAME.is_match(name) {
        Ok(())
    } else {
        Err(StoreError::invalid_config(format!(
            "invalid schema name '{name}': use letters, digits and underscores"
        )))
    }
}

/// Collection names end up in URL paths
pub fn validate_collection_name(name: &str) -> std::result::Result<(), StoreError> {
    if COLLECTION_NAME.is_match(name) {
        Ok(())
    } else {
        Err(StoreError::invalid_config(format!(
            "invalid collection name '{name}': use letters, digits, '-' and '_'"
        )))
    }
}
