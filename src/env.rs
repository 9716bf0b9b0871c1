//! Environment variable constants used throughout the application
//!
//! This module centralizes all environment variable names so the config
//! layer, logging and tests agree on them.

/// Logging configuration
pub mod logging {
    /// Log level configuration (e.g., "debug", "info", "warn", "error")
    pub const LOG_LEVEL: &str = "KURLY_LOG_LEVEL";

    /// Log file path for file-based logging
    pub const LOG_FILE: &str = "KURLY_LOG_FILE";

    /// Emit logs as JSON lines when set to "1" or "true"
    pub const LOG_JSON: &str = "KURLY_LOG_JSON";

    /// Disable colored output (follows the NO_COLOR standard)
    pub const NO_COLOR: &str = "NO_COLOR";
}

/// Relational store connection
pub mod database {
    /// Full connection URL; wins over the individual parts below
    pub const DATABASE_URL: &str = "KURLY_DATABASE_URL";

    pub const DB_HOST: &str = "KURLY_DB_HOST";
    pub const DB_PORT: &str = "KURLY_DB_PORT";
    pub const DB_USER: &str = "KURLY_DB_USER";
    pub const DB_PASSWORD: &str = "KURLY_DB_PASSWORD";
    pub const DB_NAME: &str = "KURLY_DB_NAME";

    /// Postgres schema that holds the tables and views
    pub const DB_SCHEMA: &str = "KURLY_DB_SCHEMA";
}

/// Vector store connection
pub mod qdrant {
    /// Base URL of the Qdrant HTTP API
    pub const QDRANT_URL: &str = "KURLY_QDRANT_URL";

    /// Collection name to provision
    pub const COLLECTION: &str = "KURLY_COLLECTION";
}

/// Location of the config file and lock files
pub mod paths {
    /// Override for the config file path
    pub const CONFIG_FILE: &str = "KURLY_CONFIG";
}
