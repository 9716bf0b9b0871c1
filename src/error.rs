use std::path::PathBuf;

use thiserror::Error;

use crate::services::provisioning::ProvisionError;
use crate::services::qdrant::QdrantError;

/// Error type for every library operation in kurly-store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("Data integrity violation: {message}")]
    Integrity { message: String },

    #[error("Validation error: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(
        "Another provisioning run holds the lock at {}{}",
        path.display(),
        holder_hint(holder)
    )]
    Lock {
        path: PathBuf,
        /// Process id recorded in the lock file, when readable
        holder: Option<u32>,
    },

    #[error("Vector store error: {0}")]
    Qdrant(#[from] QdrantError),

    #[error("Provisioning failed: {0}")]
    Provision(#[from] ProvisionError),
}

fn holder_hint(holder: &Option<u32>) -> String {
    match holder {
        Some(pid) => format!(" (pid {pid}; remove the file if that process is gone)"),
        None => " (holder unknown; remove the file if no run is active)".to_string(),
    }
}

/// SQLSTATE for `check_violation`
const CHECK_VIOLATION: &str = "23514";
/// SQLSTATE for `unique_violation`
const UNIQUE_VIOLATION: &str = "23505";
/// SQLSTATE for `not_null_violation`
const NOT_NULL_VIOLATION: &str = "23502";
/// SQLSTATE for `foreign_key_violation`
const FOREIGN_KEY_VIOLATION: &str = "23503";

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_error) = &error {
            let code = db_error.code();
            let is_integrity = matches!(
                code.as_deref(),
                Some(CHECK_VIOLATION)
                    | Some(UNIQUE_VIOLATION)
                    | Some(NOT_NULL_VIOLATION)
                    | Some(FOREIGN_KEY_VIOLATION)
            );
            if is_integrity {
                let message = match db_error.constraint() {
                    Some(constraint) => format!("{} ({constraint})", db_error.message()),
                    None => db_error.message().to_string(),
                };
                return StoreError::Integrity { message };
            }
        }
        StoreError::Database(error)
    }
}

impl StoreError {
    /// Create an integrity error
    pub fn integrity<S: Into<String>>(message: S) -> Self {
        Self::Integrity {
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// True for rejected writes: constraint violations and out-of-range values
    pub fn is_integrity(&self) -> bool {
        matches!(self, StoreError::Integrity { .. })
    }

    pub fn is_connectivity(&self) -> bool {
        match self {
            StoreError::Database(e) => matches!(
                e,
                sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::Tls(_)
            ),
            StoreError::Qdrant(e) => e.is_retryable(),
            StoreError::Provision(ProvisionError::HealthCheck { .. }) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
