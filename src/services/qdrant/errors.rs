use thiserror::Error;

#[derive(Debug, Error)]
pub enum QdrantError {
    #[error("Vector store unreachable at {url}: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Collection not found: {collection}")]
    NotFound { collection: String },

    #[error("Server error: {status} - {body}")]
    Server { status: u16, body: String },

    #[error("Parse error: {message}")]
    Parse { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

#[derive(Debug, Error)]
pub enum RetryError {
    #[error("Maximum retry attempts exceeded: {last}")]
    MaxAttemptsExceeded { last: QdrantError },

    #[error("Retry timeout exceeded: {last}")]
    TimeoutExceeded { last: QdrantError },

    #[error("Non-retryable error: {source}")]
    NonRetryable { source: QdrantError },
}

impl RetryError {
    /// The error of the final attempt
    pub fn into_inner(self) -> QdrantError {
        match self {
            RetryError::MaxAttemptsExceeded { last } => last,
            RetryError::TimeoutExceeded { last } => last,
            RetryError::NonRetryable { source } => source,
        }
    }
}

impl QdrantError {
    pub fn is_retryable(&self) -> bool {
        match self {
            QdrantError::Unreachable { .. } => true,
            QdrantError::Timeout { .. } => true,
            QdrantError::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, QdrantError::NotFound { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            QdrantError::Server { status, .. } => Some(*status),
            QdrantError::NotFound { .. } => Some(404),
            _ => None,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            QdrantError::Unreachable { url, .. } => format!(
                "Cannot reach the vector store at {url}. Check that the Qdrant container is running."
            ),
            QdrantError::Timeout { .. } => {
                "The vector store did not answer in time. Check that it is running and healthy."
                    .to_string()
            }
            QdrantError::NotFound { collection } => {
                format!("Collection '{collection}' does not exist.")
            }
            QdrantError::Server { status, body } => {
                format!("The vector store rejected the request (HTTP {status}): {body}")
            }
            QdrantError::Parse { message } => {
                format!("Unexpected response from the vector store: {message}")
            }
            QdrantError::Configuration { message } => format!("Configuration error: {message}"),
        }
    }

    pub fn from_reqwest_error(error: reqwest::Error, url: &str, timeout_ms: u64) -> Self {
        if error.is_timeout() {
            QdrantError::Timeout { timeout_ms }
        } else if let Some(status) = error.status() {
            QdrantError::Server {
                status: status.as_u16(),
                body: error.to_string(),
            }
        } else {
            QdrantError::Unreachable {
                url: url.to_string(),
                source: error,
            }
        }
    }

    /// Map a non-success response. Qdrant reports failures as
    /// `{"status": {"error": "..."}}`; the raw body is kept when that shape
    /// is missing.
    pub fn from_status_and_body(status: reqwest::StatusCode, body: &str, collection: &str) -> Self {
        if status == reqwest::StatusCode::NOT_FOUND {
            return QdrantError::NotFound {
                collection: collection.to_string(),
            };
        }

        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| {
                value
                    .get("status")
                    .and_then(|s| s.get("error"))
                    .and_then(|e| e.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| body.to_string());

        QdrantError::Server {
            status: status.as_u16(),
            body: message,
        }
    }
}
