//! Destructive, repeatable provisioning of the review-embedding collection.
//!
//! The collection moves through `Absent → Checked → Cleared → Ready`. Each
//! transition is its own method on [`Provisioner`] so the CLI can report
//! progress between steps and tests can drive them one at a time. Only the
//! health check is retried; delete is best effort and create is attempted
//! exactly once.

use serde::Serialize;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use super::qdrant::{
    CollectionApi, CollectionInfo, QdrantError, RetryConfig, RetryHandler, VectorParams,
};
use crate::config::QdrantConfig;
use crate::error::{Result as StoreResult, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProvisionState {
    Absent,
    Checked,
    Cleared,
    Ready,
}

impl fmt::Display for ProvisionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProvisionState::Absent => "absent",
            ProvisionState::Checked => "checked",
            ProvisionState::Cleared => "cleared",
            ProvisionState::Ready => "ready",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error(
        "Vector store health check failed at {url} after {attempts} attempt(s): {message}. \
         Verify that the Qdrant service is running and reachable."
    )]
    HealthCheck {
        url: String,
        attempts: usize,
        message: String,
    },

    #[error("Failed to create collection '{collection}' ({}): {body}", status_label(.status))]
    Create {
        collection: String,
        status: Option<u16>,
        body: String,
    },

    #[error("Provisioning step '{step}' requires state {expected}, but the collection is {actual}")]
    OutOfOrder {
        step: &'static str,
        expected: ProvisionState,
        actual: ProvisionState,
    },
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!("HTTP {code}"),
        None => "no response".to_string(),
    }
}

/// What happened to a pre-existing collection during the clear step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ClearOutcome {
    Deleted,
    NotPresent,
    Failed { message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ProvisionReport {
    pub collection: String,
    pub vector_size: u64,
    pub distance: String,
    pub health_attempts: usize,
    pub cleared: Option<ClearOutcome>,
    pub state: ProvisionState,
}

pub struct Provisioner<'a, A: CollectionApi + ?Sized> {
    api: &'a A,
    url: String,
    collection: String,
    params: VectorParams,
    retry: RetryConfig,
    state: ProvisionState,
    health_attempts: usize,
    cleared: Option<ClearOutcome>,
    lock: Option<ProvisioningLock>,
}

impl<'a, A: CollectionApi + ?Sized> Provisioner<'a, A> {
    pub fn new(api: &'a A, config: &QdrantConfig) -> Self {
        Self {
            api,
            url: config.url.clone(),
            collection: config.collection.clone(),
            params: VectorParams {
                size: config.vector_size,
                distance: config.distance,
            },
            retry: RetryConfig::default(),
            state: ProvisionState::Absent,
            health_attempts: 0,
            cleared: None,
            lock: None,
        }
    }

    /// Take the collection's lock under `lock_dir`, held until the
    /// provisioner is dropped. Fails fast when another run holds it.
    pub fn with_lock(mut self, lock_dir: &Path) -> StoreResult<Self> {
        self.lock = Some(ProvisioningLock::acquire(lock_dir, &self.collection)?);
        Ok(self)
    }

    pub fn lock_path(&self) -> Option<&Path> {
        self.lock.as_ref().map(ProvisioningLock::path)
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn state(&self) -> ProvisionState {
        self.state
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn expect_state(&self, step: &'static str, expected: ProvisionState) -> Result<(), ProvisionError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(ProvisionError::OutOfOrder {
                step,
                expected,
                actual: self.state,
            })
        }
    }

    /// `Absent → Checked`. Retries with backoff; on failure nothing else runs.
    pub async fn check_health(&mut self) -> Result<ProvisionState, ProvisionError> {
        self.expect_state("check_health", ProvisionState::Absent)?;

        let api = self.api;
        let mut handler = RetryHandler::new(self.retry.clone());
        let result = handler.retry(|| api.health()).await;
        self.health_attempts = handler.attempts();

        match result {
            Ok(()) => {
                info!(url = %self.url, attempts = self.health_attempts, "Vector store is healthy");
                self.state = ProvisionState::Checked;
                Ok(self.state)
            }
            Err(retry_error) => {
                let last = retry_error.into_inner();
                Err(ProvisionError::HealthCheck {
                    url: self.url.clone(),
                    attempts: self.health_attempts,
                    message: last.to_string(),
                })
            }
        }
    }

    /// `Checked → Cleared`. Delete failures, including a missing collection,
    /// are logged and otherwise ignored.
    pub async fn clear_existing(&mut self) -> Result<ClearOutcome, ProvisionError> {
        self.expect_state("clear_existing", ProvisionState::Checked)?;

        let outcome = match self.api.delete_collection(&self.collection).await {
            Ok(true) => {
                info!(collection = %self.collection, "Deleted existing collection");
                ClearOutcome::Deleted
            }
            Ok(false) => ClearOutcome::NotPresent,
            Err(QdrantError::NotFound { .. }) => ClearOutcome::NotPresent,
            Err(error) => {
                warn!(
                    collection = %self.collection,
                    error = %error,
                    "Failed to delete existing collection, continuing"
                );
                ClearOutcome::Failed {
                    message: error.to_string(),
                }
            }
        };

        self.cleared = Some(outcome.clone());
        self.state = ProvisionState::Cleared;
        Ok(outcome)
    }

    /// `Cleared → Ready`. Failure is fatal and carries the store's answer.
    pub async fn create(&mut self) -> Result<ProvisionState, ProvisionError> {
        self.expect_state("create", ProvisionState::Cleared)?;

        self.api
            .create_collection(&self.collection, self.params)
            .await
            .map_err(|error| ProvisionError::Create {
                collection: self.collection.clone(),
                status: error.status(),
                body: match error {
                    QdrantError::Server { body, .. } => body,
                    other => other.user_message(),
                },
            })?;

        info!(
            collection = %self.collection,
            size = self.params.size,
            distance = %self.params.distance,
            "Created collection"
        );
        self.state = ProvisionState::Ready;
        Ok(self.state)
    }

    pub fn report(&self) -> ProvisionReport {
        ProvisionReport {
            collection: self.collection.clone(),
            vector_size: self.params.size,
            distance: self.params.distance.to_string(),
            health_attempts: self.health_attempts,
            cleared: self.cleared.clone(),
            state: self.state,
        }
    }

    /// Run every step in order
    pub async fn run(mut self) -> Result<ProvisionReport, ProvisionError> {
        self.check_health().await?;
        self.clear_existing().await?;
        self.create().await?;
        Ok(self.report())
    }
}

/// Provision the configured collection while holding its lock file.
///
/// Library entry point; the CLI drives the same locked [`Provisioner`] one
/// step at a time to print progress.
pub async fn provision<A: CollectionApi + ?Sized>(
    api: &A,
    config: &QdrantConfig,
    retry: RetryConfig,
    lock_dir: &Path,
) -> StoreResult<ProvisionReport> {
    let report = Provisioner::new(api, config)
        .with_retry(retry)
        .with_lock(lock_dir)?
        .run()
        .await?;
    Ok(report)
}

/// Exclusive, process-external lock for one collection.
///
/// Creation uses `create_new`, so a second holder fails instead of waiting.
/// The file is removed on drop.
#[derive(Debug)]
pub struct ProvisioningLock {
    path: PathBuf,
    _file: File,
}

impl ProvisioningLock {
    pub fn path_for(dir: &Path, collection: &str) -> PathBuf {
        dir.join(format!("provision-{collection}.lock"))
    }

    pub fn acquire(dir: &Path, collection: &str) -> StoreResult<Self> {
        fs::create_dir_all(dir)?;
        let path = Self::path_for(dir, collection);

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let holder = Self::holder(&path);
                return Err(StoreError::Lock { path, holder });
            }
            Err(e) => return Err(e.into()),
        };

        writeln!(file, "{}", std::process::id())?;
        tracing::debug!(path = %path.display(), "Acquired provisioning lock");

        Ok(Self { path, _file: file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Process id written by the run holding `path`
    pub fn holder(path: &Path) -> Option<u32> {
        fs::read_to_string(path).ok()?.trim().parse().ok()
    }
}

impl Drop for ProvisioningLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "Failed to remove provisioning lock");
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
    pub collection: String,
    pub occurrences: usize,
    pub all_collections: Vec<String>,
    pub vector_params: Option<VectorParams>,
    pub points_count: Option<u64>,
    pub status: Option<String>,
    pub expected: VectorParams,
}

impl InspectReport {
    pub fn exists(&self) -> bool {
        self.occurrences > 0
    }

    /// Exactly one collection of that name, with the expected size and metric
    pub fn matches_expected(&self) -> bool {
        self.occurrences == 1 && self.vector_params == Some(self.expected)
    }
}

/// Read the live configuration of the configured collection
pub async fn inspect<A: CollectionApi + ?Sized>(
    api: &A,
    config: &QdrantConfig,
) -> Result<InspectReport, QdrantError> {
    let all_collections = api.list_collections().await?;
    let occurrences = all_collections
        .iter()
        .filter(|name| **name == config.collection)
        .count();

    let info: Option<CollectionInfo> = match api.get_collection(&config.collection).await {
        Ok(info) => Some(info),
        Err(QdrantError::NotFound { .. }) => None,
        Err(e) => return Err(e),
    };

    Ok(InspectReport {
        collection: config.collection.clone(),
        occurrences,
        all_collections,
        vector_params: info.as_ref().and_then(CollectionInfo::vector_params),
        points_count: info.as_ref().and_then(|i| i.points_count),
        status: info.and_then(|i| i.status),
        expected: VectorParams {
            size: config.vector_size,
            distance: config.distance,
        },
    })
}
