//! Provisioning behaviour that holds without a running vector store.

use kurly_store::config::QdrantConfig;
use kurly_store::services::provisioning::{inspect, provision, ProvisionError, ProvisioningLock};
use kurly_store::services::qdrant::{QdrantClient, RetryConfig};
use kurly_store::StoreError;
use std::time::Duration;
use tempfile::TempDir;

/// Nothing listens on the discard port on test machines
const UNREACHABLE_URL: &str = "http://127.0.0.1:9";

fn unreachable_config() -> QdrantConfig {
    QdrantConfig {
        url: UNREACHABLE_URL.to_string(),
        timeout_secs: 2,
        ..Default::default()
    }
}

fn quick_retry() -> RetryConfig {
    RetryConfig::new(2)
        .with_initial_delay(Duration::from_millis(10))
        .with_max_delay(Duration::from_millis(20))
        .with_total_timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn test_unreachable_store_fails_at_health_check() {
    let config = unreachable_config();
    let client = QdrantClient::new(&config).unwrap();
    let lock_dir = TempDir::new().unwrap();

    let result = provision(&client, &config, quick_retry(), lock_dir.path()).await;

    match result {
        Err(StoreError::Provision(ProvisionError::HealthCheck { url, attempts, message })) => {
            assert_eq!(url, UNREACHABLE_URL);
            assert_eq!(attempts, 2);
            assert!(!message.is_empty());
        }
        other => panic!("expected health check failure, got {other:?}"),
    }

    // The lock is released even when provisioning fails
    let lock_path = ProvisioningLock::path_for(lock_dir.path(), &config.collection);
    assert!(!lock_path.exists());
}

#[tokio::test]
async fn test_health_check_error_is_connectivity() {
    let config = unreachable_config();
    let client = QdrantClient::new(&config).unwrap();
    let lock_dir = TempDir::new().unwrap();

    let err = provision(&client, &config, RetryConfig::none(), lock_dir.path())
        .await
        .unwrap_err();
    assert!(err.is_connectivity());
    assert!(err.to_string().contains("running"));
}

#[tokio::test]
async fn test_concurrent_provisioning_fails_fast() {
    let config = unreachable_config();
    let client = QdrantClient::new(&config).unwrap();
    let lock_dir = TempDir::new().unwrap();

    let held = ProvisioningLock::acquire(lock_dir.path(), &config.collection).unwrap();
    let result = provision(&client, &config, quick_retry(), lock_dir.path()).await;
    assert!(matches!(result, Err(StoreError::Lock { .. })));

    drop(held);
    let result = provision(&client, &config, RetryConfig::none(), lock_dir.path()).await;
    assert!(matches!(
        result,
        Err(StoreError::Provision(ProvisionError::HealthCheck { .. }))
    ));
}

#[tokio::test]
async fn test_inspect_unreachable_store_is_retryable_error() {
    let config = unreachable_config();
    let client = QdrantClient::new(&config).unwrap();

    let err = inspect(&client, &config).await.unwrap_err();
    assert!(err.is_retryable());
}

#[test]
fn test_invalid_url_is_rejected_before_any_request() {
    let config = QdrantConfig {
        url: "localhost 6333".to_string(),
        ..Default::default()
    };
    assert!(QdrantClient::new(&config).is_err());
}
