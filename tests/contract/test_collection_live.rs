//! Provisioning against a running Qdrant instance.
//!
//! Set `QDRANT_URL` (e.g. `http://localhost:6333`) and run with `--ignored`.
//! Tests use their own collection names so the real `kurly_skin` collection
//! is never touched.

use kurly_store::config::QdrantConfig;
use kurly_store::services::provisioning::{inspect, provision, ClearOutcome, ProvisionState};
use kurly_store::services::qdrant::{CollectionApi, Distance, QdrantClient, RetryConfig};
use tempfile::TempDir;

fn live_config(collection: &str) -> QdrantConfig {
    let url = std::env::var("QDRANT_URL").unwrap_or_else(|_| "http://localhost:6333".to_string());
    QdrantConfig {
        url,
        collection: format!("{collection}_{}", std::process::id()),
        ..Default::default()
    }
}

#[tokio::test]
#[ignore = "requires running Qdrant instance"]
async fn test_provision_is_repeatable() {
    let config = live_config("kurly_test_repeat");
    let client = QdrantClient::new(&config).unwrap();
    let lock_dir = TempDir::new().unwrap();

    let first = provision(&client, &config, RetryConfig::default(), lock_dir.path())
        .await
        .unwrap();
    assert_eq!(first.state, ProvisionState::Ready);

    let second = provision(&client, &config, RetryConfig::default(), lock_dir.path())
        .await
        .unwrap();
    assert_eq!(second.state, ProvisionState::Ready);
    assert_eq!(second.cleared, Some(ClearOutcome::Deleted));

    let report = inspect(&client, &config).await.unwrap();
    assert_eq!(report.occurrences, 1);
    assert!(report.matches_expected());
    assert_eq!(report.points_count, Some(0));

    client.delete_collection(&config.collection).await.unwrap();
}

#[tokio::test]
#[ignore = "requires running Qdrant instance"]
async fn test_reprovision_replaces_mismatched_configuration() {
    let mut config = live_config("kurly_test_replace");
    let client = QdrantClient::new(&config).unwrap();
    let lock_dir = TempDir::new().unwrap();

    config.vector_size = 8;
    config.distance = Distance::Dot;
    provision(&client, &config, RetryConfig::default(), lock_dir.path())
        .await
        .unwrap();

    let mut expected = config.clone();
    expected.vector_size = 1024;
    expected.distance = Distance::Cosine;
    assert!(!inspect(&client, &expected).await.unwrap().matches_expected());

    provision(&client, &expected, RetryConfig::default(), lock_dir.path())
        .await
        .unwrap();
    let report = inspect(&client, &expected).await.unwrap();
    assert!(report.matches_expected());

    client.delete_collection(&expected.collection).await.unwrap();
}

#[tokio::test]
#[ignore = "requires running Qdrant instance"]
async fn test_first_provision_of_absent_collection() {
    let config = live_config("kurly_test_absent");
    let client = QdrantClient::new(&config).unwrap();
    let lock_dir = TempDir::new().unwrap();

    let _ = client.delete_collection(&config.collection).await;
    let report = provision(&client, &config, RetryConfig::default(), lock_dir.path())
        .await
        .unwrap();
    assert_eq!(report.cleared, Some(ClearOutcome::NotPresent));
    assert_eq!(report.vector_size, 1024);

    client.delete_collection(&config.collection).await.unwrap();
}
