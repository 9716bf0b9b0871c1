use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::errors::QdrantError;
use super::models::{
    ApiResponse, CollectionInfo, CollectionsList, CreateCollectionRequest, VectorParams,
};
use crate::config::QdrantConfig;

/// The slice of the Qdrant REST API that provisioning and inspection use.
///
/// Every method is a single request; retry policy belongs to the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CollectionApi: Send + Sync {
    /// `GET /healthz`
    async fn health(&self) -> Result<(), QdrantError>;

    /// `DELETE /collections/<name>`; `Ok(false)` when nothing was deleted
    async fn delete_collection(&self, name: &str) -> Result<bool, QdrantError>;

    /// `PUT /collections/<name>`
    async fn create_collection(&self, name: &str, params: VectorParams)
        -> Result<(), QdrantError>;

    /// `GET /collections/<name>`
    async fn get_collection(&self, name: &str) -> Result<CollectionInfo, QdrantError>;

    /// `GET /collections`
    async fn list_collections(&self) -> Result<Vec<String>, QdrantError>;
}

#[derive(Debug, Clone)]
pub struct QdrantClient {
    base_url: String,
    timeout: Duration,
    client: Client,
}

impl QdrantClient {
    pub fn new(config: &QdrantConfig) -> Result<Self, QdrantError> {
        Self::with_url(&config.url, config.timeout())
    }

    pub fn with_url(url: &str, timeout: Duration) -> Result<Self, QdrantError> {
        if url.trim().is_empty() {
            return Err(QdrantError::Configuration {
                message: "Vector store URL cannot be empty".to_string(),
            });
        }

        reqwest::Url::parse(url).map_err(|e| QdrantError::Configuration {
            message: format!("Invalid vector store URL '{url}': {e}"),
        })?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| QdrantError::Configuration {
                message: format!("Failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            base_url: url.trim_end_matches('/').to_string(),
            timeout,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self, name: &str) -> String {
        format!("{}/collections/{}", self.base_url, name)
    }

    fn map_send_error(&self, error: reqwest::Error) -> QdrantError {
        QdrantError::from_reqwest_error(error, &self.base_url, self.timeout.as_millis() as u64)
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
        collection: &str,
    ) -> Result<T, QdrantError> {
        let status = response.status();

        if status.is_success() {
            let response_text = response
                .text()
                .await
                .map_err(|e| self.map_send_error(e))?;

            let parsed: ApiResponse<T> =
                serde_json::from_str(&response_text).map_err(|e| QdrantError::Parse {
                    message: format!("Failed to parse response: {e}"),
                })?;

            Ok(parsed.result)
        } else {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            Err(QdrantError::from_status_and_body(
                status,
                &error_body,
                collection,
            ))
        }
    }
}

#[async_trait]
impl CollectionApi for QdrantClient {
    async fn health(&self) -> Result<(), QdrantError> {
        let url = format!("{}/healthz", self.base_url);
        tracing::debug!(%url, "Checking vector store health");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(QdrantError::Server {
                status: status.as_u16(),
                body,
            })
        }
    }

    async fn delete_collection(&self, name: &str) -> Result<bool, QdrantError> {
        let response = self
            .client
            .delete(self.collection_url(name))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        self.handle_response::<bool>(response, name).await
    }

    async fn create_collection(
        &self,
        name: &str,
        params: VectorParams,
    ) -> Result<(), QdrantError> {
        let request = CreateCollectionRequest::new(params.size, params.distance);

        let response = self
            .client
            .put(self.collection_url(name))
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let created = self.handle_response::<bool>(response, name).await?;
        if created {
            Ok(())
        } else {
            Err(QdrantError::Server {
                status: 200,
                body: format!("Collection '{name}' was not created"),
            })
        }
    }

    async fn get_collection(&self, name: &str) -> Result<CollectionInfo, QdrantError> {
        let response = self
            .client
            .get(self.collection_url(name))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        self.handle_response(response, name).await
    }

    async fn list_collections(&self) -> Result<Vec<String>, QdrantError> {
        let response = self
            .client
            .get(format!("{}/collections", self.base_url))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let list: CollectionsList = self.handle_response(response, "").await?;
        Ok(list.collections.into_iter().map(|c| c.name).collect())
    }
}
