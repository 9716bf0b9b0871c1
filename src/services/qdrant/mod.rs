pub mod client;
pub mod errors;
pub mod models;
pub mod retry;

pub use client::{CollectionApi, QdrantClient};
pub use errors::{QdrantError, RetryError};
pub use models::{CollectionInfo, CreateCollectionRequest, Distance, VectorParams, VectorsConfig};
pub use retry::{with_retry, RetryConfig, RetryHandler};

#[cfg(test)]
pub use client::MockCollectionApi;
