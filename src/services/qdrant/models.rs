use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Similarity metric of a collection, spelled the way Qdrant spells it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Distance {
    #[default]
    Cosine,
    Euclid,
    Dot,
    Manhattan,
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Distance::Cosine => "Cosine",
            Distance::Euclid => "Euclid",
            Distance::Dot => "Dot",
            Distance::Manhattan => "Manhattan",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorParams {
    pub size: u64,
    pub distance: Distance,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateCollectionRequest {
    pub vectors: VectorParams,
}

impl CreateCollectionRequest {
    pub fn new(size: u64, distance: Distance) -> Self {
        Self {
            vectors: VectorParams { size, distance },
        }
    }
}

/// Every Qdrant response wraps its payload in `result`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub result: T,
    #[serde(default)]
    pub status: Option<serde_json::Value>,
    #[serde(default)]
    pub time: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum VectorsConfig {
    Single(VectorParams),
    Named(HashMap<String, VectorParams>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionParams {
    pub vectors: VectorsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionConfig {
    pub params: CollectionParams,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionInfo {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub points_count: Option<u64>,
    pub config: CollectionConfig,
}

impl CollectionInfo {
    /// Parameters of the unnamed vector, if the collection has one
    pub fn vector_params(&self) -> Option<VectorParams> {
        match &self.config.params.vectors {
            VectorsConfig::Single(params) => Some(*params),
            VectorsConfig::Named(_) => None,
        }
    }

    pub fn matches(&self, size: u64, distance: Distance) -> bool {
        self.vector_params()
            .map(|p| p.size == size && p.distance == distance)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionDescription {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionsList {
    pub collections: Vec<CollectionDescription>,
}
