//! Qdrant wire API.
//!
//! [`QdrantApi`] is the seam between the collection logic in
//! [`QdrantVectorStore`](super::QdrantVectorStore) and the transport. The
//! request and response types mirror Qdrant's REST bodies.

use codeindex_core::StoreError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

/// Point identifier: Qdrant accepts unsigned integers and UUID strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointId {
    Num(u64),
    Uuid(String),
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointId::Num(n) => write!(f, "{}", n),
            PointId::Uuid(s) => f.write_str(s),
        }
    }
}

impl From<u64> for PointId {
    fn from(n: u64) -> Self {
        PointId::Num(n)
    }
}

impl From<&str> for PointId {
    fn from(s: &str) -> Self {
        PointId::Uuid(s.to_string())
    }
}

impl From<String> for PointId {
    fn from(s: String) -> Self {
        PointId::Uuid(s)
    }
}

/// Point payload: an arbitrary JSON object.
pub type Payload = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorParams {
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<String>,
}

/// Collection vector configuration: one unnamed vector or named vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VectorsConfig {
    Single(VectorParams),
    Named(HashMap<String, VectorParams>),
}

impl VectorsConfig {
    /// Size of the unnamed vector. Named-vector collections have none.
    pub fn size(&self) -> Option<u64> {
        match self {
            VectorsConfig::Single(params) => Some(params.size),
            VectorsConfig::Named(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CollectionParams {
    #[serde(default)]
    pub vectors: Option<VectorsConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CollectionConfig {
    #[serde(default)]
    pub params: CollectionParams,
}

/// `GET /collections/{name}` result.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CollectionInfo {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub points_count: Option<u64>,
    #[serde(default)]
    pub config: CollectionConfig,
}

impl CollectionInfo {
    pub fn vector_size(&self) -> Option<u64> {
        self.config.params.vectors.as_ref().and_then(VectorsConfig::size)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateCollection {
    pub vectors: VectorParams,
}

impl CreateCollection {
    pub fn cosine(size: u64) -> Self {
        Self {
            vectors: VectorParams {
                size,
                distance: Some("Cosine".to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateFieldIndex {
    pub field_name: String,
    pub field_schema: String,
}

impl CreateFieldIndex {
    pub fn keyword(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            field_schema: "keyword".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointStruct {
    pub id: PointId,
    pub vector: Vec<f32>,
    pub payload: Payload,
}

/// Upsert body. `wait` travels as a query parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpsertPoints {
    pub points: Vec<PointStruct>,
    #[serde(skip)]
    pub wait: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchValue {
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldCondition {
    pub key: String,
    #[serde(rename = "match")]
    pub match_: MatchValue,
}

impl FieldCondition {
    pub fn matches(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            match_: MatchValue {
                value: value.into(),
            },
        }
    }
}

/// Boolean filter over payload fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Filter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub must: Option<Vec<FieldCondition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub should: Option<Vec<FieldCondition>>,
}

impl Filter {
    pub fn must(conditions: Vec<FieldCondition>) -> Self {
        Self {
            must: Some(conditions),
            should: None,
        }
    }

    pub fn should(conditions: Vec<FieldCondition>) -> Self {
        Self {
            must: None,
            should: Some(conditions),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchParams {
    pub hnsw_ef: u64,
    pub exact: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayloadSelector {
    pub include: Vec<String>,
}

/// `POST /collections/{name}/points/query` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryPoints {
    pub query: Vec<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    pub score_threshold: f32,
    pub limit: usize,
    pub params: SearchParams,
    pub with_payload: PayloadSelector,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScoredPoint {
    pub id: PointId,
    pub score: f32,
    #[serde(default)]
    pub payload: Option<Payload>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub points: Vec<ScoredPoint>,
}

/// `POST /collections/{name}/points/delete` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeletePoints {
    pub filter: Filter,
    #[serde(skip)]
    pub wait: bool,
}

/// Calls the vector store makes against Qdrant.
#[async_trait::async_trait]
pub trait QdrantApi: Send + Sync + fmt::Debug {
    async fn get_collection(&self, name: &str) -> Result<CollectionInfo, StoreError>;

    async fn create_collection(&self, name: &str, request: &CreateCollection)
        -> Result<(), StoreError>;

    async fn delete_collection(&self, name: &str) -> Result<(), StoreError>;

    async fn create_payload_index(
        &self,
        name: &str,
        request: &CreateFieldIndex,
    ) -> Result<(), StoreError>;

    async fn upsert(&self, name: &str, request: &UpsertPoints) -> Result<(), StoreError>;

    async fn query(&self, name: &str, request: &QueryPoints) -> Result<QueryResponse, StoreError>;

    async fn delete_points(&self, name: &str, request: &DeletePoints) -> Result<(), StoreError>;
}
