//! Workspace vector store.
//!
//! One collection per workspace holds every code chunk. The collection schema
//! (vector size) follows the active embedding model: [`VectorStore::initialize`]
//! creates, verifies or migrates it before anything is written.

pub mod api;
pub mod connection;
pub mod qdrant;
pub mod rest;

pub use api::{Payload, PointId, PointStruct, QdrantApi};
pub use connection::ConnectionParams;
pub use qdrant::{collection_name_for, path_segments, QdrantVectorStore};
pub use rest::QdrantRestClient;

use api::CollectionInfo;
use codeindex_core::AppResult;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Validated payload of a search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeChunkPayload {
    pub file_path: String,
    pub code_chunk: String,
    #[serde(deserialize_with = "line_number")]
    pub start_line: u64,
    #[serde(deserialize_with = "line_number")]
    pub end_line: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_segments: Option<BTreeMap<String, String>>,
}

/// Line numbers written by other indexers may be floats (`12.0`) or numeric
/// strings.
fn line_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    let parsed = match &raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|f| *f >= 0.0)
    .map(|f| f as u64);
    parsed.ok_or_else(|| D::Error::custom(format!("invalid line number: {}", raw)))
}

/// A search hit whose payload carries every required field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorStoreSearchResult {
    pub id: PointId,
    pub score: f32,
    pub payload: CodeChunkPayload,
}

/// Outcome of looking up the workspace collection.
///
/// Lookup never fails: transport and server errors become
/// [`Unavailable`](CollectionLookup::Unavailable) with a diagnostic the
/// caller may log.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionLookup {
    Found(CollectionInfo),
    Missing,
    Unavailable { diagnostic: String },
}

impl CollectionLookup {
    pub fn exists(&self) -> bool {
        matches!(self, CollectionLookup::Found(_))
    }
}

/// Operations the indexing pipeline performs against its collection.
#[async_trait::async_trait]
pub trait VectorStore: Send + Sync {
    /// Create, verify or migrate the collection.
    ///
    /// Returns `true` when the collection was (re)created.
    async fn initialize(&self) -> AppResult<bool>;

    /// Write points, deriving `pathSegments` from each `filePath`.
    async fn upsert_points(&self, points: Vec<PointStruct>) -> AppResult<()>;

    /// Nearest neighbours of `query_vector`, optionally restricted to files
    /// under `directory_prefix`.
    async fn search(
        &self,
        query_vector: &[f32],
        directory_prefix: Option<&str>,
        min_score: Option<f32>,
        max_results: Option<usize>,
    ) -> AppResult<Vec<VectorStoreSearchResult>>;

    async fn delete_points_by_file_path(&self, file_path: &str) -> AppResult<()>;

    async fn delete_points_by_multiple_file_paths(&self, file_paths: &[String]) -> AppResult<()>;

    /// Remove every point but keep the collection.
    async fn clear_collection(&self) -> AppResult<()>;

    /// Drop the collection. No-op when it does not exist.
    async fn delete_collection(&self) -> AppResult<()>;

    /// Whether the collection exists. Errors count as "no".
    async fn collection_exists(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_accepts_loose_line_numbers() {
        let payload: CodeChunkPayload = serde_json::from_value(json!({
            "filePath": "src/lib.rs",
            "codeChunk": "pub mod api;",
            "startLine": 3.0,
            "endLine": "9"
        }))
        .unwrap();
        assert_eq!((payload.start_line, payload.end_line), (3, 9));
    }

    #[test]
    fn test_payload_requires_every_field() {
        let missing = serde_json::from_value::<CodeChunkPayload>(json!({
            "filePath": "src/lib.rs",
            "codeChunk": "pub mod api;",
            "startLine": 3
        }));
        assert!(missing.is_err());

        let garbage = serde_json::from_value::<CodeChunkPayload>(json!({
            "filePath": "src/lib.rs",
            "codeChunk": "pub mod api;",
            "startLine": [3],
            "endLine": 4
        }));
        assert!(garbage.is_err());
    }
}
