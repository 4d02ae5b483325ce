//! Qdrant-backed [`VectorStore`].

use super::api::{
    CollectionInfo, CreateCollection, CreateFieldIndex, DeletePoints, FieldCondition, Filter,
    Payload, PayloadSelector, PointStruct, QdrantApi, QueryPoints, SearchParams, UpsertPoints,
};
use super::connection::ConnectionParams;
use super::rest::QdrantRestClient;
use super::{CodeChunkPayload, CollectionLookup, VectorStore, VectorStoreSearchResult};
use crate::constants::{
    payload, COLLECTION_HASH_LEN, COLLECTION_PREFIX, PATH_SEGMENT_INDEX_DEPTH, SEARCH_HNSW_EF,
};
use codeindex_core::{AppError, AppResult, StoreError};
use codeindex_embedders::models::{DEFAULT_MAX_SEARCH_RESULTS, DEFAULT_SEARCH_MIN_SCORE};
use codeindex_embedders::HttpOptions;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Collection name for a workspace: `ws-` plus 16 hex chars of its path hash.
pub fn collection_name_for(workspace_path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(workspace_path.to_string_lossy().as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("{}{}", COLLECTION_PREFIX, &digest[..COLLECTION_HASH_LEN])
}

/// Split a file path into a `{"0": seg0, "1": seg1, ...}` payload object.
///
/// Both `/` and `\` separate segments; empty segments are skipped.
pub fn path_segments(file_path: &str) -> Payload {
    split_path(file_path)
        .enumerate()
        .map(|(i, segment)| (i.to_string(), Value::String(segment.to_string())))
        .collect()
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split(['/', '\\']).filter(|s| !s.is_empty())
}

/// Exact-match filter on leading path segments, or `None` for no restriction.
fn directory_filter(directory_prefix: Option<&str>) -> Option<Filter> {
    let conditions: Vec<FieldCondition> = split_path(directory_prefix?)
        .filter(|s| *s != ".")
        .enumerate()
        .map(|(i, segment)| {
            FieldCondition::matches(format!("{}.{}", payload::PATH_SEGMENTS, i), segment)
        })
        .collect();

    (!conditions.is_empty()).then(|| Filter::must(conditions))
}

/// Qdrant vector store for one workspace collection.
#[derive(Debug, Clone)]
pub struct QdrantVectorStore {
    api: Arc<dyn QdrantApi>,
    connection: ConnectionParams,
    collection_name: String,
    vector_size: u64,
}

impl QdrantVectorStore {
    /// Connect to Qdrant over REST.
    ///
    /// `url` may be blank (local default), `host`, `host:port` or a full URL.
    pub fn new(
        workspace_path: &Path,
        url: Option<&str>,
        vector_size: u32,
        api_key: Option<&str>,
        http: &HttpOptions,
    ) -> AppResult<Self> {
        let connection = ConnectionParams::parse(url);
        let client = QdrantRestClient::new(&connection, api_key, http)?;
        Ok(Self::with_api(
            workspace_path,
            connection,
            vector_size,
            Arc::new(client),
        ))
    }

    /// Use an arbitrary [`QdrantApi`] implementation.
    pub fn with_api(
        workspace_path: &Path,
        connection: ConnectionParams,
        vector_size: u32,
        api: Arc<dyn QdrantApi>,
    ) -> Self {
        Self {
            api,
            connection,
            collection_name: collection_name_for(workspace_path),
            vector_size: u64::from(vector_size),
        }
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    pub fn connection(&self) -> &ConnectionParams {
        &self.connection
    }

    pub fn vector_size(&self) -> u64 {
        self.vector_size
    }

    /// Look up the collection without failing.
    pub async fn check_collection(&self) -> CollectionLookup {
        match self.api.get_collection(&self.collection_name).await {
            Ok(info) => CollectionLookup::Found(info),
            Err(e) if e.is_not_found() => CollectionLookup::Missing,
            Err(e) => CollectionLookup::Unavailable {
                diagnostic: format!(
                    "Warning during getCollectionInfo for \"{}\": {}",
                    self.collection_name, e
                ),
            },
        }
    }

    async fn create_collection(&self) -> Result<(), StoreError> {
        self.api
            .create_collection(&self.collection_name, &CreateCollection::cosine(self.vector_size))
            .await
    }

    /// Drop the collection and recreate it with the configured size.
    async fn recreate_collection(&self, existing_size: Option<u64>) -> AppResult<()> {
        let existing = existing_size
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        warn!(
            "Collection {} exists with vector size {}, but expected {}. Recreating collection.",
            self.collection_name, existing, self.vector_size
        );

        if let Err(e) = self.api.delete_collection(&self.collection_name).await {
            error!("Failed to delete collection {}: {}", self.collection_name, e);
            return Err(AppError::DimensionMismatch {
                details: format!(
                    "Failed to delete existing collection with vector size {}. {}",
                    existing, e
                ),
                source: Some(e),
            });
        }

        match self.check_collection().await {
            CollectionLookup::Missing => {}
            other => {
                let reason = match other {
                    CollectionLookup::Unavailable { diagnostic } => diagnostic,
                    _ => "Collection still exists after deletion attempt".to_string(),
                };
                let cause = StoreError::Verification(reason);
                error!("Collection {} deletion not confirmed: {}", self.collection_name, cause);
                return Err(AppError::DimensionMismatch {
                    details: format!(
                        "Deleted existing collection but failed verification step: {}",
                        cause
                    ),
                    source: Some(cause),
                });
            }
        }

        if let Err(e) = self.create_collection().await {
            error!("Failed to recreate collection {}: {}", self.collection_name, e);
            return Err(AppError::DimensionMismatch {
                details: format!(
                    "Failed to create new collection with vector size {}. {}",
                    self.vector_size, e
                ),
                source: Some(e),
            });
        }

        info!(
            "Recreated collection {} with vector size {}",
            self.collection_name, self.vector_size
        );
        Ok(())
    }

    /// Keyword indexes on the leading path segments. Failures are logged only.
    async fn create_payload_indexes(&self) {
        for i in 0..PATH_SEGMENT_INDEX_DEPTH {
            let field = format!("{}.{}", payload::PATH_SEGMENTS, i);
            if let Err(e) = self
                .api
                .create_payload_index(&self.collection_name, &CreateFieldIndex::keyword(&field))
                .await
            {
                warn!("Could not create payload index for {}: {}", field, e);
            }
        }
    }

    fn connection_error(&self, source: StoreError) -> AppError {
        AppError::StoreConnection {
            url: self.connection.base_url(),
            source,
        }
    }

    async fn delete_by_filter(&self, filter: Filter, what: &str) -> AppResult<()> {
        let request = DeletePoints { filter, wait: true };
        self.api
            .delete_points(&self.collection_name, &request)
            .await
            .map_err(|e| {
                error!("Failed to delete {} from {}: {}", what, self.collection_name, e);
                AppError::from(e)
            })
    }
}

/// Turn a raw payload into a search payload, or `None` if fields are missing.
fn validate_payload(payload: Option<Payload>) -> Option<CodeChunkPayload> {
    let payload = payload?;
    serde_json::from_value(Value::Object(payload)).ok()
}

#[async_trait::async_trait]
impl VectorStore for QdrantVectorStore {
    async fn initialize(&self) -> AppResult<bool> {
        let info: Option<CollectionInfo> = match self.check_collection().await {
            CollectionLookup::Found(info) => Some(info),
            CollectionLookup::Missing => None,
            CollectionLookup::Unavailable { diagnostic } => {
                warn!("{}", diagnostic);
                None
            }
        };

        let created = match info {
            None => {
                info!(
                    "Creating collection {} with vector size {}",
                    self.collection_name, self.vector_size
                );
                self.create_collection().await.map_err(|e| {
                    error!("Failed to initialize collection {}: {}", self.collection_name, e);
                    self.connection_error(e)
                })?;
                true
            }
            Some(info) if info.vector_size() == Some(self.vector_size) => {
                debug!("Collection {} already matches vector size", self.collection_name);
                false
            }
            Some(info) => {
                self.recreate_collection(info.vector_size()).await?;
                true
            }
        };

        self.create_payload_indexes().await;
        Ok(created)
    }

    async fn upsert_points(&self, points: Vec<PointStruct>) -> AppResult<()> {
        let points: Vec<PointStruct> = points
            .into_iter()
            .map(|mut point| {
                let segments = point
                    .payload
                    .get(payload::FILE_PATH)
                    .and_then(Value::as_str)
                    .map(path_segments);
                if let Some(segments) = segments {
                    point
                        .payload
                        .insert(payload::PATH_SEGMENTS.to_string(), Value::Object(segments));
                }
                point
            })
            .collect();

        debug!("Upserting {} points into {}", points.len(), self.collection_name);
        let request = UpsertPoints { points, wait: true };
        self.api
            .upsert(&self.collection_name, &request)
            .await
            .map_err(|e| {
                error!("Failed to upsert points into {}: {}", self.collection_name, e);
                AppError::from(e)
            })
    }

    async fn search(
        &self,
        query_vector: &[f32],
        directory_prefix: Option<&str>,
        min_score: Option<f32>,
        max_results: Option<usize>,
    ) -> AppResult<Vec<VectorStoreSearchResult>> {
        let request = QueryPoints {
            query: query_vector.to_vec(),
            filter: directory_filter(directory_prefix),
            score_threshold: min_score.unwrap_or(DEFAULT_SEARCH_MIN_SCORE),
            limit: max_results.unwrap_or(DEFAULT_MAX_SEARCH_RESULTS),
            params: SearchParams {
                hnsw_ef: SEARCH_HNSW_EF,
                exact: false,
            },
            with_payload: PayloadSelector {
                include: payload::SEARCH_FIELDS.iter().map(|f| f.to_string()).collect(),
            },
        };

        let response = self
            .api
            .query(&self.collection_name, &request)
            .await
            .map_err(|e| {
                error!("Failed to search points in {}: {}", self.collection_name, e);
                AppError::from(e)
            })?;

        let total = response.points.len();
        let results: Vec<VectorStoreSearchResult> = response
            .points
            .into_iter()
            .filter_map(|point| {
                validate_payload(point.payload).map(|payload| VectorStoreSearchResult {
                    id: point.id,
                    score: point.score,
                    payload,
                })
            })
            .collect();

        if results.len() < total {
            debug!(
                "Dropped {} search results with incomplete payloads",
                total - results.len()
            );
        }
        Ok(results)
    }

    async fn delete_points_by_file_path(&self, file_path: &str) -> AppResult<()> {
        self.delete_points_by_multiple_file_paths(&[file_path.to_string()])
            .await
    }

    async fn delete_points_by_multiple_file_paths(&self, file_paths: &[String]) -> AppResult<()> {
        if file_paths.is_empty() {
            return Ok(());
        }

        let conditions = file_paths
            .iter()
            .map(|path| FieldCondition::matches(payload::FILE_PATH, path.as_str()))
            .collect();
        self.delete_by_filter(Filter::should(conditions), "points by file path")
            .await
    }

    async fn clear_collection(&self) -> AppResult<()> {
        self.delete_by_filter(Filter::must(Vec::new()), "all points")
            .await?;
        info!("Cleared all points from {}", self.collection_name);
        Ok(())
    }

    async fn delete_collection(&self) -> AppResult<()> {
        if !self.collection_exists().await {
            debug!("Collection {} does not exist, nothing to delete", self.collection_name);
            return Ok(());
        }

        self.api
            .delete_collection(&self.collection_name)
            .await
            .map_err(|e| {
                error!("Failed to delete collection {}: {}", self.collection_name, e);
                AppError::from(e)
            })?;
        info!("Deleted collection {}", self.collection_name);
        Ok(())
    }

    async fn collection_exists(&self) -> bool {
        match self.check_collection().await {
            CollectionLookup::Found(_) => true,
            CollectionLookup::Missing => false,
            CollectionLookup::Unavailable { diagnostic } => {
                warn!("{}", diagnostic);
                false
            }
        }
    }
}
