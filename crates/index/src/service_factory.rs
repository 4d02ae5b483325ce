//! Builds the embedder and vector store a configuration snapshot describes.

use crate::snapshot::ConfigSnapshot;
use crate::vector_store::{QdrantVectorStore, VectorStore};
use codeindex_core::{AppError, AppResult};
use codeindex_embedders::{create_embedder, Embedder, HttpOptions, ValidationResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct ServiceFactory {
    workspace_path: PathBuf,
    http: HttpOptions,
}

impl ServiceFactory {
    pub fn new(workspace_path: impl Into<PathBuf>, http: HttpOptions) -> Self {
        Self {
            workspace_path: workspace_path.into(),
            http,
        }
    }

    pub fn workspace_path(&self) -> &Path {
        &self.workspace_path
    }

    pub fn create_embedder(&self, snapshot: &ConfigSnapshot) -> AppResult<Arc<dyn Embedder>> {
        let settings = snapshot.embedder_settings()?;
        debug!("Creating {} embedder", settings.provider());
        create_embedder(&settings, &self.http)
    }

    /// Probe the embedder. Unexpected faults are folded into the result.
    pub async fn validate_embedder(&self, embedder: &dyn Embedder) -> ValidationResult {
        match embedder.validate_configuration().await {
            Ok(result) => result,
            Err(e) => {
                warn!("Embedder validation failed: {}", e);
                ValidationResult::invalid(e.to_string())
            }
        }
    }

    /// Vector store for the workspace, sized for the configured model.
    pub fn create_qdrant_store(&self, snapshot: &ConfigSnapshot) -> AppResult<QdrantVectorStore> {
        let dimension = snapshot.require_model_dimension()?;
        if snapshot.store.url.trim().is_empty() {
            return Err(AppError::Config(
                "Qdrant URL is required to create the vector store".to_string(),
            ));
        }

        QdrantVectorStore::new(
            &self.workspace_path,
            Some(snapshot.store.url.as_str()),
            dimension,
            snapshot.store.api_key(),
            &self.http,
        )
    }

    pub fn create_vector_store(&self, snapshot: &ConfigSnapshot) -> AppResult<Arc<dyn VectorStore>> {
        Ok(Arc::new(self.create_qdrant_store(snapshot)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::ProviderCredentials;
    use codeindex_embedders::{EmbedderInfo, EmbedderProvider, EmbeddingResponse};

    fn factory() -> ServiceFactory {
        ServiceFactory::new("/test/workspace", HttpOptions::default())
    }

    fn openai_snapshot() -> ConfigSnapshot {
        ConfigSnapshot {
            credentials: ProviderCredentials {
                openai_api_key: "sk-test".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[derive(Debug)]
    struct BrokenEmbedder;

    #[async_trait::async_trait]
    impl Embedder for BrokenEmbedder {
        fn embedder_info(&self) -> EmbedderInfo {
            EmbedderInfo {
                provider: EmbedderProvider::OpenAi,
                model_id: "text-embedding-3-small".to_string(),
            }
        }

        async fn create_embeddings(
            &self,
            _texts: &[String],
            _model: Option<&str>,
        ) -> AppResult<EmbeddingResponse> {
            Err(AppError::Embedder("unreachable".to_string()))
        }

        async fn validate_configuration(&self) -> AppResult<ValidationResult> {
            Err(AppError::Embedder("socket closed".to_string()))
        }
    }

    #[test]
    fn test_create_embedder_from_snapshot() {
        let embedder = factory().create_embedder(&openai_snapshot()).unwrap();
        assert_eq!(embedder.embedder_info().provider, EmbedderProvider::OpenAi);
    }

    #[test]
    fn test_create_embedder_requires_credentials() {
        let err = factory()
            .create_embedder(&ConfigSnapshot::default())
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_vector_store_uses_model_dimension() {
        let store = factory().create_qdrant_store(&openai_snapshot()).unwrap();
        assert_eq!(store.vector_size(), 1536);
        assert_eq!(store.connection().base_url(), "http://localhost:6333");
        assert!(store.collection_name().starts_with("ws-"));
    }

    #[test]
    fn test_vector_store_needs_dimension() {
        let snapshot = ConfigSnapshot {
            model_id: Some("unknown-model".to_string()),
            ..openai_snapshot()
        };
        assert!(matches!(
            factory().create_qdrant_store(&snapshot),
            Err(AppError::DimensionUndetermined { .. })
        ));

        let overridden = ConfigSnapshot {
            model_dimension: Some(384),
            ..snapshot
        };
        let store = factory().create_qdrant_store(&overridden).unwrap();
        assert_eq!(store.vector_size(), 384);
    }

    #[test]
    fn test_vector_store_needs_url() {
        let mut snapshot = openai_snapshot();
        snapshot.store.url = String::new();
        match factory().create_qdrant_store(&snapshot) {
            Err(AppError::Config(message)) => assert!(message.contains("Qdrant URL is required")),
            other => panic!("unexpected result: {:?}", other.map(|s| s.collection_name().to_string())),
        }
    }

    #[tokio::test]
    async fn test_validation_faults_become_invalid() {
        let result = factory().validate_embedder(&BrokenEmbedder).await;
        assert!(!result.valid);
        assert!(result.error.unwrap_or_default().contains("socket closed"));
    }
}
