//! The embedder capability.
//!
//! Indexing and search treat every provider through this single trait.

use crate::types::{EmbedderInfo, EmbeddingResponse, ValidationResult};
use codeindex_core::{AppError, AppResult};

/// Trait for embedding providers.
///
/// Implementations map text to fixed-length vectors and can probe their own
/// configuration (credentials, endpoint reachability, model availability).
#[async_trait::async_trait]
pub trait Embedder: Send + Sync + std::fmt::Debug {
    /// Provider and model this embedder was constructed with.
    fn embedder_info(&self) -> EmbedderInfo;

    /// Embed a batch of texts.
    ///
    /// `model` overrides the constructed model for this call only.
    /// Embeddings are returned in input order.
    async fn create_embeddings(
        &self,
        texts: &[String],
        model: Option<&str>,
    ) -> AppResult<EmbeddingResponse>;

    /// Check that the configured endpoint accepts our credentials and model.
    ///
    /// Expected failures (bad key, unknown model) are reported as an invalid
    /// [`ValidationResult`]; `Err` is reserved for unexpected faults.
    async fn validate_configuration(&self) -> AppResult<ValidationResult>;

    /// Embed a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut response = self.create_embeddings(&[text.to_string()], None).await?;
        response
            .embeddings
            .pop()
            .ok_or_else(|| AppError::Embedder("No embedding returned".to_string()))
    }
}
