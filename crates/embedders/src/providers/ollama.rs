//! Ollama embedding provider.
//!
//! Talks to a local Ollama runtime through `POST /api/embed`, which accepts a
//! batch of inputs in one request.

use crate::embedder::Embedder;
use crate::http::HttpOptions;
use crate::models;
use crate::types::{EmbedderInfo, EmbedderProvider, EmbeddingResponse, ValidationResult};
use codeindex_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const EMBED_ENDPOINT: &str = "/api/embed";
const TAGS_ENDPOINT: &str = "/api/tags";

/// Maximum retry attempts for failed requests
const MAX_RETRIES: u32 = 3;

/// Initial backoff duration in milliseconds
const INITIAL_BACKOFF_MS: u64 = 100;

/// Ollama embedding provider using the local API
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: Client,
    /// Ollama API base URL
    base_url: String,
    /// Model name (e.g., "nomic-embed-text")
    model: String,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

impl OllamaEmbedder {
    /// Create an embedder for the Ollama runtime at `base_url`.
    ///
    /// A blank `base_url` selects [`DEFAULT_OLLAMA_URL`].
    pub fn new(base_url: &str, model_id: Option<&str>, http: &HttpOptions) -> AppResult<Self> {
        let base_url = match base_url.trim() {
            "" => DEFAULT_OLLAMA_URL,
            url => url,
        };

        Ok(Self {
            client: http.build_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: models::effective_model_id(EmbedderProvider::Ollama, model_id),
        })
    }

    /// Embed a batch with retry logic
    #[instrument(skip(self, texts), fields(batch_size = texts.len(), model = %model))]
    async fn embed_with_retries(&self, texts: &[String], model: &str) -> AppResult<Vec<Vec<f32>>> {
        let mut attempt = 0;
        let mut last_error = None;

        while attempt < MAX_RETRIES {
            match self.embed_once(texts, model).await {
                Ok(embeddings) => return Ok(embeddings),
                Err(e) => {
                    attempt += 1;
                    last_error = Some(e);

                    if attempt < MAX_RETRIES {
                        let backoff_ms = INITIAL_BACKOFF_MS * 2_u64.pow(attempt);
                        warn!(
                            "Embedding failed (attempt {}/{}), retrying in {}ms",
                            attempt, MAX_RETRIES, backoff_ms
                        );
                        tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| AppError::Embedder("Unknown embedding error".to_string())))
    }

    async fn embed_once(&self, texts: &[String], model: &str) -> AppResult<Vec<Vec<f32>>> {
        let url = format!("{}{}", self.base_url, EMBED_ENDPOINT);
        debug!("Sending embedding request to {}", url);

        let response = self
            .client
            .post(&url)
            .json(&EmbedRequest { model, input: texts })
            .send()
            .await
            .map_err(|e| AppError::Embedder(format!("Failed to send request to Ollama: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = serde_json::from_str::<ErrorResponse>(&error_text)
                .map(|e| e.error)
                .unwrap_or(error_text);
            return Err(AppError::Embedder(format!(
                "Ollama API error ({}): {}",
                status, message
            )));
        }

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| AppError::Embedder(format!("Failed to parse Ollama response: {}", e)))?;

        if body.embeddings.len() != texts.len() {
            return Err(AppError::Embedder(format!(
                "Ollama returned {} embeddings for {} inputs",
                body.embeddings.len(),
                texts.len()
            )));
        }

        Ok(body.embeddings)
    }

    async fn installed_models(&self) -> Result<Vec<String>, String> {
        let url = format!("{}{}", self.base_url, TAGS_ENDPOINT);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| {
                format!(
                    "Ollama not available at {}. Ensure Ollama is running. ({})",
                    self.base_url, e
                )
            })?;

        if !response.status().is_success() {
            return Err(format!(
                "Ollama at {} answered {} for {}",
                self.base_url,
                response.status(),
                TAGS_ENDPOINT
            ));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse Ollama model list: {}", e))?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

/// Whether `wanted` is among `installed`, treating `name` and `name:latest`
/// as the same model.
fn model_installed(installed: &[String], wanted: &str) -> bool {
    let strip = |s: &str| s.strip_suffix(":latest").unwrap_or(s).to_string();
    let wanted = strip(wanted);
    installed.iter().any(|name| strip(name) == wanted)
}

#[async_trait::async_trait]
impl Embedder for OllamaEmbedder {
    fn embedder_info(&self) -> EmbedderInfo {
        EmbedderInfo {
            provider: EmbedderProvider::Ollama,
            model_id: self.model.clone(),
        }
    }

    #[instrument(skip(self, texts), fields(batch_size = texts.len(), provider = "ollama"))]
    async fn create_embeddings(
        &self,
        texts: &[String],
        model: Option<&str>,
    ) -> AppResult<EmbeddingResponse> {
        if texts.is_empty() {
            return Ok(EmbeddingResponse::default());
        }

        let model = model.unwrap_or(&self.model);
        let embeddings = self.embed_with_retries(texts, model).await?;
        debug!("Generated {} embeddings", embeddings.len());

        Ok(EmbeddingResponse {
            embeddings,
            usage: None,
        })
    }

    #[instrument(skip(self), fields(model = %self.model))]
    async fn validate_configuration(&self) -> AppResult<ValidationResult> {
        let installed = match self.installed_models().await {
            Ok(models) => models,
            Err(message) => {
                error!("{}", message);
                return Ok(ValidationResult::invalid(message));
            }
        };

        if !model_installed(&installed, &self.model) {
            return Ok(ValidationResult::invalid(format!(
                "Model '{}' is not installed in Ollama. Run: ollama pull {}",
                self.model, self.model
            )));
        }

        match self.embed_once(&["test".to_string()], &self.model).await {
            Ok(_) => Ok(ValidationResult::ok()),
            Err(e) => Ok(ValidationResult::invalid(format!(
                "Model '{}' cannot produce embeddings: {}",
                self.model, e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_base_url_uses_default() {
        let embedder = OllamaEmbedder::new("  ", None, &HttpOptions::default()).unwrap();
        assert_eq!(embedder.base_url, DEFAULT_OLLAMA_URL);
        assert_eq!(embedder.embedder_info().model_id, "nomic-embed-text:latest");
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let embedder = OllamaEmbedder::new(
            "http://gpu-box:11434/",
            Some("mxbai-embed-large"),
            &HttpOptions::default(),
        )
        .unwrap();
        assert_eq!(embedder.base_url, "http://gpu-box:11434");
        assert_eq!(embedder.embedder_info().model_id, "mxbai-embed-large");
    }

    #[test]
    fn test_model_installed_ignores_latest_tag() {
        let installed = vec!["nomic-embed-text:latest".to_string(), "all-minilm:l6".to_string()];
        assert!(model_installed(&installed, "nomic-embed-text"));
        assert!(model_installed(&installed, "nomic-embed-text:latest"));
        assert!(model_installed(&installed, "all-minilm:l6"));
        assert!(!model_installed(&installed, "all-minilm"));
    }

    #[tokio::test]
    async fn test_empty_batch_skips_network() {
        let embedder = OllamaEmbedder::new("http://127.0.0.1:9", None, &HttpOptions::default()).unwrap();
        let response = embedder.create_embeddings(&[], None).await.unwrap();
        assert!(response.embeddings.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_runtime_reports_invalid() {
        let embedder = OllamaEmbedder::new("http://127.0.0.1:9", None, &HttpOptions::default()).unwrap();
        let result = embedder.validate_configuration().await.unwrap();
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("Ollama not available"));
    }
}
