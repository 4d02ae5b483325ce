//! OpenAI-compatible embedding provider.
//!
//! Speaks the `POST {base_url}/embeddings` API. Used directly for OpenAI and
//! arbitrary compatible endpoints, and for Gemini and Mistral through their
//! OpenAI-compatible surfaces.

use crate::embedder::Embedder;
use crate::http::HttpOptions;
use crate::models;
use crate::types::{
    EmbedderInfo, EmbedderProvider, EmbeddingResponse, EmbeddingUsage, ValidationResult,
};
use codeindex_core::{AppError, AppResult};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const MISTRAL_BASE_URL: &str = "https://api.mistral.ai/v1";

/// Maximum texts sent in one request
const MAX_BATCH_SIZE: usize = 100;

/// Maximum attempts when the provider rate-limits us
const MAX_RETRIES: u32 = 3;

/// Initial backoff duration in milliseconds
const INITIAL_BACKOFF_MS: u64 = 500;

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a [String],
    model: &'a str,
    encoding_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

#[derive(Debug, Deserialize)]
struct EmbeddingApiResponse {
    data: Vec<EmbeddingData>,
    #[serde(default)]
    usage: Option<EmbeddingUsage>,
}

/// Why a single embeddings request failed.
#[derive(Debug, Error)]
enum RequestFailure {
    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("connection failed: {0}")]
    Transport(String),
    #[error("invalid response: {0}")]
    Decode(String),
}

/// Embedder for OpenAI-style `/embeddings` endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleEmbedder {
    client: Client,
    provider: EmbedderProvider,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiCompatibleEmbedder {
    /// Create an embedder for `provider` talking to `base_url`.
    pub fn new(
        provider: EmbedderProvider,
        base_url: &str,
        api_key: &str,
        model_id: Option<&str>,
        http: &HttpOptions,
    ) -> AppResult<Self> {
        Ok(Self {
            client: http.build_client()?,
            provider,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: models::effective_model_id(provider, model_id),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/embeddings", self.base_url)
    }

    #[instrument(skip(self, texts), fields(provider = %self.provider, batch_size = texts.len()))]
    async fn request_batch(
        &self,
        texts: &[String],
        model: &str,
    ) -> Result<EmbeddingApiResponse, RequestFailure> {
        let body = EmbeddingRequest {
            input: texts,
            model,
            encoding_format: "float",
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            debug!("Sending embedding request to {}", self.endpoint());

            let response = self
                .client
                .post(self.endpoint())
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await
                .map_err(|e| RequestFailure::Transport(e.to_string()))?;

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS && attempt < MAX_RETRIES {
                let backoff_ms = INITIAL_BACKOFF_MS * 2_u64.pow(attempt - 1);
                warn!(
                    "Rate limited by {} (attempt {}/{}), retrying in {}ms",
                    self.provider, attempt, MAX_RETRIES, backoff_ms
                );
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                continue;
            }

            if !status.is_success() {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(RequestFailure::Status { status, body });
            }

            return response
                .json::<EmbeddingApiResponse>()
                .await
                .map_err(|e| RequestFailure::Decode(e.to_string()));
        }
    }

    fn to_app_error(&self, failure: RequestFailure) -> AppError {
        AppError::Embedder(format!(
            "{} embedding request failed: {}",
            self.provider, failure
        ))
    }
}

#[async_trait::async_trait]
impl Embedder for OpenAiCompatibleEmbedder {
    fn embedder_info(&self) -> EmbedderInfo {
        EmbedderInfo {
            provider: self.provider,
            model_id: self.model.clone(),
        }
    }

    async fn create_embeddings(
        &self,
        texts: &[String],
        model: Option<&str>,
    ) -> AppResult<EmbeddingResponse> {
        let model = model.unwrap_or(&self.model);
        let mut result = EmbeddingResponse::default();
        let mut usage = EmbeddingUsage::default();

        for batch in texts.chunks(MAX_BATCH_SIZE) {
            let mut response = self
                .request_batch(batch, model)
                .await
                .map_err(|f| self.to_app_error(f))?;

            if response.data.len() != batch.len() {
                return Err(AppError::Embedder(format!(
                    "{} returned {} embeddings for {} inputs",
                    self.provider,
                    response.data.len(),
                    batch.len()
                )));
            }

            response.data.sort_by_key(|d| d.index);
            result
                .embeddings
                .extend(response.data.into_iter().map(|d| d.embedding));

            if let Some(u) = response.usage {
                usage.prompt_tokens += u.prompt_tokens;
                usage.total_tokens += u.total_tokens;
            }
        }

        result.usage = Some(usage);
        Ok(result)
    }

    async fn validate_configuration(&self) -> AppResult<ValidationResult> {
        let probe = vec!["test".to_string()];
        let result = match self.request_batch(&probe, &self.model).await {
            Ok(response) if response.data.is_empty() => {
                ValidationResult::invalid(format!("{} returned no embeddings", self.provider))
            }
            Ok(_) => ValidationResult::ok(),
            Err(RequestFailure::Status { status, .. })
                if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN =>
            {
                ValidationResult::invalid(format!(
                    "Authentication failed for {}. Check your API key.",
                    self.provider
                ))
            }
            Err(RequestFailure::Status { status, .. }) if status == StatusCode::NOT_FOUND => {
                ValidationResult::invalid(format!(
                    "Model '{}' or endpoint {} not found",
                    self.model,
                    self.endpoint()
                ))
            }
            Err(RequestFailure::Transport(e)) => ValidationResult::invalid(format!(
                "Could not connect to {}: {}",
                self.base_url, e
            )),
            Err(other) => ValidationResult::invalid(other.to_string()),
        };
        Ok(result)
    }
}
