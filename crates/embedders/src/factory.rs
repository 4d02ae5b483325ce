//! Embedder factory.
//!
//! [`EmbedderSettings`] carries exactly the fields one provider needs, so a
//! constructed value can be turned into a client without consulting any other
//! configuration.

use crate::embedder::Embedder;
use crate::http::HttpOptions;
use crate::providers::openai_compatible::{GEMINI_BASE_URL, MISTRAL_BASE_URL, OPENAI_BASE_URL};
use crate::providers::{OllamaEmbedder, OpenAiCompatibleEmbedder};
use crate::types::EmbedderProvider;
use codeindex_core::{AppError, AppResult};
use std::sync::Arc;

/// Provider-specific embedder configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbedderSettings {
    OpenAi {
        api_key: String,
        model_id: Option<String>,
    },
    Ollama {
        base_url: String,
        model_id: Option<String>,
    },
    OpenAiCompatible {
        base_url: String,
        api_key: String,
        model_id: Option<String>,
    },
    Gemini {
        api_key: String,
        model_id: Option<String>,
    },
    Mistral {
        api_key: String,
        model_id: Option<String>,
    },
}

impl EmbedderSettings {
    pub fn provider(&self) -> EmbedderProvider {
        match self {
            EmbedderSettings::OpenAi { .. } => EmbedderProvider::OpenAi,
            EmbedderSettings::Ollama { .. } => EmbedderProvider::Ollama,
            EmbedderSettings::OpenAiCompatible { .. } => EmbedderProvider::OpenAiCompatible,
            EmbedderSettings::Gemini { .. } => EmbedderProvider::Gemini,
            EmbedderSettings::Mistral { .. } => EmbedderProvider::Mistral,
        }
    }

    pub fn model_id(&self) -> Option<&str> {
        match self {
            EmbedderSettings::OpenAi { model_id, .. }
            | EmbedderSettings::Ollama { model_id, .. }
            | EmbedderSettings::OpenAiCompatible { model_id, .. }
            | EmbedderSettings::Gemini { model_id, .. }
            | EmbedderSettings::Mistral { model_id, .. } => model_id.as_deref(),
        }
    }

    /// Reject settings whose required fields are blank.
    pub fn validate(&self) -> AppResult<()> {
        let missing = |what: &str| {
            Err(AppError::Config(format!(
                "{} configuration missing: {}",
                self.provider(),
                what
            )))
        };

        match self {
            EmbedderSettings::OpenAi { api_key, .. }
            | EmbedderSettings::Gemini { api_key, .. }
            | EmbedderSettings::Mistral { api_key, .. } => {
                if api_key.trim().is_empty() {
                    return missing("API key");
                }
            }
            EmbedderSettings::Ollama { base_url, .. } => {
                if base_url.trim().is_empty() {
                    return missing("base URL");
                }
            }
            EmbedderSettings::OpenAiCompatible {
                base_url, api_key, ..
            } => {
                if base_url.trim().is_empty() {
                    return missing("base URL");
                }
                if api_key.trim().is_empty() {
                    return missing("API key");
                }
            }
        }
        Ok(())
    }
}

/// Create an embedder for the given settings.
///
/// # Errors
/// Returns `AppError::Config` when a required field is blank, or when the
/// HTTP client cannot be built (for example an invalid proxy URL).
pub fn create_embedder(
    settings: &EmbedderSettings,
    http: &HttpOptions,
) -> AppResult<Arc<dyn Embedder>> {
    settings.validate()?;
    let model_id = settings.model_id();

    let embedder: Arc<dyn Embedder> = match settings {
        EmbedderSettings::OpenAi { api_key, .. } => Arc::new(OpenAiCompatibleEmbedder::new(
            EmbedderProvider::OpenAi,
            OPENAI_BASE_URL,
            api_key,
            model_id,
            http,
        )?),
        EmbedderSettings::Ollama { base_url, .. } => {
            Arc::new(OllamaEmbedder::new(base_url, model_id, http)?)
        }
        EmbedderSettings::OpenAiCompatible {
            base_url, api_key, ..
        } => Arc::new(OpenAiCompatibleEmbedder::new(
            EmbedderProvider::OpenAiCompatible,
            base_url,
            api_key,
            model_id,
            http,
        )?),
        EmbedderSettings::Gemini { api_key, .. } => Arc::new(OpenAiCompatibleEmbedder::new(
            EmbedderProvider::Gemini,
            GEMINI_BASE_URL,
            api_key,
            model_id,
            http,
        )?),
        EmbedderSettings::Mistral { api_key, .. } => Arc::new(OpenAiCompatibleEmbedder::new(
            EmbedderProvider::Mistral,
            MISTRAL_BASE_URL,
            api_key,
            model_id,
            http,
        )?),
    };

    tracing::debug!(
        "Created {} embedder with model {}",
        settings.provider(),
        embedder.embedder_info().model_id
    );
    Ok(embedder)
}
