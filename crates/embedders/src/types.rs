//! Embedder types.
//!
//! This module defines the provider identity and the request/response shapes
//! shared by every embedder.

use codeindex_core::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Embedding provider identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EmbedderProvider {
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "ollama")]
    Ollama,
    #[serde(rename = "openai-compatible")]
    OpenAiCompatible,
    #[serde(rename = "gemini")]
    Gemini,
    #[serde(rename = "mistral")]
    Mistral,
}

impl EmbedderProvider {
    /// All providers, in settings order.
    pub const ALL: [EmbedderProvider; 5] = [
        EmbedderProvider::OpenAi,
        EmbedderProvider::Ollama,
        EmbedderProvider::OpenAiCompatible,
        EmbedderProvider::Gemini,
        EmbedderProvider::Mistral,
    ];

    /// Settings identifier for this provider.
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbedderProvider::OpenAi => "openai",
            EmbedderProvider::Ollama => "ollama",
            EmbedderProvider::OpenAiCompatible => "openai-compatible",
            EmbedderProvider::Gemini => "gemini",
            EmbedderProvider::Mistral => "mistral",
        }
    }

    /// Parse a persisted provider value, falling back to OpenAI for anything
    /// unrecognised or missing.
    pub fn from_setting(value: Option<&str>) -> Self {
        value
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }
}

impl fmt::Display for EmbedderProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmbedderProvider {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EmbedderProvider::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| {
                AppError::Config(format!(
                    "Invalid embedder type '{}'. Supported: openai, ollama, openai-compatible, gemini, mistral",
                    s
                ))
            })
    }
}

/// Token usage reported by a provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// Embeddings for a batch of texts, in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    pub embeddings: Vec<Vec<f32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<EmbeddingUsage>,
}

/// Outcome of probing an embedder's configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(error.into()),
        }
    }
}

/// Identity of a constructed embedder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedderInfo {
    pub provider: EmbedderProvider,
    pub model_id: String,
}
