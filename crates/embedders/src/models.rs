//! Built-in embedding model table.
//!
//! Maps (provider, model) to the vector dimension the model produces, a
//! calibrated minimum cosine score for search, and an optional prefix that
//! the model expects on search queries.

use crate::types::EmbedderProvider;

/// Fallback minimum similarity score when neither the user nor the model
/// table provides one.
pub const DEFAULT_SEARCH_MIN_SCORE: f32 = 0.4;

/// Fallback result count for searches.
pub const DEFAULT_MAX_SEARCH_RESULTS: usize = 50;

const NOMIC_CODE_QUERY_PREFIX: &str = "Represent this query for searching relevant code: ";

/// Static description of a known embedding model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelProfile {
    pub provider: EmbedderProvider,
    pub model_id: &'static str,
    pub dimension: u32,
    pub score_threshold: Option<f32>,
    pub query_prefix: Option<&'static str>,
}

const fn profile(
    provider: EmbedderProvider,
    model_id: &'static str,
    dimension: u32,
    score_threshold: f32,
) -> ModelProfile {
    ModelProfile {
        provider,
        model_id,
        dimension,
        score_threshold: Some(score_threshold),
        query_prefix: None,
    }
}

const fn prefixed(mut profile: ModelProfile, query_prefix: &'static str) -> ModelProfile {
    profile.query_prefix = Some(query_prefix);
    profile
}

use EmbedderProvider::{Gemini, Mistral, Ollama, OpenAi, OpenAiCompatible};

static MODEL_PROFILES: &[ModelProfile] = &[
    profile(OpenAi, "text-embedding-3-small", 1536, 0.4),
    profile(OpenAi, "text-embedding-3-large", 3072, 0.4),
    profile(OpenAi, "text-embedding-ada-002", 1536, 0.4),
    profile(Ollama, "nomic-embed-text", 768, 0.4),
    prefixed(profile(Ollama, "nomic-embed-code", 3584, 0.15), NOMIC_CODE_QUERY_PREFIX),
    profile(Ollama, "mxbai-embed-large", 1024, 0.4),
    profile(Ollama, "all-minilm", 384, 0.4),
    profile(OpenAiCompatible, "text-embedding-3-small", 1536, 0.4),
    profile(OpenAiCompatible, "text-embedding-3-large", 3072, 0.4),
    profile(OpenAiCompatible, "text-embedding-ada-002", 1536, 0.4),
    prefixed(
        profile(OpenAiCompatible, "nomic-embed-code", 3584, 0.15),
        NOMIC_CODE_QUERY_PREFIX,
    ),
    profile(Gemini, "text-embedding-004", 768, 0.4),
    profile(Gemini, "gemini-embedding-001", 3072, 0.4),
    profile(Mistral, "codestral-embed-2505", 1536, 0.4),
];

/// Model used when the settings do not name one.
pub fn default_model_id(provider: EmbedderProvider) -> &'static str {
    match provider {
        EmbedderProvider::OpenAi => "text-embedding-3-small",
        EmbedderProvider::Ollama => "nomic-embed-text:latest",
        EmbedderProvider::OpenAiCompatible => "text-embedding-3-small",
        EmbedderProvider::Gemini => "gemini-embedding-001",
        EmbedderProvider::Mistral => "codestral-embed-2505",
    }
}

/// The explicit model id if set and non-blank, else the provider default.
pub fn effective_model_id(provider: EmbedderProvider, model_id: Option<&str>) -> String {
    model_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| default_model_id(provider))
        .to_string()
}

/// Look up a model in the table.
pub fn model_profile(provider: EmbedderProvider, model_id: &str) -> Option<&'static ModelProfile> {
    let wanted = normalize_model_id(provider, model_id);
    MODEL_PROFILES
        .iter()
        .find(|p| p.provider == provider && p.model_id == wanted)
}

/// Built-in vector dimension for a model.
pub fn model_dimension(provider: EmbedderProvider, model_id: &str) -> Option<u32> {
    model_profile(provider, model_id).map(|p| p.dimension)
}

/// Calibrated minimum search score for a model.
pub fn model_score_threshold(provider: EmbedderProvider, model_id: &str) -> Option<f32> {
    model_profile(provider, model_id).and_then(|p| p.score_threshold)
}

/// Prefix the model expects on search queries.
pub fn model_query_prefix(provider: EmbedderProvider, model_id: &str) -> Option<&'static str> {
    model_profile(provider, model_id).and_then(|p| p.query_prefix)
}

/// Ollama addresses the same weights as `name` and `name:latest`.
fn normalize_model_id(provider: EmbedderProvider, model_id: &str) -> &str {
    let trimmed = model_id.trim();
    match provider {
        EmbedderProvider::Ollama => trimmed.strip_suffix(":latest").unwrap_or(trimmed),
        _ => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_default_model_has_a_dimension() {
        for provider in EmbedderProvider::ALL {
            let model = default_model_id(provider);
            assert!(
                model_dimension(provider, model).is_some(),
                "no dimension for default model of {}",
                provider
            );
        }
    }

    #[test]
    fn test_known_dimensions() {
        assert_eq!(model_dimension(OpenAi, "text-embedding-3-large"), Some(3072));
        assert_eq!(model_dimension(Gemini, "text-embedding-004"), Some(768));
        assert_eq!(model_dimension(Mistral, "codestral-embed-2505"), Some(1536));
        assert_eq!(model_dimension(OpenAi, "unknown-model"), None);
    }

    #[test]
    fn test_lookup_is_scoped_by_provider() {
        assert_eq!(model_dimension(Ollama, "text-embedding-3-small"), None);
        assert_eq!(model_dimension(Gemini, "nomic-embed-text"), None);
    }

    #[test]
    fn test_ollama_latest_tag_is_ignored() {
        assert_eq!(model_dimension(Ollama, "nomic-embed-text:latest"), Some(768));
        assert_eq!(model_dimension(Ollama, "nomic-embed-text"), Some(768));
        assert_eq!(model_dimension(OpenAi, "text-embedding-3-small:latest"), None);
    }

    #[test]
    fn test_score_threshold_and_prefix() {
        assert_eq!(model_score_threshold(Ollama, "nomic-embed-code"), Some(0.15));
        assert_eq!(model_score_threshold(OpenAi, "text-embedding-3-small"), Some(0.4));
        assert_eq!(model_score_threshold(OpenAi, "custom"), None);
        assert!(model_query_prefix(Ollama, "nomic-embed-code").is_some());
        assert!(model_query_prefix(Ollama, "nomic-embed-text").is_none());
    }

    #[test]
    fn test_effective_model_id() {
        assert_eq!(effective_model_id(Gemini, None), "gemini-embedding-001");
        assert_eq!(effective_model_id(Gemini, Some("  ")), "gemini-embedding-001");
        assert_eq!(
            effective_model_id(Gemini, Some("text-embedding-004")),
            "text-embedding-004"
        );
    }
}
