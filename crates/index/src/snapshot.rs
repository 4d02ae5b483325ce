//! Immutable configuration snapshot.
//!
//! A [`ConfigSnapshot`] is rebuilt in full from a [`ConfigSource`] on every
//! load. Everything the indexer derives from configuration (whether it is
//! configured, which dimension to use, search thresholds) is a pure function
//! of one snapshot.

use crate::constants::DEFAULT_QDRANT_URL;
use crate::settings::{secret_keys, ConfigSource, IndexSettings};
use codeindex_core::{AppError, AppResult};
use codeindex_embedders::models::{
    self, DEFAULT_MAX_SEARCH_RESULTS, DEFAULT_SEARCH_MIN_SCORE,
};
use codeindex_embedders::{EmbedderProvider, EmbedderSettings};
use serde::Serialize;
use serde_json::Value;

/// Base URL and key for an OpenAI-compatible endpoint.
///
/// Only present when both halves are set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenAiCompatibleCredentials {
    pub base_url: String,
    pub api_key: String,
}

/// Credentials for every provider, whether or not it is active.
///
/// Empty strings mean "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProviderCredentials {
    pub openai_api_key: String,
    pub ollama_base_url: String,
    pub openai_compatible: Option<OpenAiCompatibleCredentials>,
    pub gemini_api_key: String,
    pub mistral_api_key: String,
}

impl ProviderCredentials {
    pub fn openai_compatible_base_url(&self) -> &str {
        self.openai_compatible
            .as_ref()
            .map(|c| c.base_url.as_str())
            .unwrap_or("")
    }

    pub fn openai_compatible_api_key(&self) -> &str {
        self.openai_compatible
            .as_ref()
            .map(|c| c.api_key.as_str())
            .unwrap_or("")
    }
}

/// Qdrant endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreEndpoint {
    pub url: String,
    pub api_key: String,
}

impl Default for StoreEndpoint {
    fn default() -> Self {
        Self {
            url: DEFAULT_QDRANT_URL.to_string(),
            api_key: String::new(),
        }
    }
}

impl StoreEndpoint {
    pub fn api_key(&self) -> Option<&str> {
        Some(self.api_key.as_str()).filter(|k| !k.is_empty())
    }
}

/// Resolved indexing configuration at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigSnapshot {
    pub enabled: bool,
    pub provider: EmbedderProvider,
    /// Explicit model id; `None` means the provider default.
    pub model_id: Option<String>,
    /// User-supplied dimension override.
    pub model_dimension: Option<u32>,
    pub credentials: ProviderCredentials,
    pub store: StoreEndpoint,
    pub search_min_score: Option<f32>,
    pub search_max_results: Option<usize>,
}

impl Default for ConfigSnapshot {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: EmbedderProvider::default(),
            model_id: None,
            model_dimension: None,
            credentials: ProviderCredentials::default(),
            store: StoreEndpoint::default(),
            search_min_score: None,
            search_max_results: None,
        }
    }
}

impl ConfigSnapshot {
    /// Build a snapshot from the current contents of `source`.
    pub fn from_source(source: &dyn ConfigSource) -> Self {
        let settings = IndexSettings::read(source);
        let secret = |key: &str| source.secret(key).unwrap_or_default();

        let compatible_base_url = settings
            .codebase_index_open_ai_compatible_base_url
            .clone()
            .unwrap_or_default();
        let compatible_api_key = secret(secret_keys::OPENAI_COMPATIBLE_API_KEY);
        let openai_compatible = (!compatible_base_url.is_empty() && !compatible_api_key.is_empty())
            .then(|| OpenAiCompatibleCredentials {
                base_url: compatible_base_url,
                api_key: compatible_api_key,
            });

        Self {
            enabled: settings.codebase_index_enabled.unwrap_or(true),
            provider: EmbedderProvider::from_setting(
                settings.codebase_index_embedder_provider.as_deref(),
            ),
            model_id: settings
                .codebase_index_embedder_model_id
                .filter(|id| !id.is_empty()),
            model_dimension: parse_dimension(settings.codebase_index_embedder_model_dimension.as_ref()),
            credentials: ProviderCredentials {
                openai_api_key: secret(secret_keys::OPENAI_API_KEY),
                ollama_base_url: settings.codebase_index_embedder_base_url.unwrap_or_default(),
                openai_compatible,
                gemini_api_key: secret(secret_keys::GEMINI_API_KEY),
                mistral_api_key: secret(secret_keys::MISTRAL_API_KEY),
            },
            store: StoreEndpoint {
                url: settings
                    .codebase_index_qdrant_url
                    .unwrap_or_else(|| DEFAULT_QDRANT_URL.to_string()),
                api_key: secret(secret_keys::QDRANT_API_KEY),
            },
            search_min_score: settings.codebase_index_search_min_score,
            search_max_results: settings.codebase_index_search_max_results,
        }
    }

    /// Whether the active provider's required fields and the store URL are set.
    pub fn is_configured(&self) -> bool {
        let credentials = &self.credentials;
        let provider_ready = match self.provider {
            EmbedderProvider::OpenAi => !credentials.openai_api_key.is_empty(),
            EmbedderProvider::Ollama => !credentials.ollama_base_url.is_empty(),
            EmbedderProvider::OpenAiCompatible => credentials.openai_compatible.is_some(),
            EmbedderProvider::Gemini => !credentials.gemini_api_key.is_empty(),
            EmbedderProvider::Mistral => !credentials.mistral_api_key.is_empty(),
        };
        provider_ready && !self.store.url.is_empty()
    }

    /// Enabled and configured.
    pub fn is_active(&self) -> bool {
        self.enabled && self.is_configured()
    }

    /// The explicit model id, or the provider default.
    pub fn effective_model_id(&self) -> String {
        models::effective_model_id(self.provider, self.model_id.as_deref())
    }

    /// Vector dimension for the current model.
    ///
    /// The model table wins; the user override only applies to models the
    /// table does not know.
    pub fn current_model_dimension(&self) -> Option<u32> {
        models::model_dimension(self.provider, &self.effective_model_id())
            .or(self.model_dimension.filter(|d| *d > 0))
    }

    /// Like [`current_model_dimension`](Self::current_model_dimension) but
    /// failing when no dimension can be determined.
    pub fn require_model_dimension(&self) -> AppResult<u32> {
        self.current_model_dimension()
            .ok_or_else(|| AppError::DimensionUndetermined {
                provider: self.provider.to_string(),
                model: self.effective_model_id(),
            })
    }

    /// User setting, then the model's calibrated threshold, then the global default.
    pub fn current_search_min_score(&self) -> f32 {
        self.search_min_score
            .or_else(|| models::model_score_threshold(self.provider, &self.effective_model_id()))
            .unwrap_or(DEFAULT_SEARCH_MIN_SCORE)
    }

    pub fn current_search_max_results(&self) -> usize {
        self.search_max_results.unwrap_or(DEFAULT_MAX_SEARCH_RESULTS)
    }

    /// Provider settings for the embedder factory.
    ///
    /// # Errors
    /// `AppError::Config` naming the missing field when the active provider
    /// is not fully configured.
    pub fn embedder_settings(&self) -> AppResult<EmbedderSettings> {
        let credentials = &self.credentials;
        let model_id = self.model_id.clone();
        let missing = |what: &str| {
            AppError::Config(format!(
                "{} is required for the {} embedder",
                what, self.provider
            ))
        };
        let required = |value: &str, what: &str| {
            if value.is_empty() {
                Err(missing(what))
            } else {
                Ok(value.to_string())
            }
        };

        let settings = match self.provider {
            EmbedderProvider::OpenAi => EmbedderSettings::OpenAi {
                api_key: required(&credentials.openai_api_key, "OpenAI API key")?,
                model_id,
            },
            EmbedderProvider::Ollama => EmbedderSettings::Ollama {
                base_url: required(&credentials.ollama_base_url, "Ollama base URL")?,
                model_id,
            },
            EmbedderProvider::OpenAiCompatible => {
                let compatible = credentials
                    .openai_compatible
                    .as_ref()
                    .ok_or_else(|| missing("OpenAI-compatible base URL and API key"))?;
                EmbedderSettings::OpenAiCompatible {
                    base_url: compatible.base_url.clone(),
                    api_key: compatible.api_key.clone(),
                    model_id,
                }
            }
            EmbedderProvider::Gemini => EmbedderSettings::Gemini {
                api_key: required(&credentials.gemini_api_key, "Gemini API key")?,
                model_id,
            },
            EmbedderProvider::Mistral => EmbedderSettings::Mistral {
                api_key: required(&credentials.mistral_api_key, "Mistral API key")?,
                model_id,
            },
        };
        Ok(settings)
    }
}

/// Accept positive numbers and numeric strings; anything else is dropped.
fn parse_dimension(raw: Option<&Value>) -> Option<u32> {
    let raw = raw.filter(|v| !v.is_null())?;
    let parsed = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(d) if d > 0.0 && d.fract() == 0.0 && d <= f64::from(u32::MAX) => Some(d as u32),
        _ => {
            tracing::warn!(
                "Invalid codebaseIndexEmbedderModelDimension value: {}. Must be a positive number.",
                raw
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::InMemoryConfigSource;
    use serde_json::json;

    fn source_with(settings: Value) -> InMemoryConfigSource {
        let source = InMemoryConfigSource::new();
        source.set_index_settings(settings);
        source
    }

    #[test]
    fn test_defaults_when_nothing_persisted() {
        let snapshot = ConfigSnapshot::from_source(&InMemoryConfigSource::new());
        assert!(snapshot.enabled);
        assert_eq!(snapshot.provider, EmbedderProvider::OpenAi);
        assert_eq!(snapshot.store.url, "http://localhost:6333");
        assert!(!snapshot.is_configured());
        assert_eq!(snapshot, ConfigSnapshot::default());
    }

    #[test]
    fn test_explicit_empty_store_url_is_kept() {
        let source = source_with(json!({ "codebaseIndexQdrantUrl": "" }));
        source.set_secret(secret_keys::OPENAI_API_KEY, "sk");
        let snapshot = ConfigSnapshot::from_source(&source);
        assert_eq!(snapshot.store.url, "");
        assert!(!snapshot.is_configured());
    }

    type Fields = serde_json::Map<String, Value>;
    type Setup = fn(&InMemoryConfigSource, &mut Fields);

    fn openai_key(s: &InMemoryConfigSource, _: &mut Fields) {
        s.set_secret(secret_keys::OPENAI_API_KEY, "sk");
    }

    fn ollama_url(_: &InMemoryConfigSource, m: &mut Fields) {
        m.insert("codebaseIndexEmbedderBaseUrl".into(), json!("http://localhost:11434"));
    }

    fn compatible_url(_: &InMemoryConfigSource, m: &mut Fields) {
        m.insert(
            "codebaseIndexOpenAiCompatibleBaseUrl".into(),
            json!("https://api.example.com/v1"),
        );
    }

    fn compatible_key(s: &InMemoryConfigSource, _: &mut Fields) {
        s.set_secret(secret_keys::OPENAI_COMPATIBLE_API_KEY, "key");
    }

    fn gemini_key(s: &InMemoryConfigSource, _: &mut Fields) {
        s.set_secret(secret_keys::GEMINI_API_KEY, "g");
    }

    fn mistral_key(s: &InMemoryConfigSource, _: &mut Fields) {
        s.set_secret(secret_keys::MISTRAL_API_KEY, "m");
    }

    #[test]
    fn test_is_configured_matrix() {
        let cases: Vec<(&str, Vec<Setup>)> = vec![
            ("openai", vec![openai_key as Setup]),
            ("ollama", vec![ollama_url as Setup]),
            ("openai-compatible", vec![compatible_url as Setup, compatible_key as Setup]),
            ("gemini", vec![gemini_key as Setup]),
            ("mistral", vec![mistral_key as Setup]),
        ];

        for (provider, fields) in cases {
            let field_count = fields.len();
            for mask in 0..(1u32 << field_count) {
                for with_store in [true, false] {
                    let source = InMemoryConfigSource::new();
                    let mut settings = Fields::new();
                    settings.insert("codebaseIndexEmbedderProvider".into(), json!(provider));
                    if !with_store {
                        settings.insert("codebaseIndexQdrantUrl".into(), json!(""));
                    }
                    for (i, setup) in fields.iter().enumerate() {
                        if mask & (1 << i) != 0 {
                            setup(&source, &mut settings);
                        }
                    }
                    source.set_index_settings(Value::Object(settings));

                    let all_fields = mask == (1 << field_count) - 1;
                    let snapshot = ConfigSnapshot::from_source(&source);
                    assert_eq!(
                        snapshot.is_configured(),
                        all_fields && with_store,
                        "provider={} mask={:b} store={}",
                        provider,
                        mask,
                        with_store
                    );
                }
            }
        }
    }

    #[test]
    fn test_dimension_parsing() {
        assert_eq!(parse_dimension(Some(&json!(1024))), Some(1024));
        assert_eq!(parse_dimension(Some(&json!("768"))), Some(768));
        assert_eq!(parse_dimension(Some(&json!(0))), None);
        assert_eq!(parse_dimension(Some(&json!(-5))), None);
        assert_eq!(parse_dimension(Some(&json!("abc"))), None);
        assert_eq!(parse_dimension(Some(&Value::Null)), None);
        assert_eq!(parse_dimension(None), None);
    }

    #[test]
    fn test_model_table_beats_override() {
        let snapshot = ConfigSnapshot {
            model_id: Some("text-embedding-3-large".into()),
            model_dimension: Some(512),
            ..Default::default()
        };
        assert_eq!(snapshot.current_model_dimension(), Some(3072));

        let custom = ConfigSnapshot {
            model_id: Some("custom-model".into()),
            model_dimension: Some(512),
            ..Default::default()
        };
        assert_eq!(custom.current_model_dimension(), Some(512));

        let unknown = ConfigSnapshot {
            model_id: Some("custom-model".into()),
            ..Default::default()
        };
        assert_eq!(unknown.current_model_dimension(), None);
        assert!(matches!(
            unknown.require_model_dimension(),
            Err(AppError::DimensionUndetermined { .. })
        ));
    }

    #[test]
    fn test_search_min_score_priority() {
        let user = ConfigSnapshot {
            search_min_score: Some(0.7),
            ..Default::default()
        };
        assert_eq!(user.current_search_min_score(), 0.7);

        let model = ConfigSnapshot {
            provider: EmbedderProvider::Ollama,
            model_id: Some("nomic-embed-code".into()),
            ..Default::default()
        };
        assert_eq!(model.current_search_min_score(), 0.15);

        let fallback = ConfigSnapshot {
            model_id: Some("custom-model".into()),
            ..Default::default()
        };
        assert_eq!(fallback.current_search_min_score(), DEFAULT_SEARCH_MIN_SCORE);
    }

    #[test]
    fn test_search_max_results_default() {
        assert_eq!(
            ConfigSnapshot::default().current_search_max_results(),
            DEFAULT_MAX_SEARCH_RESULTS
        );
        let custom = ConfigSnapshot {
            search_max_results: Some(10),
            ..Default::default()
        };
        assert_eq!(custom.current_search_max_results(), 10);
    }

    #[test]
    fn test_embedder_settings_names_missing_field() {
        let snapshot = ConfigSnapshot {
            provider: EmbedderProvider::Gemini,
            ..Default::default()
        };
        let err = snapshot.embedder_settings().unwrap_err();
        assert!(err.to_string().contains("Gemini API key"));

        let ollama = ConfigSnapshot {
            provider: EmbedderProvider::Ollama,
            credentials: ProviderCredentials {
                ollama_base_url: "http://localhost:11434".into(),
                ..Default::default()
            },
            model_id: Some("mxbai-embed-large".into()),
            ..Default::default()
        };
        assert_eq!(
            ollama.embedder_settings().unwrap(),
            EmbedderSettings::Ollama {
                base_url: "http://localhost:11434".into(),
                model_id: Some("mxbai-embed-large".into()),
            }
        );
    }

    #[test]
    fn test_compatible_credentials_need_both_halves() {
        let source = source_with(json!({
            "codebaseIndexEmbedderProvider": "openai-compatible",
            "codebaseIndexOpenAiCompatibleBaseUrl": "https://api.example.com/v1"
        }));
        let snapshot = ConfigSnapshot::from_source(&source);
        assert!(snapshot.credentials.openai_compatible.is_none());
        assert_eq!(snapshot.credentials.openai_compatible_base_url(), "");
    }
}
