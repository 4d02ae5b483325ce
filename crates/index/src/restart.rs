//! Restart decision engine.
//!
//! Compares two configuration snapshots and decides whether the running
//! indexing service has to be torn down and rebuilt. Search tuning changes
//! never restart; anything that can invalidate the vector space always does.

use crate::snapshot::ConfigSnapshot;
use codeindex_embedders::models;
use serde::Serialize;
use std::fmt;

/// Why a configuration transition requires a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RestartReason {
    /// Became enabled and configured.
    Activated,
    /// Was enabled, now disabled.
    Deactivated,
    ProviderChanged,
    /// An embedder key or base URL changed.
    CredentialsChanged,
    /// The explicit dimension override changed.
    ModelDimensionChanged,
    /// Qdrant URL or API key changed.
    StoreChanged,
    /// The model change implies a different (or unknown) vector size.
    VectorDimensionChanged,
}

impl RestartReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RestartReason::Activated => "indexing activated",
            RestartReason::Deactivated => "indexing deactivated",
            RestartReason::ProviderChanged => "embedder provider changed",
            RestartReason::CredentialsChanged => "embedder credentials changed",
            RestartReason::ModelDimensionChanged => "model dimension changed",
            RestartReason::StoreChanged => "vector store endpoint changed",
            RestartReason::VectorDimensionChanged => "vector dimension changed",
        }
    }
}

impl fmt::Display for RestartReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decide whether moving from `previous` to `current` needs a restart.
///
/// Rules are evaluated in order and the first match wins.
pub fn restart_reason(previous: &ConfigSnapshot, current: &ConfigSnapshot) -> Option<RestartReason> {
    let was_active = previous.is_active();
    let now_active = current.is_active();

    if !was_active && now_active {
        return Some(RestartReason::Activated);
    }
    if previous.enabled && !current.enabled {
        return Some(RestartReason::Deactivated);
    }
    if !was_active && !now_active {
        return None;
    }
    if !current.enabled {
        return None;
    }

    if previous.provider != current.provider {
        return Some(RestartReason::ProviderChanged);
    }

    let (prev, cur) = (&previous.credentials, &current.credentials);
    if prev.openai_api_key != cur.openai_api_key
        || prev.ollama_base_url != cur.ollama_base_url
        || prev.openai_compatible_base_url() != cur.openai_compatible_base_url()
        || prev.openai_compatible_api_key() != cur.openai_compatible_api_key()
        || prev.gemini_api_key != cur.gemini_api_key
        || prev.mistral_api_key != cur.mistral_api_key
    {
        return Some(RestartReason::CredentialsChanged);
    }

    if previous.model_dimension != current.model_dimension {
        return Some(RestartReason::ModelDimensionChanged);
    }

    if previous.store != current.store {
        return Some(RestartReason::StoreChanged);
    }

    if vector_dimension_changed(previous, current) {
        return Some(RestartReason::VectorDimensionChanged);
    }

    None
}

pub fn requires_restart(previous: &ConfigSnapshot, current: &ConfigSnapshot) -> bool {
    restart_reason(previous, current).is_some()
}

/// Compare the table dimensions of the effective models on both sides.
///
/// Unknown dimensions on either side count as a change.
fn vector_dimension_changed(previous: &ConfigSnapshot, current: &ConfigSnapshot) -> bool {
    let prev_model = previous.effective_model_id();
    let cur_model = current.effective_model_id();

    if previous.provider == current.provider && prev_model == cur_model {
        return false;
    }

    match (
        models::model_dimension(previous.provider, &prev_model),
        models::model_dimension(current.provider, &cur_model),
    ) {
        (Some(prev), Some(cur)) => prev != cur,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{OpenAiCompatibleCredentials, ProviderCredentials, StoreEndpoint};
    use codeindex_embedders::EmbedderProvider;

    fn active_openai() -> ConfigSnapshot {
        ConfigSnapshot {
            credentials: ProviderCredentials {
                openai_api_key: "sk-one".into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn with<F: FnOnce(&mut ConfigSnapshot)>(base: &ConfigSnapshot, mutate: F) -> ConfigSnapshot {
        let mut next = base.clone();
        mutate(&mut next);
        next
    }

    #[test]
    fn test_identical_snapshots_do_not_restart() {
        let snapshot = active_openai();
        assert_eq!(restart_reason(&snapshot, &snapshot.clone()), None);

        let idle = ConfigSnapshot::default();
        assert_eq!(restart_reason(&idle, &idle.clone()), None);
    }

    #[test]
    fn test_activation_and_deactivation() {
        let idle = ConfigSnapshot::default();
        let active = active_openai();
        assert_eq!(restart_reason(&idle, &active), Some(RestartReason::Activated));

        let disabled = with(&active, |s| s.enabled = false);
        assert_eq!(restart_reason(&active, &disabled), Some(RestartReason::Deactivated));
        assert_eq!(restart_reason(&disabled, &active), Some(RestartReason::Activated));
    }

    #[test]
    fn test_never_active_does_not_restart() {
        let disabled = with(&active_openai(), |s| s.enabled = false);
        let still_disabled = with(&disabled, |s| s.credentials.openai_api_key = "sk-two".into());
        assert_eq!(restart_reason(&disabled, &still_disabled), None);

        let unconfigured = ConfigSnapshot::default();
        let other_provider = with(&unconfigured, |s| s.provider = EmbedderProvider::Gemini);
        assert_eq!(restart_reason(&unconfigured, &other_provider), None);
    }

    #[test]
    fn test_losing_configuration_while_enabled() {
        let active = active_openai();
        let unconfigured = with(&active, |s| s.credentials.openai_api_key.clear());
        assert_eq!(
            restart_reason(&active, &unconfigured),
            Some(RestartReason::CredentialsChanged)
        );
    }

    #[test]
    fn test_search_tuning_does_not_restart() {
        let active = active_openai();
        let tuned = with(&active, |s| {
            s.search_min_score = Some(0.8);
            s.search_max_results = Some(5);
        });
        assert_eq!(restart_reason(&active, &tuned), None);
    }

    #[test]
    fn test_single_field_mutations_restart() {
        let base = ConfigSnapshot {
            credentials: ProviderCredentials {
                openai_api_key: "sk".into(),
                ollama_base_url: "http://localhost:11434".into(),
                openai_compatible: Some(OpenAiCompatibleCredentials {
                    base_url: "https://api.example.com/v1".into(),
                    api_key: "compat".into(),
                }),
                gemini_api_key: "g".into(),
                mistral_api_key: "m".into(),
            },
            store: StoreEndpoint {
                url: "http://localhost:6333".into(),
                api_key: "q".into(),
            },
            ..Default::default()
        };

        let cases: Vec<(&str, ConfigSnapshot, RestartReason)> = vec![
            (
                "provider",
                with(&base, |s| s.provider = EmbedderProvider::Gemini),
                RestartReason::ProviderChanged,
            ),
            (
                "openai key",
                with(&base, |s| s.credentials.openai_api_key = "sk2".into()),
                RestartReason::CredentialsChanged,
            ),
            (
                "ollama url",
                with(&base, |s| s.credentials.ollama_base_url = "http://gpu:11434".into()),
                RestartReason::CredentialsChanged,
            ),
            (
                "compatible url",
                with(&base, |s| {
                    if let Some(c) = s.credentials.openai_compatible.as_mut() {
                        c.base_url = "https://other.example.com/v1".into();
                    }
                }),
                RestartReason::CredentialsChanged,
            ),
            (
                "compatible key",
                with(&base, |s| {
                    if let Some(c) = s.credentials.openai_compatible.as_mut() {
                        c.api_key = "compat2".into();
                    }
                }),
                RestartReason::CredentialsChanged,
            ),
            (
                "gemini key",
                with(&base, |s| s.credentials.gemini_api_key = "g2".into()),
                RestartReason::CredentialsChanged,
            ),
            (
                "mistral key",
                with(&base, |s| s.credentials.mistral_api_key = "m2".into()),
                RestartReason::CredentialsChanged,
            ),
            (
                "dimension override",
                with(&base, |s| s.model_dimension = Some(1024)),
                RestartReason::ModelDimensionChanged,
            ),
            (
                "store url",
                with(&base, |s| s.store.url = "http://qdrant:6333".into()),
                RestartReason::StoreChanged,
            ),
            (
                "store key",
                with(&base, |s| s.store.api_key = "q2".into()),
                RestartReason::StoreChanged,
            ),
            (
                "model",
                with(&base, |s| s.model_id = Some("text-embedding-3-large".into())),
                RestartReason::VectorDimensionChanged,
            ),
        ];

        for (name, next, expected) in cases {
            assert_eq!(restart_reason(&base, &next), Some(expected), "mutation: {}", name);
        }
    }

    #[test]
    fn test_model_change_with_same_dimension_does_not_restart() {
        let active = active_openai();
        let ada = with(&active, |s| s.model_id = Some("text-embedding-ada-002".into()));
        assert_eq!(restart_reason(&active, &ada), None);
    }

    #[test]
    fn test_explicit_default_model_is_not_a_change() {
        let active = active_openai();
        let explicit = with(&active, |s| s.model_id = Some("text-embedding-3-small".into()));
        assert!(!requires_restart(&active, &explicit));
    }

    #[test]
    fn test_unknown_model_restarts_conservatively() {
        let active = active_openai();
        let custom = with(&active, |s| s.model_id = Some("my-finetune".into()));
        assert_eq!(
            restart_reason(&active, &custom),
            Some(RestartReason::VectorDimensionChanged)
        );
    }
}
