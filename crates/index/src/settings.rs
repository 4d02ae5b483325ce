//! Persisted indexing settings and the source they are read from.
//!
//! A [`ConfigSource`] exposes two stores: non-secret global state (one JSON
//! object per key) and secrets (string values). The indexing settings live
//! under the [`CODEBASE_INDEX_CONFIG_KEY`] global-state key.

use codeindex_core::{AppError, AppResult};
use serde::de::{Deserialize, DeserializeOwned};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Global-state key holding [`IndexSettings`].
pub const CODEBASE_INDEX_CONFIG_KEY: &str = "codebaseIndexConfig";

/// Secret keys read by the configuration snapshot.
pub mod secret_keys {
    pub const OPENAI_API_KEY: &str = "codeIndexOpenAiKey";
    pub const QDRANT_API_KEY: &str = "codeIndexQdrantApiKey";
    pub const OPENAI_COMPATIBLE_API_KEY: &str = "codebaseIndexOpenAiCompatibleApiKey";
    pub const GEMINI_API_KEY: &str = "codebaseIndexGeminiApiKey";
    pub const MISTRAL_API_KEY: &str = "codebaseIndexMistralApiKey";
}

/// Environment variables that take precedence over the secrets file.
const SECRET_ENV_OVERRIDES: [(&str, &str); 5] = [
    (secret_keys::OPENAI_API_KEY, "OPENAI_API_KEY"),
    (secret_keys::OPENAI_COMPATIBLE_API_KEY, "OPENAI_COMPATIBLE_API_KEY"),
    (secret_keys::GEMINI_API_KEY, "GEMINI_API_KEY"),
    (secret_keys::MISTRAL_API_KEY, "MISTRAL_API_KEY"),
    (secret_keys::QDRANT_API_KEY, "QDRANT_API_KEY"),
];

/// Where indexing configuration comes from.
#[async_trait::async_trait]
pub trait ConfigSource: Send + Sync {
    /// Read a global-state object. `None` when the key was never written.
    fn global_state(&self, key: &str) -> Option<Value>;

    /// Read a cached secret.
    fn secret(&self, key: &str) -> Option<String>;

    /// Reload secrets from their backing store.
    async fn refresh_secrets(&self) -> AppResult<()>;
}

/// The persisted `codebaseIndexConfig` object.
///
/// Every field is optional; absent values are defaulted when the snapshot is
/// built. The model dimension is kept as raw JSON because hosts have written
/// it both as a number and as a string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexSettings {
    pub codebase_index_enabled: Option<bool>,
    pub codebase_index_qdrant_url: Option<String>,
    pub codebase_index_embedder_provider: Option<String>,
    pub codebase_index_embedder_base_url: Option<String>,
    pub codebase_index_embedder_model_id: Option<String>,
    pub codebase_index_embedder_model_dimension: Option<Value>,
    pub codebase_index_open_ai_compatible_base_url: Option<String>,
    pub codebase_index_search_min_score: Option<f32>,
    pub codebase_index_search_max_results: Option<usize>,
}

/// Deserialize one settings field. A value of the wrong type is logged and
/// dropped without affecting its siblings.
fn field<T: DeserializeOwned>(settings: &Map<String, Value>, key: &str) -> Option<T> {
    let value = settings.get(key).filter(|v| !v.is_null())?;
    match T::deserialize(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!("Ignoring invalid {} value {}: {}", key, value, e);
            None
        }
    }
}

impl IndexSettings {
    /// Read the settings object from `source`.
    ///
    /// A missing key yields defaults. Fields are read independently, so one
    /// bad value never resets the rest of the configuration.
    pub fn read(source: &dyn ConfigSource) -> Self {
        let settings = match source.global_state(CODEBASE_INDEX_CONFIG_KEY) {
            None | Some(Value::Null) => return Self::default(),
            Some(Value::Object(map)) => map,
            Some(other) => {
                tracing::warn!(
                    "Ignoring malformed {} settings: expected an object, got {}",
                    CODEBASE_INDEX_CONFIG_KEY,
                    other
                );
                return Self::default();
            }
        };

        Self {
            codebase_index_enabled: field(&settings, "codebaseIndexEnabled"),
            codebase_index_qdrant_url: field(&settings, "codebaseIndexQdrantUrl"),
            codebase_index_embedder_provider: field(&settings, "codebaseIndexEmbedderProvider"),
            codebase_index_embedder_base_url: field(&settings, "codebaseIndexEmbedderBaseUrl"),
            codebase_index_embedder_model_id: field(&settings, "codebaseIndexEmbedderModelId"),
            codebase_index_embedder_model_dimension: field(
                &settings,
                "codebaseIndexEmbedderModelDimension",
            ),
            codebase_index_open_ai_compatible_base_url: field(
                &settings,
                "codebaseIndexOpenAiCompatibleBaseUrl",
            ),
            codebase_index_search_min_score: field(&settings, "codebaseIndexSearchMinScore"),
            codebase_index_search_max_results: field(&settings, "codebaseIndexSearchMaxResults"),
        }
    }
}

/// Configuration source backed by YAML files in the workspace.
///
/// Global state is re-read from the settings file on every call. Secrets are
/// cached and only reloaded by [`ConfigSource::refresh_secrets`].
#[derive(Debug)]
pub struct FileConfigSource {
    settings_path: PathBuf,
    secrets_path: PathBuf,
    secrets: RwLock<HashMap<String, String>>,
    use_env: bool,
}

impl FileConfigSource {
    /// Create a source and load the secrets file once.
    pub fn new(settings_path: impl Into<PathBuf>, secrets_path: impl Into<PathBuf>) -> AppResult<Self> {
        let source = Self {
            settings_path: settings_path.into(),
            secrets_path: secrets_path.into(),
            secrets: RwLock::new(HashMap::new()),
            use_env: true,
        };
        source.reload_secrets()?;
        Ok(source)
    }

    /// Ignore secret environment overrides.
    pub fn without_env(mut self) -> Self {
        self.use_env = false;
        self
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    fn read_settings_document(&self) -> Option<Value> {
        let content = match fs::read_to_string(&self.settings_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Failed to read settings at {:?}: {}", self.settings_path, e);
                return None;
            }
        };

        match serde_yaml::from_str::<Value>(&content) {
            Ok(document) => Some(document),
            Err(e) => {
                tracing::warn!("Failed to parse settings at {:?}: {}", self.settings_path, e);
                None
            }
        }
    }

    fn reload_secrets(&self) -> AppResult<()> {
        let loaded: HashMap<String, String> = match fs::read_to_string(&self.secrets_path) {
            Ok(content) if content.trim().is_empty() => HashMap::new(),
            Ok(content) => serde_yaml::from_str(&content).map_err(|e| {
                AppError::Config(format!(
                    "Failed to parse secrets at {:?}: {}",
                    self.secrets_path, e
                ))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(AppError::Io(e)),
        };

        tracing::debug!("Loaded {} secrets from {:?}", loaded.len(), self.secrets_path);
        let mut secrets = self
            .secrets
            .write()
            .map_err(|_| AppError::Other("Secrets cache lock poisoned".to_string()))?;
        *secrets = loaded;
        Ok(())
    }

    fn env_override(&self, key: &str) -> Option<String> {
        if !self.use_env {
            return None;
        }
        SECRET_ENV_OVERRIDES
            .iter()
            .find(|(secret, _)| *secret == key)
            .and_then(|(_, var)| std::env::var(var).ok())
            .filter(|value| !value.trim().is_empty())
    }
}

#[async_trait::async_trait]
impl ConfigSource for FileConfigSource {
    fn global_state(&self, key: &str) -> Option<Value> {
        self.read_settings_document()?.get(key).cloned()
    }

    fn secret(&self, key: &str) -> Option<String> {
        if let Some(value) = self.env_override(key) {
            return Some(value);
        }
        self.secrets
            .read()
            .ok()
            .and_then(|secrets| secrets.get(key).cloned())
    }

    async fn refresh_secrets(&self) -> AppResult<()> {
        self.reload_secrets()
    }
}

/// In-memory configuration source for embedding hosts and tests.
#[derive(Debug, Default)]
pub struct InMemoryConfigSource {
    state: RwLock<HashMap<String, Value>>,
    secrets: RwLock<HashMap<String, String>>,
    refreshes: RwLock<usize>,
}

impl InMemoryConfigSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_global_state(&self, key: &str, value: Value) {
        if let Ok(mut state) = self.state.write() {
            state.insert(key.to_string(), value);
        }
    }

    /// Replace the whole `codebaseIndexConfig` object.
    pub fn set_index_settings(&self, value: Value) {
        self.set_global_state(CODEBASE_INDEX_CONFIG_KEY, value);
    }

    pub fn set_secret(&self, key: &str, value: &str) {
        if let Ok(mut secrets) = self.secrets.write() {
            secrets.insert(key.to_string(), value.to_string());
        }
    }

    pub fn remove_secret(&self, key: &str) {
        if let Ok(mut secrets) = self.secrets.write() {
            secrets.remove(key);
        }
    }

    /// How many times secrets were refreshed.
    pub fn refresh_count(&self) -> usize {
        self.refreshes.read().map(|n| *n).unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl ConfigSource for InMemoryConfigSource {
    fn global_state(&self, key: &str) -> Option<Value> {
        self.state.read().ok().and_then(|s| s.get(key).cloned())
    }

    fn secret(&self, key: &str) -> Option<String> {
        self.secrets.read().ok().and_then(|s| s.get(key).cloned())
    }

    async fn refresh_secrets(&self) -> AppResult<()> {
        if let Ok(mut n) = self.refreshes.write() {
            *n += 1;
        }
        Ok(())
    }
}
