//! Configuration manager for the indexing service.
//!
//! Holds the current [`ConfigSnapshot`] and, on each load, rebuilds it from
//! the [`ConfigSource`] and reports whether the transition needs a restart.

use crate::restart::{restart_reason, RestartReason};
use crate::settings::ConfigSource;
use crate::snapshot::{ConfigSnapshot, StoreEndpoint};
use codeindex_core::AppResult;
use codeindex_embedders::EmbedderProvider;
use std::sync::Arc;

/// Result of [`ConfigManager::load`].
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    /// Snapshot in effect before this load.
    pub previous: ConfigSnapshot,
    /// Snapshot built by this load.
    pub current: ConfigSnapshot,
    pub requires_restart: bool,
    pub reason: Option<RestartReason>,
}

pub struct ConfigManager {
    source: Arc<dyn ConfigSource>,
    snapshot: ConfigSnapshot,
}

impl std::fmt::Debug for ConfigManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigManager")
            .field("snapshot", &self.snapshot)
            .finish_non_exhaustive()
    }
}

impl ConfigManager {
    /// Create a manager primed with the source's current contents, so the
    /// first [`load`](Self::load) only reports real changes.
    pub fn new(source: Arc<dyn ConfigSource>) -> Self {
        let snapshot = ConfigSnapshot::from_source(source.as_ref());
        Self { source, snapshot }
    }

    pub fn source(&self) -> &Arc<dyn ConfigSource> {
        &self.source
    }

    /// Refresh secrets, rebuild the snapshot and diff it against the old one.
    pub async fn load(&mut self) -> AppResult<LoadOutcome> {
        self.source.refresh_secrets().await?;

        let current = ConfigSnapshot::from_source(self.source.as_ref());
        let previous = std::mem::replace(&mut self.snapshot, current.clone());
        let reason = restart_reason(&previous, &current);

        match reason {
            Some(reason) => tracing::info!("Configuration change requires restart: {}", reason),
            None => tracing::debug!("Configuration reloaded, no restart required"),
        }

        Ok(LoadOutcome {
            previous,
            current,
            requires_restart: reason.is_some(),
            reason,
        })
    }

    pub fn snapshot(&self) -> &ConfigSnapshot {
        &self.snapshot
    }

    /// Whether moving from `previous` to the current snapshot needs a restart.
    pub fn does_config_change_require_restart(&self, previous: &ConfigSnapshot) -> bool {
        restart_reason(previous, &self.snapshot).is_some()
    }

    pub fn is_configured(&self) -> bool {
        self.snapshot.is_configured()
    }

    pub fn is_feature_enabled(&self) -> bool {
        self.snapshot.enabled
    }

    pub fn current_provider(&self) -> EmbedderProvider {
        self.snapshot.provider
    }

    pub fn current_model_id(&self) -> Option<&str> {
        self.snapshot.model_id.as_deref()
    }

    pub fn current_model_dimension(&self) -> Option<u32> {
        self.snapshot.current_model_dimension()
    }

    pub fn current_search_min_score(&self) -> f32 {
        self.snapshot.current_search_min_score()
    }

    pub fn current_search_max_results(&self) -> usize {
        self.snapshot.current_search_max_results()
    }

    pub fn qdrant_config(&self) -> &StoreEndpoint {
        &self.snapshot.store
    }
}
