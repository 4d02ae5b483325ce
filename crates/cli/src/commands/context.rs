//! Shared setup for commands that touch the index.

use codeindex_core::proxy::resolve_proxy_url;
use codeindex_core::{config::AppConfig, AppResult};
use codeindex_embedders::HttpOptions;
use codeindex_index::{ConfigManager, ConfigSnapshot, FileConfigSource, ServiceFactory};
use std::sync::Arc;

/// Loaded configuration plus a factory for the services it describes.
#[derive(Debug)]
pub struct IndexContext {
    pub manager: ConfigManager,
    pub factory: ServiceFactory,
}

impl IndexContext {
    pub async fn load(config: &AppConfig) -> AppResult<Self> {
        let source = FileConfigSource::new(config.settings_path(), config.secrets_path())?;
        let mut manager = ConfigManager::new(Arc::new(source));
        manager.load().await?;

        let http = HttpOptions::default().with_proxy(resolve_proxy_url(config.proxy_url.as_deref()));
        let factory = ServiceFactory::new(config.workspace_root(), http);

        Ok(Self { manager, factory })
    }

    pub fn snapshot(&self) -> &ConfigSnapshot {
        self.manager.snapshot()
    }
}
