//! Init command handler.
//!
//! Creates the workspace collection, or migrates it when the embedding
//! dimension changed.

use super::context::IndexContext;
use clap::Args;
use codeindex_core::{config::AppConfig, AppError, AppResult};
use codeindex_index::VectorStore;

/// Create or migrate the workspace collection
#[derive(Args, Debug)]
pub struct InitCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl InitCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing init command");

        let context = IndexContext::load(config).await?;
        if !context.manager.is_feature_enabled() {
            return Err(AppError::Config(
                "Code indexing is disabled (codebaseIndexEnabled: false)".to_string(),
            ));
        }

        let store = context.factory.create_qdrant_store(context.snapshot())?;
        let created = store.initialize().await?;

        if self.json {
            let output = serde_json::json!({
                "collection": store.collection_name(),
                "vectorSize": store.vector_size(),
                "qdrantUrl": store.connection().base_url(),
                "created": created,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else if created {
            println!(
                "Created collection {} (vector size {})",
                store.collection_name(),
                store.vector_size()
            );
        } else {
            println!("Collection {} is up to date", store.collection_name());
        }

        Ok(())
    }
}
