//! Status command handler.
//!
//! Prints the resolved index configuration.

use super::context::IndexContext;
use clap::Args;
use codeindex_core::{config::AppConfig, AppResult};
use codeindex_index::vector_store::collection_name_for;
use codeindex_index::ConfigManager;
use serde_json::Value;

/// Show the resolved index configuration
#[derive(Args, Debug)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

fn status_json(manager: &ConfigManager, collection: &str) -> Value {
    serde_json::json!({
        "enabled": manager.is_feature_enabled(),
        "configured": manager.is_configured(),
        "provider": manager.current_provider().as_str(),
        "modelId": manager.snapshot().effective_model_id(),
        "modelDimension": manager.current_model_dimension(),
        "searchMinScore": manager.current_search_min_score(),
        "searchMaxResults": manager.current_search_max_results(),
        "qdrantUrl": manager.qdrant_config().url,
        "collection": collection,
    })
}

impl StatusCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing status command");

        let context = IndexContext::load(config).await?;
        let manager = &context.manager;
        let snapshot = context.snapshot();
        let collection = collection_name_for(&config.workspace_root());

        if self.json {
            let output = status_json(manager, &collection);
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        println!("Code index: {}", if manager.is_feature_enabled() { "enabled" } else { "disabled" });
        println!("  Configured: {}", manager.is_configured());
        println!("  Provider: {}", manager.current_provider());
        println!("  Model: {}", snapshot.effective_model_id());
        match manager.current_model_dimension() {
            Some(dimension) => println!("  Dimension: {}", dimension),
            None => println!("  Dimension: (unknown, set codebaseIndexEmbedderModelDimension)"),
        }
        println!("  Min score: {}", manager.current_search_min_score());
        println!("  Max results: {}", manager.current_search_max_results());
        println!("  Qdrant: {}", manager.qdrant_config().url);
        println!("  Collection: {}", collection);
        Ok(())
    }
}
