//! Clear command handler.

use super::context::IndexContext;
use clap::Args;
use codeindex_core::{config::AppConfig, AppResult};
use codeindex_index::VectorStore;

/// Remove indexed points or the whole collection
#[derive(Args, Debug)]
pub struct ClearCommand {
    /// Delete the collection instead of emptying it
    #[arg(long)]
    pub drop: bool,
}

impl ClearCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing clear command (drop: {})", self.drop);

        let context = IndexContext::load(config).await?;
        let store = context.factory.create_qdrant_store(context.snapshot())?;

        if self.drop {
            store.delete_collection().await?;
            println!("Collection {} deleted", store.collection_name());
        } else {
            store.clear_collection().await?;
            println!("Collection {} cleared", store.collection_name());
        }

        Ok(())
    }
}
