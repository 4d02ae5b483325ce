//! Validate command handler.

use super::context::IndexContext;
use clap::Args;
use codeindex_core::{config::AppConfig, AppError, AppResult};
use codeindex_embedders::Embedder;

/// Check the embedder configuration against its provider
#[derive(Args, Debug)]
pub struct ValidateCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ValidateCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing validate command");

        let context = IndexContext::load(config).await?;
        let embedder = context.factory.create_embedder(context.snapshot())?;
        let info = embedder.embedder_info();
        let result = context.factory.validate_embedder(embedder.as_ref()).await;

        if self.json {
            let output = serde_json::json!({
                "provider": info.provider.as_str(),
                "modelId": info.model_id,
                "valid": result.valid,
                "error": result.error.clone(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else if result.valid {
            println!("{} embedder ({}) is ready", info.provider, info.model_id);
        }

        match result.error {
            Some(error) if !result.valid => Err(AppError::Embedder(error)),
            _ => Ok(()),
        }
    }
}
