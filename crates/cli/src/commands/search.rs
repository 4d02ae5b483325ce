//! Search command handler.

use super::context::IndexContext;
use clap::Args;
use codeindex_core::{config::AppConfig, AppResult};
use codeindex_embedders::models::model_query_prefix;
use codeindex_embedders::Embedder;
use codeindex_index::{ConfigSnapshot, VectorStore};

/// Semantic search over the indexed code
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// Query text
    pub query: String,

    /// Only return files under this directory
    #[arg(long)]
    pub path_prefix: Option<String>,

    /// Minimum similarity score (default: configured or model threshold)
    #[arg(long)]
    pub min_score: Option<f32>,

    /// Maximum number of results (default: configured or 50)
    #[arg(long)]
    pub max_results: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Some models are trained with an instruction prefix on queries.
fn query_text(snapshot: &ConfigSnapshot, query: &str) -> String {
    match model_query_prefix(snapshot.provider, &snapshot.effective_model_id()) {
        Some(prefix) if !query.starts_with(prefix) => format!("{}{}", prefix, query),
        _ => query.to_string(),
    }
}

impl SearchCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing search command");

        let context = IndexContext::load(config).await?;
        let snapshot = context.snapshot();

        let embedder = context.factory.create_embedder(snapshot)?;
        let store = context.factory.create_vector_store(snapshot)?;

        let vector = embedder.embed(&query_text(snapshot, &self.query)).await?;
        let min_score = self
            .min_score
            .unwrap_or_else(|| snapshot.current_search_min_score());
        let max_results = self
            .max_results
            .unwrap_or_else(|| snapshot.current_search_max_results());

        let results = store
            .search(
                &vector,
                self.path_prefix.as_deref(),
                Some(min_score),
                Some(max_results),
            )
            .await?;
        tracing::debug!("Search returned {} results", results.len());

        if self.json {
            println!("{}", serde_json::to_string_pretty(&results)?);
            return Ok(());
        }

        if results.is_empty() {
            println!("No results above score {}", min_score);
            return Ok(());
        }

        for result in &results {
            let payload = &result.payload;
            println!(
                "{:.3}  {}:{}-{}",
                result.score, payload.file_path, payload.start_line, payload.end_line
            );
        }

        Ok(())
    }
}
