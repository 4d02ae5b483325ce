//! Embedding providers for codeindex.
//!
//! This crate provides a provider-agnostic abstraction over the services that
//! turn code chunks into vectors. Indexing code only ever sees the
//! [`Embedder`] capability; which HTTP API sits behind it is decided by
//! [`EmbedderSettings`], a tagged union with one variant per provider.
//!
//! # Providers
//! - **OpenAI** and **OpenAI-compatible** endpoints
//! - **Gemini** and **Mistral** through their OpenAI-compatible APIs
//! - **Ollama**: local embedding runtime
//!
//! # Example
//! ```no_run
//! use codeindex_embedders::{create_embedder, EmbedderSettings, HttpOptions};
//!
//! # async fn example() -> codeindex_core::AppResult<()> {
//! let settings = EmbedderSettings::Ollama {
//!     base_url: "http://localhost:11434".to_string(),
//!     model_id: None,
//! };
//! let embedder = create_embedder(&settings, &HttpOptions::default())?;
//! let vector = embedder.embed("fn main() {}").await?;
//! println!("{} dimensions", vector.len());
//! # Ok(())
//! # }
//! ```

pub mod embedder;
pub mod factory;
pub mod http;
pub mod models;
pub mod providers;
pub mod types;

// Re-export main types
pub use embedder::Embedder;
pub use factory::{create_embedder, EmbedderSettings};
pub use http::HttpOptions;
pub use providers::{OllamaEmbedder, OpenAiCompatibleEmbedder};
pub use types::{EmbedderInfo, EmbedderProvider, EmbeddingResponse, EmbeddingUsage, ValidationResult};
