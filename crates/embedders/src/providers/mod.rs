//! Embedder implementations.

pub mod ollama;
pub mod openai_compatible;

pub use ollama::OllamaEmbedder;
pub use openai_compatible::OpenAiCompatibleEmbedder;
