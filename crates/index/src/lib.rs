//! Code index configuration and vector storage.
//!
//! Two halves:
//! - **Configuration**: [`ConfigManager`] turns persisted settings and secrets
//!   into a [`ConfigSnapshot`] and decides whether a reload must restart the
//!   indexing service ([`restart`]).
//! - **Storage**: [`QdrantVectorStore`] owns one Qdrant collection per
//!   workspace, migrating it when the embedding dimension changes.
//!
//! [`ServiceFactory`] wires the two together.

pub mod config_manager;
pub mod constants;
pub mod restart;
pub mod service_factory;
pub mod settings;
pub mod snapshot;
pub mod vector_store;

pub use config_manager::{ConfigManager, LoadOutcome};
pub use restart::{requires_restart, restart_reason, RestartReason};
pub use service_factory::ServiceFactory;
pub use settings::{ConfigSource, FileConfigSource, InMemoryConfigSource, IndexSettings};
pub use snapshot::{ConfigSnapshot, ProviderCredentials, StoreEndpoint};
pub use vector_store::{
    CodeChunkPayload, CollectionLookup, QdrantVectorStore, VectorStore, VectorStoreSearchResult,
};
