//! Error types for codeindex.
//!
//! `AppError` is the unified error surfaced to callers. `StoreError` describes
//! a single failed call against the vector database and is kept separate so
//! that migration failures can carry it as their originating cause.

use thiserror::Error;

/// Unified error type for codeindex.
///
/// All fallible operations return `Result<T, AppError>`.
/// We never panic: errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or invalid configuration (credentials, URLs, settings files)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Neither the model table nor a user override yields a vector dimension
    #[error(
        "Could not determine vector dimension for model '{model}' with provider '{provider}'. \
         Check the model ID or set a custom model dimension."
    )]
    DimensionUndetermined { provider: String, model: String },

    /// Collection recreation after a dimension change failed partway
    #[error(
        "Failed to update vector index for new model. Please try clearing the index and \
         starting again. Details: {details}"
    )]
    DimensionMismatch {
        details: String,
        #[source]
        source: Option<StoreError>,
    },

    /// Collection setup failed outside of a migration
    #[error(
        "Failed to connect to Qdrant vector database. Please ensure Qdrant is running and \
         accessible at {url}. Error: {source}"
    )]
    StoreConnection {
        url: String,
        #[source]
        source: StoreError,
    },

    /// Vector store call failed (re-thrown verbatim)
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Embedding provider errors
    #[error("Embedder error: {0}")]
    Embedder(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// A failed request against the vector store.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The addressed collection does not exist (HTTP 404)
    #[error("Not found")]
    NotFound,

    /// The store answered with a non-success status
    #[error("Qdrant responded with status {status}: {message}")]
    Status { status: u16, message: String },

    /// The request never produced a response
    #[error("Request to Qdrant failed: {0}")]
    Transport(String),

    /// The response body could not be decoded
    #[error("Failed to decode Qdrant response: {0}")]
    Decode(String),

    /// A post-condition check against the store failed
    #[error("{0}")]
    Verification(String),
}

impl StoreError {
    /// Whether this error means the collection is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::NotFound | StoreError::Status { status: 404, .. }
        )
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
