//! Fixed values shared by the configuration and vector store layers.

/// Qdrant endpoint used when the settings never named one.
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6333";

/// Host and port used when the configured endpoint is blank.
pub const DEFAULT_QDRANT_HOST: &str = "localhost";
pub const DEFAULT_QDRANT_PORT: u16 = 6333;

/// Prefix of every workspace collection name.
pub const COLLECTION_PREFIX: &str = "ws-";

/// Hex characters of the workspace hash kept in the collection name.
pub const COLLECTION_HASH_LEN: usize = 16;

/// HNSW search breadth used for every query.
pub const SEARCH_HNSW_EF: u64 = 128;

/// Number of leading path segments that get a keyword payload index.
pub const PATH_SEGMENT_INDEX_DEPTH: usize = 5;

/// Payload field names written by the indexer.
pub mod payload {
    pub const FILE_PATH: &str = "filePath";
    pub const CODE_CHUNK: &str = "codeChunk";
    pub const START_LINE: &str = "startLine";
    pub const END_LINE: &str = "endLine";
    pub const PATH_SEGMENTS: &str = "pathSegments";

    /// Fields requested back from search.
    pub const SEARCH_FIELDS: [&str; 5] = [FILE_PATH, CODE_CHUNK, START_LINE, END_LINE, PATH_SEGMENTS];
}
