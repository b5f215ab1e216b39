//! Crate-wide error type.

use thiserror::Error;

use crate::semantic_chunking::types::ChunkingError;

/// Top-level error for chunking, embedding, and retrieval operations.
///
/// Dependency failures (embedding provider, vector store) are propagated to
/// the caller as-is; the crate performs no retries and never substitutes
/// default values for a failed call.
#[derive(Debug, Error)]
pub enum RagError {
    /// The chunking pipeline failed.
    #[error(transparent)]
    Chunking(#[from] ChunkingError),

    /// The embedding provider returned an error or malformed response.
    #[error("embedding provider error: {0}")]
    Embedding(String),

    /// The vector store rejected or failed an operation.
    #[error("vector store error: {0}")]
    Storage(String),

    /// A configuration value was rejected at construction time.
    #[error("invalid configuration: {0}")]
    Config(String),
}
