//! Vector store boundary.
//!
//! The index itself is an external collaborator: this module defines the
//! [`VectorStore`] trait the retrieval planner executes against, plus an
//! in-memory reference implementation used by tests and local pipelines.
//! Approximate-nearest-neighbor internals are out of scope; implementations
//! are assumed to be exact about ids and to perform no implicit
//! deduplication.

pub mod memory;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::embeddings::{Embedding, Representation};
use crate::types::RagError;

pub use memory::MemoryVectorStore;

/// A chunk ready for persistence: id, per-representation vectors, payload.
///
/// The payload carries at minimum the chunk text and source document
/// metadata; its schema is owned by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkPoint {
    pub id: String,
    pub vectors: HashMap<Representation, Embedding>,
    pub payload: serde_json::Value,
}

impl ChunkPoint {
    pub fn new(id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            vectors: HashMap::new(),
            payload,
        }
    }

    #[must_use]
    pub fn with_vector(mut self, embedding: Embedding) -> Self {
        self.vectors.insert(embedding.representation(), embedding);
        self
    }
}

/// One ranked search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPoint {
    pub id: String,
    pub score: f32,
}

impl ScoredPoint {
    pub fn new(id: impl Into<String>, score: f32) -> Self {
        Self {
            id: id.into(),
            score,
        }
    }
}

/// External vector index boundary.
///
/// `search` ranks the whole collection in one representation; `rescore`
/// scores only the given candidate ids, which is what keeps the expensive
/// late-interaction stage bounded to the fused candidate set. All failures
/// propagate to the caller unmodified.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace points by id.
    async fn upsert(&self, points: Vec<ChunkPoint>) -> Result<(), RagError>;

    /// Top-`limit` points by similarity to `query` in `representation`,
    /// best first.
    async fn search(
        &self,
        representation: Representation,
        query: &Embedding,
        limit: usize,
    ) -> Result<Vec<ScoredPoint>, RagError>;

    /// Score only `candidates` against `query` in `representation`.
    ///
    /// Ids unknown to the store are silently skipped; the result is not
    /// ordered.
    async fn rescore(
        &self,
        representation: Representation,
        query: &Embedding,
        candidates: &[String],
    ) -> Result<Vec<ScoredPoint>, RagError>;

    /// Payload stored for `id`, if present.
    async fn payload(&self, id: &str) -> Result<Option<serde_json::Value>, RagError>;

    /// Number of stored points.
    async fn count(&self) -> Result<usize, RagError>;
}
