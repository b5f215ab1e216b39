//! Data types shared across the chunking pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::embeddings::Representation;

/// An ordered, immutable text span produced by the segmenter.
///
/// `index` is the paragraph's position among the kept paragraphs in original
/// document order and is stable for the lifetime of one chunking invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    pub index: usize,
    pub text: String,
}

impl Paragraph {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }
}

/// Label assigned to a paragraph by one clustering invocation.
///
/// Cluster identities are arbitrary but stable within a single invocation;
/// they carry no meaning across runs or across the orphan re-clustering pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClusterLabel {
    /// The paragraph could not be assigned to any cluster.
    Noise,
    /// Member of the identified cluster.
    Cluster(u32),
}

impl ClusterLabel {
    pub fn is_noise(&self) -> bool {
        matches!(self, ClusterLabel::Noise)
    }
}

/// Which pass produced a chunk. Recorded for traceability only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkOrigin {
    /// Cluster found by the primary clustering pass.
    Primary(u32),
    /// Cluster found by the orphan reconciliation pass.
    OrphanCluster(u32),
    /// Paragraph that stayed unclustered through both passes.
    OrphanSingleton,
}

/// A token-bounded unit of document text, the atomic item stored and
/// retrieved downstream.
///
/// `token_count` may exceed the configured budget only when the chunk holds a
/// single paragraph: the budget bounds aggregation and never splits a
/// paragraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticChunk {
    pub text: String,
    pub token_count: usize,
    /// Source paragraph indices, in original document order.
    pub paragraph_indices: Vec<usize>,
    pub origin: ChunkOrigin,
}

/// Result of chunking one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkingOutcome {
    pub chunks: Vec<SemanticChunk>,
    pub stats: ChunkingStats,
}

/// Counters describing one chunking invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkingStats {
    /// Paragraphs that survived the segmenter filter.
    pub paragraphs: usize,
    /// Clusters found by the primary pass.
    pub clusters: usize,
    /// Paragraphs the primary pass left unclustered.
    pub orphans: usize,
    /// Clusters recovered by the orphan reconciliation pass.
    pub orphan_clusters: usize,
    /// Chunks emitted as single unclustered paragraphs.
    pub singleton_chunks: usize,
    pub total_chunks: usize,
    pub average_tokens: f64,
}

/// Errors raised by the chunking pipeline.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// A configuration value makes coherent chunking impossible.
    #[error("invalid chunking configuration: {0}")]
    InvalidConfig(String),

    /// The embedding provider returned the wrong number of vectors.
    #[error("embedding provider returned {got} embeddings for {expected} paragraphs")]
    EmbeddingCountMismatch { expected: usize, got: usize },

    /// The embedding provider returned the wrong representation.
    #[error("expected {expected} embeddings, provider returned {got}")]
    RepresentationMismatch {
        expected: Representation,
        got: Representation,
    },

    /// The clustering engine rejected its input.
    #[error("clustering failed: {0}")]
    Clustering(String),

    /// The tokenizer could not be constructed.
    #[error("tokenizer error: {0}")]
    Tokenizer(String),
}
