//! Semantic chunking pipeline.
//!
//! Segments raw text into paragraphs, clusters their dense embeddings with a
//! density-based algorithm, and packs each topic cluster into token-bounded
//! chunks. Unclustered paragraphs go through one orphan reconciliation pass at
//! finer granularity before being emitted.

pub mod assembly;
pub mod clustering;
pub mod config;
pub mod segmenter;
pub mod service;
pub mod tokenizer;
pub mod types;

pub use clustering::{Clusterer, DensityClusterer};
pub use config::{ChunkerConfig, SegmenterConfig, SplitMode};
pub use service::{ChunkDocumentResponse, ChunkTelemetry, SemanticChunker};
pub use tokenizer::{HeuristicTokenCounter, TokenCounter};
pub use types::{
    ChunkOrigin, ChunkingError, ChunkingOutcome, ChunkingStats, ClusterLabel, Paragraph,
    SemanticChunk,
};
