//! Semantic chunking and hybrid multi-vector retrieval for RAG pipelines.
//!
//! ```text
//! Document text ──► semantic_chunking::segmenter ──► paragraphs
//!                                     │
//!                  embeddings (dense) ▼
//!                  semantic_chunking::clustering ──► topic clusters + orphans
//!                                     │
//!                  semantic_chunking::assembly ──► token-bounded chunks
//!                                     │
//!                  ingestion::IngestionPipeline ──► stores::VectorStore
//!
//! Query text ──► embeddings (dense / sparse / late-interaction)
//!                                     │
//!                  retrieval::HybridQueryPlanner ──► stage 1: dense + sparse
//!                                     │              stage 2: RRF fusion
//!                                     │              stage 3: MaxSim rescore
//!                  retrieval::normalize ──► ranked, normalized hits
//! ```
//!
//! The chunking half segments raw text into paragraphs, clusters their dense
//! embeddings with a density-based algorithm, and greedily packs each cluster
//! into chunks under a token budget. Paragraphs the primary pass leaves
//! unclustered go through one reconciliation pass at finer granularity.
//!
//! The retrieval half issues independent dense and sparse searches, fuses the
//! ranked lists with Reciprocal Rank Fusion, and rescores only the fused
//! candidate set with the late-interaction representation before normalizing
//! scores for presentation.
//!
//! Embedding inference, the vector index, and tokenization are external
//! collaborators behind the [`embeddings::EmbeddingProvider`],
//! [`stores::VectorStore`], and [`semantic_chunking::tokenizer::TokenCounter`]
//! traits; the crate ships deterministic in-memory implementations of each for
//! tests and local pipelines.

pub mod embeddings;
pub mod ingestion;
pub mod retrieval;
pub mod semantic_chunking;
pub mod stores;
pub mod types;

pub use embeddings::{Embedding, EmbeddingProvider, Representation};
pub use retrieval::planner::{HybridQueryConfig, HybridQueryPlanner};
pub use semantic_chunking::config::ChunkerConfig;
pub use semantic_chunking::service::SemanticChunker;
pub use stores::{ChunkPoint, ScoredPoint, VectorStore};
pub use types::RagError;
