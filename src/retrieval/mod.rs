//! Hybrid multi-stage retrieval.
//!
//! A query is executed as a cascade: broad, cheap first-stage searches per
//! representation, Reciprocal Rank Fusion over their ranked lists, then a
//! precision rerank of the fused candidate set with the late-interaction
//! representation. The cascade is modeled as a small recursive plan tree
//! ([`plan::QueryPlan`]) so deeper nestings need no special-casing.

pub mod fusion;
pub mod normalize;
pub mod plan;
pub mod planner;
pub mod retriever;

pub use fusion::{DEFAULT_RRF_K, rrf_fuse};
pub use normalize::normalize_scores;
pub use plan::QueryPlan;
pub use planner::{HybridQueryConfig, HybridQueryPlanner, QueryEmbeddings};
pub use retriever::{HybridRetriever, RetrievedChunk};
