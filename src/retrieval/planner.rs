//! Canonical three-stage hybrid query cascade.

use serde::{Deserialize, Serialize};

use crate::embeddings::{Embedding, Representation};
use crate::stores::{ScoredPoint, VectorStore};
use crate::types::RagError;

use super::fusion::DEFAULT_RRF_K;
use super::normalize::normalize_scores;
use super::plan::QueryPlan;

/// Stage limits and fusion constant for the hybrid cascade.
///
/// The defaults widen toward the cheap end: each first-stage search returns
/// `prefetch_limit` candidates, fusion keeps `fusion_limit`, and the final
/// rerank returns `final_limit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridQueryConfig {
    pub prefetch_limit: usize,
    pub fusion_limit: usize,
    pub final_limit: usize,
    pub rrf_k: f32,
}

impl Default for HybridQueryConfig {
    fn default() -> Self {
        Self {
            prefetch_limit: 10,
            fusion_limit: 20,
            final_limit: 3,
            rrf_k: DEFAULT_RRF_K,
        }
    }
}

impl HybridQueryConfig {
    pub fn validate(&self) -> Result<(), RagError> {
        if self.prefetch_limit == 0 || self.fusion_limit == 0 || self.final_limit == 0 {
            return Err(RagError::Config(
                "hybrid query stage limits must all be at least 1".into(),
            ));
        }
        if !self.rrf_k.is_finite() || self.rrf_k < 0.0 {
            return Err(RagError::Config(format!(
                "rrf_k must be a non-negative finite number, got {}",
                self.rrf_k
            )));
        }
        Ok(())
    }
}

/// One query's embeddings across the three representations.
#[derive(Debug, Clone)]
pub struct QueryEmbeddings {
    pub dense: Embedding,
    pub sparse: Embedding,
    pub late_interaction: Embedding,
}

/// Builds and runs the three-stage cascade:
///
/// 1. independent dense and sparse searches (broad recall),
/// 2. Reciprocal Rank Fusion of the two rankings,
/// 3. late-interaction rescoring of the fused candidates only.
///
/// Stage 3 is deliberately restricted to stage 2's output — applying the
/// token-level representation corpus-wide would defeat the cascade's cost
/// bound. Final scores are normalized after the top-N cut.
#[derive(Debug, Clone)]
pub struct HybridQueryPlanner {
    config: HybridQueryConfig,
}

impl HybridQueryPlanner {
    pub fn new(config: HybridQueryConfig) -> Result<Self, RagError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &HybridQueryConfig {
        &self.config
    }

    /// Assemble the cascade as a plan tree.
    pub fn plan(&self, query: &QueryEmbeddings) -> QueryPlan {
        QueryPlan::Rescore {
            source: Box::new(QueryPlan::Fusion {
                children: vec![
                    QueryPlan::Search {
                        representation: Representation::Dense,
                        query: query.dense.clone(),
                        limit: self.config.prefetch_limit,
                    },
                    QueryPlan::Search {
                        representation: Representation::Sparse,
                        query: query.sparse.clone(),
                        limit: self.config.prefetch_limit,
                    },
                ],
                rrf_k: self.config.rrf_k,
                limit: self.config.fusion_limit,
            }),
            representation: Representation::LateInteraction,
            query: query.late_interaction.clone(),
            limit: self.config.final_limit,
        }
    }

    /// Execute the cascade and normalize the final scores.
    pub async fn run(
        &self,
        query: &QueryEmbeddings,
        store: &dyn VectorStore,
    ) -> Result<Vec<ScoredPoint>, RagError> {
        let mut hits = self.plan(query).execute(store).await?;
        normalize_scores(&mut hits);
        Ok(hits)
    }
}

impl Default for HybridQueryPlanner {
    fn default() -> Self {
        Self {
            config: HybridQueryConfig::default(),
        }
    }
}
