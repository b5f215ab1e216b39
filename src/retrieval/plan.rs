//! Recursive query-plan tree.

use std::future::Future;
use std::pin::Pin;

use crate::embeddings::{Embedding, Representation};
use crate::stores::{ScoredPoint, VectorStore};
use crate::types::RagError;

use super::fusion::rrf_fuse;

/// One node of a retrieval cascade.
///
/// Leaves are single-representation searches; internal nodes fuse or rescore
/// their children. The tree shape makes the cascade boundary explicit: a
/// [`QueryPlan::Rescore`] node only ever scores the candidate ids its source
/// produced, so expensive representations stay bounded to the fused set
/// rather than the full corpus.
#[derive(Debug, Clone)]
pub enum QueryPlan {
    /// Similarity search over the whole collection in one representation.
    Search {
        representation: Representation,
        query: Embedding,
        limit: usize,
    },
    /// Reciprocal-rank fusion of the children's rankings.
    Fusion {
        children: Vec<QueryPlan>,
        rrf_k: f32,
        limit: usize,
    },
    /// Re-rank the source's candidates with a higher-fidelity representation.
    Rescore {
        source: Box<QueryPlan>,
        representation: Representation,
        query: Embedding,
        limit: usize,
    },
}

impl QueryPlan {
    /// Execute the plan against a vector store.
    ///
    /// Empty intermediate candidate sets short-circuit to an empty result;
    /// store failures propagate unmodified.
    pub fn execute<'a>(
        &'a self,
        store: &'a dyn VectorStore,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<ScoredPoint>, RagError>> + Send + 'a>> {
        Box::pin(async move {
            match self {
                QueryPlan::Search {
                    representation,
                    query,
                    limit,
                } => {
                    let hits = store.search(*representation, query, *limit).await?;
                    tracing::debug!(%representation, limit, hits = hits.len(), "leaf search");
                    Ok(hits)
                }
                QueryPlan::Fusion {
                    children,
                    rrf_k,
                    limit,
                } => {
                    let mut lists = Vec::with_capacity(children.len());
                    for child in children {
                        lists.push(child.execute(store).await?);
                    }
                    Ok(rrf_fuse(&lists, *rrf_k, *limit))
                }
                QueryPlan::Rescore {
                    source,
                    representation,
                    query,
                    limit,
                } => {
                    let candidates = source.execute(store).await?;
                    if candidates.is_empty() {
                        return Ok(Vec::new());
                    }
                    let ids: Vec<String> =
                        candidates.iter().map(|point| point.id.clone()).collect();
                    let mut rescored = store.rescore(*representation, query, &ids).await?;
                    rescored.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.id.cmp(&b.id)));
                    rescored.truncate(*limit);
                    tracing::debug!(
                        %representation,
                        candidates = ids.len(),
                        kept = rescored.len(),
                        "rescored fused candidates"
                    );
                    Ok(rescored)
                }
            }
        })
    }
}
