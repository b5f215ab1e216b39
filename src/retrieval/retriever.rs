//! Query-side glue: embed, run the cascade, attach payloads.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::embeddings::{EmbeddingProvider, Representation};
use crate::stores::VectorStore;
use crate::types::RagError;

use super::planner::{HybridQueryPlanner, QueryEmbeddings};

/// A final ranked hit with its stored payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub id: String,
    /// Normalized stage-3 score in `[0, 1]`.
    pub score: f32,
    pub payload: serde_json::Value,
}

/// Ties an embedding provider, a vector store, and the hybrid planner into
/// one text-in, ranked-chunks-out call.
pub struct HybridRetriever {
    provider: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    planner: HybridQueryPlanner,
}

impl HybridRetriever {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        planner: HybridQueryPlanner,
    ) -> Self {
        Self {
            provider,
            store,
            planner,
        }
    }

    /// Embed `query` in all three representations and run the cascade.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedChunk>, RagError> {
        let texts = vec![query.to_string()];
        let embeddings = self.embed_query(&texts).await?;

        let hits = self.planner.run(&embeddings, self.store.as_ref()).await?;

        let mut results = Vec::with_capacity(hits.len());
        for hit in hits {
            let payload = self
                .store
                .payload(&hit.id)
                .await?
                .unwrap_or(serde_json::Value::Null);
            results.push(RetrievedChunk {
                id: hit.id,
                score: hit.score,
                payload,
            });
        }

        info!(query_len = query.len(), results = results.len(), "retrieved chunks");
        Ok(results)
    }

    async fn embed_query(&self, texts: &[String]) -> Result<QueryEmbeddings, RagError> {
        let single = |mut batch: Vec<crate::embeddings::Embedding>, representation| {
            if batch.len() != 1 {
                return Err(RagError::Embedding(format!(
                    "expected one {representation} query embedding, got {}",
                    batch.len()
                )));
            }
            Ok(batch.remove(0))
        };

        let dense = single(
            self.provider.embed(texts, Representation::Dense).await?,
            Representation::Dense,
        )?;
        let sparse = single(
            self.provider.embed(texts, Representation::Sparse).await?,
            Representation::Sparse,
        )?;
        let late_interaction = single(
            self.provider
                .embed(texts, Representation::LateInteraction)
                .await?,
            Representation::LateInteraction,
        )?;

        Ok(QueryEmbeddings {
            dense,
            sparse,
            late_interaction,
        })
    }
}
