//! Ingestion glue: chunk documents and persist them with all representations.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::embeddings::{EmbeddingProvider, Representation};
use crate::semantic_chunking::service::{ChunkTelemetry, SemanticChunker};
use crate::semantic_chunking::types::SemanticChunk;
use crate::stores::{ChunkPoint, VectorStore};
use crate::types::RagError;

/// Summary of one indexed document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexOutcome {
    pub document: String,
    pub chunk_count: usize,
    pub telemetry: ChunkTelemetry,
}

/// Payload persisted alongside a chunk's vectors.
///
/// Carries the chunk text, its source document id, its position within the
/// document, and caller-supplied document metadata.
pub fn chunk_payload(
    document: &str,
    chunk_index: usize,
    chunk: &SemanticChunk,
    metadata: &serde_json::Value,
) -> serde_json::Value {
    json!({
        "text": chunk.text,
        "document": document,
        "chunk_index": chunk_index,
        "token_count": chunk.token_count,
        "metadata": metadata,
    })
}

/// Chunks documents and upserts them into a vector store with dense, sparse,
/// and late-interaction vectors.
///
/// Independent documents are safe to index concurrently; each call builds its
/// chunk set from scratch.
pub struct IngestionPipeline {
    chunker: SemanticChunker,
    provider: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
}

impl IngestionPipeline {
    pub fn new(
        chunker: SemanticChunker,
        provider: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            chunker,
            provider,
            store,
        }
    }

    /// Chunk `text`, embed every chunk in all three representations, and
    /// upsert the resulting points.
    ///
    /// A document that yields no chunks produces an empty outcome and no
    /// store call. Embedding and store failures propagate.
    pub async fn index_document(
        &self,
        document: &str,
        text: &str,
        metadata: serde_json::Value,
    ) -> Result<IndexOutcome, RagError> {
        let response = self.chunker.chunk_document(text).await?;
        let chunks = &response.outcome.chunks;
        if chunks.is_empty() {
            return Ok(IndexOutcome {
                document: document.to_string(),
                chunk_count: 0,
                telemetry: response.telemetry,
            });
        }

        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let mut points: Vec<ChunkPoint> = chunks
            .iter()
            .enumerate()
            .map(|(index, chunk)| {
                ChunkPoint::new(
                    Uuid::new_v4().to_string(),
                    chunk_payload(document, index, chunk, &metadata),
                )
            })
            .collect();

        for representation in Representation::ALL {
            let embeddings = self.provider.embed(&texts, representation).await?;
            if embeddings.len() != points.len() {
                return Err(RagError::Embedding(format!(
                    "requested {} {representation} embeddings, provider returned {}",
                    points.len(),
                    embeddings.len()
                )));
            }
            for (point, embedding) in points.iter_mut().zip(embeddings) {
                if embedding.representation() != representation {
                    return Err(RagError::Embedding(format!(
                        "requested {representation} embeddings, provider returned {}",
                        embedding.representation()
                    )));
                }
                point.vectors.insert(representation, embedding);
            }
        }

        let chunk_count = points.len();
        self.store.upsert(points).await?;
        info!(document, chunk_count, "indexed document");

        Ok(IndexOutcome {
            document: document.to_string(),
            chunk_count,
            telemetry: response.telemetry,
        })
    }
}
