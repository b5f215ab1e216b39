//! Chunking service: segmentation, embedding, clustering, and assembly.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::embeddings::{EmbeddingProvider, Representation};
use crate::types::RagError;

use super::assembly::assemble;
use super::clustering::{Clusterer, DensityClusterer};
use super::config::ChunkerConfig;
use super::segmenter::segment;
use super::tokenizer::TokenCounter;
use super::types::{ChunkingError, ChunkingOutcome, ChunkingStats};

/// Timing and shape information for one chunking invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkTelemetry {
    pub embedder: String,
    pub duration_ms: u64,
    pub paragraphs: usize,
    pub clusters: usize,
    pub orphans: usize,
    pub chunk_count: usize,
    pub average_tokens: f64,
}

/// Outcome plus telemetry for one chunked document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkDocumentResponse {
    pub outcome: ChunkingOutcome,
    pub telemetry: ChunkTelemetry,
}

/// Orchestrates the chunking pipeline for whole documents.
///
/// The service is stateless between invocations: paragraphs, clusters, and
/// chunks are recomputed from scratch every call, and independent documents
/// may be chunked concurrently from the calling application. Clustering for
/// one document (or its orphan subset) is always a single atomic call — the
/// algorithm needs the full embedding set to measure density.
pub struct SemanticChunker {
    config: ChunkerConfig,
    provider: Arc<dyn EmbeddingProvider>,
    clusterer: Arc<dyn Clusterer>,
    counter: Arc<dyn TokenCounter>,
}

impl fmt::Debug for SemanticChunker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SemanticChunker")
            .field("config", &self.config)
            .field("provider", &self.provider.name())
            .finish_non_exhaustive()
    }
}

impl SemanticChunker {
    pub fn builder() -> SemanticChunkerBuilder {
        SemanticChunkerBuilder::default()
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Chunk one document's raw text.
    ///
    /// Degenerate input (empty text, or nothing surviving the segmenter
    /// filter) yields an empty outcome without calling the embedding
    /// provider. Provider and clustering failures propagate.
    pub async fn chunk_document(&self, text: &str) -> Result<ChunkDocumentResponse, RagError> {
        let started = Instant::now();

        let paragraphs = segment(text, &self.config.segmenter);
        if paragraphs.is_empty() {
            debug!("no qualifying paragraphs, returning empty outcome");
            return Ok(self.response(ChunkingOutcome::default(), started));
        }

        let texts: Vec<String> = paragraphs
            .iter()
            .map(|paragraph| paragraph.text.clone())
            .collect();
        let embeddings = self.provider.embed(&texts, Representation::Dense).await?;
        if embeddings.len() != paragraphs.len() {
            return Err(ChunkingError::EmbeddingCountMismatch {
                expected: paragraphs.len(),
                got: embeddings.len(),
            }
            .into());
        }
        let mut vectors = Vec::with_capacity(embeddings.len());
        for embedding in &embeddings {
            let Some(vector) = embedding.as_dense() else {
                return Err(ChunkingError::RepresentationMismatch {
                    expected: Representation::Dense,
                    got: embedding.representation(),
                }
                .into());
            };
            vectors.push(vector.to_vec());
        }

        let labels = self
            .clusterer
            .cluster(&vectors, self.config.min_cluster_size)?;
        let (chunks, assembly) = assemble(
            &paragraphs,
            &vectors,
            &labels,
            self.clusterer.as_ref(),
            self.counter.as_ref(),
            &self.config,
        )?;

        let total_tokens: usize = chunks.iter().map(|chunk| chunk.token_count).sum();
        let stats = ChunkingStats {
            paragraphs: paragraphs.len(),
            clusters: assembly.clusters,
            orphans: assembly.orphans,
            orphan_clusters: assembly.orphan_clusters,
            singleton_chunks: assembly.singletons,
            total_chunks: chunks.len(),
            average_tokens: if chunks.is_empty() {
                0.0
            } else {
                total_tokens as f64 / chunks.len() as f64
            },
        };

        info!(
            paragraphs = stats.paragraphs,
            clusters = stats.clusters,
            orphans = stats.orphans,
            chunks = stats.total_chunks,
            "chunked document"
        );
        Ok(self.response(ChunkingOutcome { chunks, stats }, started))
    }

    fn response(&self, outcome: ChunkingOutcome, started: Instant) -> ChunkDocumentResponse {
        let telemetry = ChunkTelemetry {
            embedder: self.provider.name().to_string(),
            duration_ms: started.elapsed().as_millis() as u64,
            paragraphs: outcome.stats.paragraphs,
            clusters: outcome.stats.clusters,
            orphans: outcome.stats.orphans,
            chunk_count: outcome.stats.total_chunks,
            average_tokens: outcome.stats.average_tokens,
        };
        ChunkDocumentResponse { outcome, telemetry }
    }
}

/// Builder for [`SemanticChunker`].
#[derive(Default)]
pub struct SemanticChunkerBuilder {
    config: Option<ChunkerConfig>,
    provider: Option<Arc<dyn EmbeddingProvider>>,
    clusterer: Option<Arc<dyn Clusterer>>,
    counter: Option<Arc<dyn TokenCounter>>,
}

impl SemanticChunkerBuilder {
    #[must_use]
    pub fn with_config(mut self, config: ChunkerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Embedding provider to use for paragraph embeddings. Required.
    #[must_use]
    pub fn with_embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Override the clustering strategy. Defaults to [`DensityClusterer`].
    #[must_use]
    pub fn with_clusterer(mut self, clusterer: Arc<dyn Clusterer>) -> Self {
        self.clusterer = Some(clusterer);
        self
    }

    /// Override the token counter. Defaults to the `cl100k_base` BPE counter
    /// when the `tiktoken` feature is enabled, a word-based heuristic
    /// otherwise.
    #[must_use]
    pub fn with_token_counter(mut self, counter: Arc<dyn TokenCounter>) -> Self {
        self.counter = Some(counter);
        self
    }

    /// Validate the configuration and build the service.
    pub fn build(self) -> Result<SemanticChunker, RagError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let provider = self.provider.ok_or_else(|| {
            RagError::Config("SemanticChunker requires an embedding provider".into())
        })?;
        let counter = match self.counter {
            Some(counter) => counter,
            None => default_token_counter()?,
        };

        Ok(SemanticChunker {
            config,
            provider,
            clusterer: self
                .clusterer
                .unwrap_or_else(|| Arc::new(DensityClusterer::new())),
            counter,
        })
    }
}

#[cfg(feature = "tiktoken")]
fn default_token_counter() -> Result<Arc<dyn TokenCounter>, RagError> {
    Ok(Arc::new(super::tokenizer::TiktokenCounter::cl100k()?))
}

#[cfg(not(feature = "tiktoken"))]
fn default_token_counter() -> Result<Arc<dyn TokenCounter>, RagError> {
    Ok(Arc::new(super::tokenizer::HeuristicTokenCounter::new()))
}
