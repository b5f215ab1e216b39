//! Chunker configuration.

use serde::{Deserialize, Serialize};

use super::types::ChunkingError;

/// How the segmenter splits raw text into candidate paragraphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitMode {
    /// Every newline starts a new candidate span.
    #[default]
    Newline,
    /// Only blank lines separate candidate spans.
    BlankLine,
}

/// Paragraph segmentation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmenterConfig {
    pub split: SplitMode,
    /// Spans must contain strictly more words than this to be kept.
    pub min_words: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            split: SplitMode::Newline,
            min_words: 10,
        }
    }
}

/// Settings for the full chunking pipeline.
///
/// Validated at service construction: a zero token budget or a cluster size
/// below two can never produce coherent chunks and is rejected up front.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Token budget for aggregated chunks. A lone paragraph may exceed it.
    pub max_tokens: usize,
    /// Minimum cluster size for the primary clustering pass.
    pub min_cluster_size: usize,
    /// Minimum cluster size for the orphan reconciliation pass.
    pub orphan_cluster_size: usize,
    pub segmenter: SegmenterConfig,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_tokens: 300,
            min_cluster_size: 3,
            orphan_cluster_size: 2,
            segmenter: SegmenterConfig::default(),
        }
    }
}

impl ChunkerConfig {
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    #[must_use]
    pub fn with_min_cluster_size(mut self, size: usize) -> Self {
        self.min_cluster_size = size;
        self
    }

    #[must_use]
    pub fn with_orphan_cluster_size(mut self, size: usize) -> Self {
        self.orphan_cluster_size = size;
        self
    }

    #[must_use]
    pub fn with_segmenter(mut self, segmenter: SegmenterConfig) -> Self {
        self.segmenter = segmenter;
        self
    }

    /// Reject configurations that cannot yield coherent chunks.
    pub fn validate(&self) -> Result<(), ChunkingError> {
        if self.max_tokens == 0 {
            return Err(ChunkingError::InvalidConfig(
                "max_tokens must be at least 1".into(),
            ));
        }
        if self.min_cluster_size < 2 {
            return Err(ChunkingError::InvalidConfig(format!(
                "min_cluster_size must be >= 2, got {}; a cluster needs at least two points",
                self.min_cluster_size
            )));
        }
        if self.orphan_cluster_size < 2 {
            return Err(ChunkingError::InvalidConfig(format!(
                "orphan_cluster_size must be >= 2, got {}; a cluster needs at least two points",
                self.orphan_cluster_size
            )));
        }
        Ok(())
    }
}
