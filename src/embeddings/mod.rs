//! Embedding provider boundary.
//!
//! Embedding inference is an external collaborator: the crate only defines the
//! [`EmbeddingProvider`] trait and the vector shapes it exchanges. Two
//! implementations ship with the crate:
//!
//! * [`MockEmbeddingProvider`] — deterministic hashed embeddings for tests and
//!   offline pipelines.
//! * [`HttpEmbeddingProvider`] — batch client for a remote embedding service.

pub mod http;
pub mod mock;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::RagError;

pub use http::HttpEmbeddingProvider;
pub use mock::MockEmbeddingProvider;

/// The vector space a text was embedded into.
///
/// A chunk is typically embedded once per representation; queries use the
/// cheap representations (`Dense`, `Sparse`) for broad recall and the
/// expensive `LateInteraction` representation only for candidate rescoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Representation {
    /// One fixed-length vector summarizing the whole text.
    Dense,
    /// High-dimensional, mostly-zero weighted term vector.
    Sparse,
    /// One vector per token, compared with MaxSim aggregation.
    LateInteraction,
}

impl Representation {
    /// All representations, in cascade order (cheap first).
    pub const ALL: [Representation; 3] = [
        Representation::Dense,
        Representation::Sparse,
        Representation::LateInteraction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Representation::Dense => "dense",
            Representation::Sparse => "sparse",
            Representation::LateInteraction => "late_interaction",
        }
    }
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single embedded text in one of the supported representations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Embedding {
    /// Fixed-length dense vector.
    Dense { vector: Vec<f32> },
    /// Sparse vector as parallel index/value arrays.
    Sparse { indices: Vec<u32>, values: Vec<f32> },
    /// One dense vector per token (late interaction).
    Multi { vectors: Vec<Vec<f32>> },
}

impl Embedding {
    /// The representation this embedding belongs to.
    pub fn representation(&self) -> Representation {
        match self {
            Embedding::Dense { .. } => Representation::Dense,
            Embedding::Sparse { .. } => Representation::Sparse,
            Embedding::Multi { .. } => Representation::LateInteraction,
        }
    }

    /// Borrow the dense vector, if this is a dense embedding.
    pub fn as_dense(&self) -> Option<&[f32]> {
        match self {
            Embedding::Dense { vector } => Some(vector),
            _ => None,
        }
    }
}

/// Batch interface to an external embedding model.
///
/// Implementations must return exactly one embedding per input text, in input
/// order, and every returned embedding must match the requested
/// representation. Failures propagate unmodified; retry policy, if any,
/// belongs to the implementation.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts into the requested representation.
    async fn embed(
        &self,
        texts: &[String],
        representation: Representation,
    ) -> Result<Vec<Embedding>, RagError>;

    /// Human-readable identifier used in telemetry.
    fn name(&self) -> &str {
        "embedding-provider"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn representation_round_trips_through_serde() {
        for representation in Representation::ALL {
            let json = serde_json::to_string(&representation).unwrap();
            let back: Representation = serde_json::from_str(&json).unwrap();
            assert_eq!(back, representation);
        }
        assert_eq!(
            serde_json::to_string(&Representation::LateInteraction).unwrap(),
            "\"late_interaction\""
        );
    }

    #[test]
    fn embedding_reports_its_representation() {
        let dense = Embedding::Dense {
            vector: vec![0.1, 0.2],
        };
        let sparse = Embedding::Sparse {
            indices: vec![3, 17],
            values: vec![0.5, 1.0],
        };
        let multi = Embedding::Multi {
            vectors: vec![vec![0.1], vec![0.2]],
        };

        assert_eq!(dense.representation(), Representation::Dense);
        assert_eq!(sparse.representation(), Representation::Sparse);
        assert_eq!(multi.representation(), Representation::LateInteraction);
        assert!(dense.as_dense().is_some());
        assert!(sparse.as_dense().is_none());
    }
}
