//! In-memory reference vector store.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::embeddings::{Embedding, Representation};
use crate::types::RagError;

use super::{ChunkPoint, ScoredPoint, VectorStore};

/// Exact-scan vector store for tests, demos, and small corpora.
///
/// Scoring per representation mirrors the collection layout this crate
/// targets: cosine similarity for dense vectors, dot product for sparse
/// vectors, and MaxSim for late-interaction multivectors (each query token's
/// best cosine match over the document's token vectors, summed).
#[derive(Debug, Default)]
pub struct MemoryVectorStore {
    points: RwLock<HashMap<String, ChunkPoint>>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn score(
        representation: Representation,
        query: &Embedding,
        stored: &Embedding,
    ) -> Result<f32, RagError> {
        match (representation, query, stored) {
            (
                Representation::Dense,
                Embedding::Dense { vector: q },
                Embedding::Dense { vector: d },
            ) => Ok(cosine(q, d)),
            (
                Representation::Sparse,
                Embedding::Sparse {
                    indices: qi,
                    values: qv,
                },
                Embedding::Sparse {
                    indices: di,
                    values: dv,
                },
            ) => Ok(sparse_dot(qi, qv, di, dv)),
            (
                Representation::LateInteraction,
                Embedding::Multi { vectors: q },
                Embedding::Multi { vectors: d },
            ) => Ok(max_sim(q, d)),
            _ => Err(RagError::Storage(format!(
                "representation mismatch: asked for {representation}, got query {} against stored {}",
                query.representation(),
                stored.representation()
            ))),
        }
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

fn sparse_dot(qi: &[u32], qv: &[f32], di: &[u32], dv: &[f32]) -> f32 {
    // index order is not part of the sparse embedding contract
    let mut q: Vec<(u32, f32)> = qi.iter().copied().zip(qv.iter().copied()).collect();
    let mut d: Vec<(u32, f32)> = di.iter().copied().zip(dv.iter().copied()).collect();
    q.sort_unstable_by_key(|(index, _)| *index);
    d.sort_unstable_by_key(|(index, _)| *index);

    let mut score = 0.0;
    let (mut i, mut j) = (0, 0);
    while i < q.len() && j < d.len() {
        match q[i].0.cmp(&d[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                score += q[i].1 * d[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    score
}

fn max_sim(query_tokens: &[Vec<f32>], doc_tokens: &[Vec<f32>]) -> f32 {
    query_tokens
        .iter()
        .map(|q| {
            doc_tokens
                .iter()
                .map(|d| cosine(q, d))
                .fold(f32::NEG_INFINITY, f32::max)
        })
        .filter(|best| best.is_finite())
        .sum()
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert(&self, points: Vec<ChunkPoint>) -> Result<(), RagError> {
        let mut guard = self.points.write();
        for point in points {
            guard.insert(point.id.clone(), point);
        }
        Ok(())
    }

    async fn search(
        &self,
        representation: Representation,
        query: &Embedding,
        limit: usize,
    ) -> Result<Vec<ScoredPoint>, RagError> {
        let guard = self.points.read();
        let mut hits = Vec::new();
        for point in guard.values() {
            let Some(stored) = point.vectors.get(&representation) else {
                continue;
            };
            let score = Self::score(representation, query, stored)?;
            hits.push(ScoredPoint::new(point.id.clone(), score));
        }
        hits.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.id.cmp(&b.id)));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn rescore(
        &self,
        representation: Representation,
        query: &Embedding,
        candidates: &[String],
    ) -> Result<Vec<ScoredPoint>, RagError> {
        let guard = self.points.read();
        let mut hits = Vec::new();
        for id in candidates {
            let Some(point) = guard.get(id) else {
                continue;
            };
            let Some(stored) = point.vectors.get(&representation) else {
                continue;
            };
            let score = Self::score(representation, query, stored)?;
            hits.push(ScoredPoint::new(id.clone(), score));
        }
        Ok(hits)
    }

    async fn payload(&self, id: &str) -> Result<Option<serde_json::Value>, RagError> {
        Ok(self.points.read().get(id).map(|point| point.payload.clone()))
    }

    async fn count(&self) -> Result<usize, RagError> {
        Ok(self.points.read().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dense(vector: Vec<f32>) -> Embedding {
        Embedding::Dense { vector }
    }

    async fn seeded_store() -> MemoryVectorStore {
        let store = MemoryVectorStore::new();
        store
            .upsert(vec![
                ChunkPoint::new("a", json!({"text": "alpha"}))
                    .with_vector(dense(vec![1.0, 0.0]))
                    .with_vector(Embedding::Sparse {
                        indices: vec![1, 5],
                        values: vec![1.0, 2.0],
                    })
                    .with_vector(Embedding::Multi {
                        vectors: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
                    }),
                ChunkPoint::new("b", json!({"text": "beta"}))
                    .with_vector(dense(vec![0.0, 1.0]))
                    .with_vector(Embedding::Sparse {
                        indices: vec![5],
                        values: vec![1.0],
                    })
                    .with_vector(Embedding::Multi {
                        vectors: vec![vec![0.0, 1.0]],
                    }),
            ])
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn dense_search_ranks_by_cosine() {
        let store = seeded_store().await;
        let hits = store
            .search(Representation::Dense, &dense(vec![0.9, 0.1]), 10)
            .await
            .unwrap();
        assert_eq!(hits[0].id, "a");
        assert_eq!(hits.len(), 2);
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn sparse_search_uses_overlapping_terms_only() {
        let store = seeded_store().await;
        let query = Embedding::Sparse {
            indices: vec![5],
            values: vec![1.0],
        };
        let hits = store
            .search(Representation::Sparse, &query, 10)
            .await
            .unwrap();
        // a scores 2.0 on term 5, b scores 1.0
        assert_eq!(hits[0].id, "a");
        assert_eq!(hits[0].score, 2.0);
        assert_eq!(hits[1].score, 1.0);
    }

    #[tokio::test]
    async fn max_sim_sums_best_matches_per_query_token() {
        let store = seeded_store().await;
        let query = Embedding::Multi {
            vectors: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
        };
        let hits = store
            .search(Representation::LateInteraction, &query, 10)
            .await
            .unwrap();
        // a matches both query tokens perfectly (2.0), b only the second (1.0)
        assert_eq!(hits[0].id, "a");
        assert!((hits[0].score - 2.0).abs() < 1e-6);
        assert!((hits[1].score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn sparse_scoring_tolerates_unsorted_indices() {
        let store = MemoryVectorStore::new();
        store
            .upsert(vec![ChunkPoint::new("u", json!({})).with_vector(
                Embedding::Sparse {
                    indices: vec![5, 1],
                    values: vec![1.0, 2.0],
                },
            )])
            .await
            .unwrap();

        let query = Embedding::Sparse {
            indices: vec![1],
            values: vec![1.0],
        };
        let hits = store
            .search(Representation::Sparse, &query, 10)
            .await
            .unwrap();
        assert_eq!(hits[0].score, 2.0);
    }

    #[tokio::test]
    async fn rescore_skips_unknown_ids() {
        let store = seeded_store().await;
        let hits = store
            .rescore(
                Representation::Dense,
                &dense(vec![1.0, 0.0]),
                &["a".to_string(), "missing".to_string()],
            )
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "a");
    }

    #[tokio::test]
    async fn upsert_replaces_by_id() {
        let store = seeded_store().await;
        store
            .upsert(vec![
                ChunkPoint::new("a", json!({"text": "replaced"}))
                    .with_vector(dense(vec![0.0, 1.0])),
            ])
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 2);
        let payload = store.payload("a").await.unwrap().unwrap();
        assert_eq!(payload["text"], "replaced");
    }

    #[tokio::test]
    async fn representation_mismatch_is_a_storage_error() {
        let store = seeded_store().await;
        let err = store
            .search(
                Representation::Dense,
                &Embedding::Sparse {
                    indices: vec![0],
                    values: vec![1.0],
                },
                10,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::Storage(_)));
    }
}
