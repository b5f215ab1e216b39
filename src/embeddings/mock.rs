//! Deterministic embedding provider for tests and offline runs.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use unicode_segmentation::UnicodeSegmentation;

use crate::types::RagError;

use super::{Embedding, EmbeddingProvider, Representation};

const DENSE_DIM: usize = 16;
const SPARSE_BUCKETS: u32 = 1 << 16;

/// Deterministic, model-free embedding provider.
///
/// Dense vectors are the normalized sum of per-word hash vectors, so texts
/// sharing vocabulary land close together in the embedding space — enough
/// signal for clustering and retrieval tests without a real model. Sparse
/// vectors hash each word into one of 2^16 buckets with its term frequency as
/// the weight; late-interaction output is one hash vector per word.
///
/// Identical text always produces identical embeddings within a process.
#[derive(Debug, Default, Clone)]
pub struct MockEmbeddingProvider;

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        Self
    }

    fn embed_one(text: &str, representation: Representation) -> Embedding {
        let words: Vec<&str> = text.unicode_words().collect();
        match representation {
            Representation::Dense => Embedding::Dense {
                vector: dense_of_words(&words),
            },
            Representation::Sparse => {
                let mut pairs: Vec<(u32, f32)> = Vec::new();
                for word in &words {
                    let bucket = (hash_word(word) % u64::from(SPARSE_BUCKETS)) as u32;
                    match pairs.iter_mut().find(|(index, _)| *index == bucket) {
                        Some((_, value)) => *value += 1.0,
                        None => pairs.push((bucket, 1.0)),
                    }
                }
                pairs.sort_by_key(|(index, _)| *index);
                let (indices, values) = pairs.into_iter().unzip();
                Embedding::Sparse { indices, values }
            }
            Representation::LateInteraction => {
                let vectors = if words.is_empty() {
                    vec![vec![0.0; DENSE_DIM]]
                } else {
                    words.iter().map(|word| word_vector(word)).collect()
                };
                Embedding::Multi { vectors }
            }
        }
    }
}

fn hash_word(word: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    word.to_lowercase().hash(&mut hasher);
    hasher.finish()
}

fn word_vector(word: &str) -> Vec<f32> {
    let mut state = hash_word(word);
    let mut vector = Vec::with_capacity(DENSE_DIM);
    for _ in 0..DENSE_DIM {
        // splitmix64 step, mapped into [-1, 1]
        state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^= z >> 31;
        vector.push((z as f64 / u64::MAX as f64 * 2.0 - 1.0) as f32);
    }
    normalize(&mut vector);
    vector
}

fn dense_of_words(words: &[&str]) -> Vec<f32> {
    let mut vector = vec![0.0f32; DENSE_DIM];
    for word in words {
        for (slot, component) in vector.iter_mut().zip(word_vector(word)) {
            *slot += component;
        }
    }
    normalize(&mut vector);
    vector
}

fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(
        &self,
        texts: &[String],
        representation: Representation,
    ) -> Result<Vec<Embedding>, RagError> {
        Ok(texts
            .iter()
            .map(|text| Self::embed_one(text, representation))
            .collect())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_embeddings_are_deterministic() {
        let provider = MockEmbeddingProvider::new();
        let texts = vec![
            "hello world".to_string(),
            "goodbye world".to_string(),
            "hello world".to_string(),
        ];

        let first = provider.embed(&texts, Representation::Dense).await.unwrap();
        let second = provider.embed(&texts, Representation::Dense).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first[0], first[2], "identical text, identical embedding");
        assert_ne!(first[0], first[1], "different text, different embedding");
    }

    #[tokio::test]
    async fn shared_vocabulary_is_closer_than_disjoint_vocabulary() {
        let provider = MockEmbeddingProvider::new();
        let texts = vec![
            "rust ownership and borrowing rules".to_string(),
            "rust ownership and lifetime rules".to_string(),
            "salted caramel dessert recipe".to_string(),
        ];

        let embeddings = provider.embed(&texts, Representation::Dense).await.unwrap();
        let a = embeddings[0].as_dense().unwrap();
        let b = embeddings[1].as_dense().unwrap();
        let c = embeddings[2].as_dense().unwrap();

        let dot = |x: &[f32], y: &[f32]| x.iter().zip(y).map(|(u, v)| u * v).sum::<f32>();
        assert!(dot(a, b) > dot(a, c));
    }

    #[tokio::test]
    async fn sparse_embedding_counts_repeated_terms() {
        let provider = MockEmbeddingProvider::new();
        let texts = vec!["risk risk factors".to_string()];

        let embeddings = provider
            .embed(&texts, Representation::Sparse)
            .await
            .unwrap();
        let Embedding::Sparse { indices, values } = &embeddings[0] else {
            panic!("expected sparse embedding");
        };
        assert_eq!(indices.len(), 2);
        assert!(values.contains(&2.0), "'risk' appears twice");
    }

    #[tokio::test]
    async fn late_interaction_emits_one_vector_per_word() {
        let provider = MockEmbeddingProvider::new();
        let texts = vec!["three word query".to_string()];

        let embeddings = provider
            .embed(&texts, Representation::LateInteraction)
            .await
            .unwrap();
        let Embedding::Multi { vectors } = &embeddings[0] else {
            panic!("expected multi embedding");
        };
        assert_eq!(vectors.len(), 3);
        assert!(vectors.iter().all(|v| v.len() == 16));
    }
}
