//! Token-bounded chunk assembly and orphan reconciliation.

use tracing::debug;

use super::clustering::Clusterer;
use super::config::ChunkerConfig;
use super::tokenizer::TokenCounter;
use super::types::{ChunkOrigin, ChunkingError, ClusterLabel, Paragraph, SemanticChunk};

const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Clusters and orphans extracted from one labeling pass.
///
/// Clusters are ordered by their first member's document position and cluster
/// members keep document order, so assembly output is deterministic even
/// though cluster identities are arbitrary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterPartition {
    /// `(label, member paragraph positions)` pairs.
    pub clusters: Vec<(u32, Vec<usize>)>,
    /// Positions of paragraphs labeled noise.
    pub orphans: Vec<usize>,
}

/// Group label output into ordered clusters and the orphan pool.
pub fn partition(labels: &[ClusterLabel]) -> ClusterPartition {
    let mut clusters: Vec<(u32, Vec<usize>)> = Vec::new();
    let mut orphans = Vec::new();

    for (position, label) in labels.iter().enumerate() {
        match label {
            ClusterLabel::Noise => orphans.push(position),
            ClusterLabel::Cluster(id) => {
                match clusters.iter_mut().find(|(existing, _)| existing == id) {
                    Some((_, members)) => members.push(position),
                    None => clusters.push((*id, vec![position])),
                }
            }
        }
    }

    ClusterPartition { clusters, orphans }
}

/// Greedily pack one cluster's paragraphs into chunks under `max_tokens`.
///
/// Single pass in document order: when adding the next paragraph would push
/// the buffer over budget and the buffer is non-empty, the buffer is closed
/// (paragraphs joined with a blank line) and a new one starts. A lone
/// paragraph over budget is still emitted as its own chunk — the budget
/// bounds aggregation and never truncates a paragraph.
pub fn assemble_cluster(
    members: &[&Paragraph],
    counter: &dyn TokenCounter,
    max_tokens: usize,
    origin: ChunkOrigin,
) -> Vec<SemanticChunk> {
    let mut chunks = Vec::new();
    let mut buffer: Vec<&Paragraph> = Vec::new();
    let mut buffer_tokens = 0usize;

    for paragraph in members {
        let tokens = counter.count(&paragraph.text);
        if buffer_tokens + tokens > max_tokens && !buffer.is_empty() {
            chunks.push(close_chunk(&buffer, buffer_tokens, origin));
            buffer.clear();
            buffer_tokens = 0;
        }
        buffer.push(paragraph);
        buffer_tokens += tokens;
    }
    if !buffer.is_empty() {
        chunks.push(close_chunk(&buffer, buffer_tokens, origin));
    }
    chunks
}

fn close_chunk(buffer: &[&Paragraph], token_count: usize, origin: ChunkOrigin) -> SemanticChunk {
    let text = buffer
        .iter()
        .map(|paragraph| paragraph.text.as_str())
        .collect::<Vec<_>>()
        .join(PARAGRAPH_SEPARATOR);
    SemanticChunk {
        text,
        token_count,
        paragraph_indices: buffer.iter().map(|paragraph| paragraph.index).collect(),
        origin,
    }
}

/// Assemble chunks from a labeled paragraph set, then reconcile orphans.
///
/// Orphan reconciliation re-clusters the noise subset once, at
/// `orphan_cluster_size`, reusing the embeddings already computed for those
/// paragraphs. Paragraphs still unclustered after that pass are emitted as
/// standalone chunks. A lone orphan skips the second clustering call entirely
/// (clustering needs at least two points); orphans of the second pass are
/// never re-clustered a third time.
pub fn assemble(
    paragraphs: &[Paragraph],
    vectors: &[Vec<f32>],
    labels: &[ClusterLabel],
    clusterer: &dyn Clusterer,
    counter: &dyn TokenCounter,
    config: &ChunkerConfig,
) -> Result<(Vec<SemanticChunk>, AssemblyStats), ChunkingError> {
    debug_assert_eq!(paragraphs.len(), labels.len());
    debug_assert_eq!(paragraphs.len(), vectors.len());

    let primary = partition(labels);
    let mut chunks = Vec::new();
    let mut stats = AssemblyStats {
        clusters: primary.clusters.len(),
        orphans: primary.orphans.len(),
        ..AssemblyStats::default()
    };

    for (label, members) in &primary.clusters {
        let members: Vec<&Paragraph> = members.iter().map(|&pos| &paragraphs[pos]).collect();
        chunks.extend(assemble_cluster(
            &members,
            counter,
            config.max_tokens,
            ChunkOrigin::Primary(*label),
        ));
    }

    match primary.orphans.len() {
        0 => {}
        1 => {
            // A single orphan is emitted directly; a second clustering pass
            // needs at least two points to say anything.
            let paragraph = &paragraphs[primary.orphans[0]];
            chunks.push(close_chunk(
                &[paragraph],
                counter.count(&paragraph.text),
                ChunkOrigin::OrphanSingleton,
            ));
            stats.singletons = 1;
        }
        _ => {
            let orphan_vectors: Vec<Vec<f32>> = primary
                .orphans
                .iter()
                .map(|&pos| vectors[pos].clone())
                .collect();
            let orphan_labels = clusterer.cluster(&orphan_vectors, config.orphan_cluster_size)?;
            let secondary = partition(&orphan_labels);
            stats.orphan_clusters = secondary.clusters.len();
            stats.singletons = secondary.orphans.len();

            for (label, members) in &secondary.clusters {
                let members: Vec<&Paragraph> = members
                    .iter()
                    .map(|&pos| &paragraphs[primary.orphans[pos]])
                    .collect();
                chunks.extend(assemble_cluster(
                    &members,
                    counter,
                    config.max_tokens,
                    ChunkOrigin::OrphanCluster(*label),
                ));
            }
            for &pos in &secondary.orphans {
                let paragraph = &paragraphs[primary.orphans[pos]];
                chunks.push(close_chunk(
                    &[paragraph],
                    counter.count(&paragraph.text),
                    ChunkOrigin::OrphanSingleton,
                ));
            }
        }
    }

    debug!(
        clusters = stats.clusters,
        orphans = stats.orphans,
        orphan_clusters = stats.orphan_clusters,
        singletons = stats.singletons,
        chunks = chunks.len(),
        "assembled chunks"
    );
    Ok((chunks, stats))
}

/// Counters produced by [`assemble`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblyStats {
    pub clusters: usize,
    pub orphans: usize,
    pub orphan_clusters: usize,
    pub singletons: usize,
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::semantic_chunking::tokenizer::WordTokenCounter;

    fn paragraphs(texts: &[&str]) -> Vec<Paragraph> {
        texts
            .iter()
            .enumerate()
            .map(|(index, text)| Paragraph::new(index, *text))
            .collect()
    }

    fn zero_vectors(count: usize) -> Vec<Vec<f32>> {
        vec![vec![0.0, 0.0]; count]
    }

    /// Clusterer that replays a fixed label sequence and counts calls.
    struct StubClusterer {
        labels: Vec<ClusterLabel>,
        calls: AtomicUsize,
    }

    impl StubClusterer {
        fn new(labels: Vec<ClusterLabel>) -> Self {
            Self {
                labels,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Clusterer for StubClusterer {
        fn cluster(
            &self,
            vectors: &[Vec<f32>],
            _min_cluster_size: usize,
        ) -> Result<Vec<ClusterLabel>, ChunkingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(vectors.len(), self.labels.len());
            Ok(self.labels.clone())
        }
    }

    #[test]
    fn partition_orders_clusters_by_first_appearance() {
        let labels = vec![
            ClusterLabel::Cluster(7),
            ClusterLabel::Noise,
            ClusterLabel::Cluster(2),
            ClusterLabel::Cluster(7),
        ];
        let partitioned = partition(&labels);
        assert_eq!(
            partitioned.clusters,
            vec![(7, vec![0, 3]), (2, vec![2])]
        );
        assert_eq!(partitioned.orphans, vec![1]);
    }

    #[test]
    fn greedy_packing_respects_the_budget() {
        let paragraphs = paragraphs(&[
            "alpha beta gamma delta",         // 4 tokens
            "epsilon zeta eta",               // 3 tokens
            "theta iota kappa lambda mu nu",  // 6 tokens
        ]);
        let members: Vec<&Paragraph> = paragraphs.iter().collect();
        let chunks = assemble_cluster(&members, &WordTokenCounter, 8, ChunkOrigin::Primary(0));

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].paragraph_indices, vec![0, 1]);
        assert_eq!(chunks[0].token_count, 7);
        assert_eq!(chunks[0].text, "alpha beta gamma delta\n\nepsilon zeta eta");
        assert_eq!(chunks[1].paragraph_indices, vec![2]);
    }

    #[test]
    fn oversized_single_paragraph_still_becomes_a_chunk() {
        let paragraphs = paragraphs(&["one two three four five six seven eight nine ten"]);
        let members: Vec<&Paragraph> = paragraphs.iter().collect();
        let chunks = assemble_cluster(&members, &WordTokenCounter, 3, ChunkOrigin::Primary(0));

        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].token_count > 3);
    }

    #[test]
    fn multi_paragraph_chunks_never_exceed_the_budget() {
        let texts: Vec<String> = (0..10)
            .map(|i| format!("paragraph {i} has exactly six words"))
            .collect();
        let text_refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let paragraphs = paragraphs(&text_refs);
        let members: Vec<&Paragraph> = paragraphs.iter().collect();
        let chunks = assemble_cluster(&members, &WordTokenCounter, 14, ChunkOrigin::Primary(0));

        for chunk in &chunks {
            if chunk.paragraph_indices.len() > 1 {
                assert!(chunk.token_count <= 14);
            }
        }
        // no loss, no duplication, order preserved
        let all: Vec<usize> = chunks
            .iter()
            .flat_map(|chunk| chunk.paragraph_indices.clone())
            .collect();
        assert_eq!(all, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn assembly_is_deterministic() {
        let paragraphs = paragraphs(&[
            "first paragraph about one topic",
            "second paragraph about one topic",
            "third paragraph about another topic",
        ]);
        let labels = vec![
            ClusterLabel::Cluster(0),
            ClusterLabel::Cluster(0),
            ClusterLabel::Noise,
        ];
        let stub = StubClusterer::new(vec![]);
        let config = ChunkerConfig::default();

        let (first, _) = assemble(
            &paragraphs,
            &zero_vectors(3),
            &labels,
            &stub,
            &WordTokenCounter,
            &config,
        )
        .unwrap();
        let (second, _) = assemble(
            &paragraphs,
            &zero_vectors(3),
            &labels,
            &stub,
            &WordTokenCounter,
            &config,
        )
        .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn single_orphan_skips_the_second_clustering_pass() {
        let paragraphs = paragraphs(&[
            "clustered paragraph number one",
            "clustered paragraph number two",
            "the odd one out",
        ]);
        let labels = vec![
            ClusterLabel::Cluster(0),
            ClusterLabel::Cluster(0),
            ClusterLabel::Noise,
        ];
        let stub = StubClusterer::new(vec![ClusterLabel::Noise]);
        let config = ChunkerConfig::default();

        let (chunks, stats) = assemble(
            &paragraphs,
            &zero_vectors(3),
            &labels,
            &stub,
            &WordTokenCounter,
            &config,
        )
        .unwrap();

        assert_eq!(stub.calls(), 0, "one orphan must not trigger clustering");
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].text, "the odd one out");
        assert_eq!(chunks[1].origin, ChunkOrigin::OrphanSingleton);
        assert_eq!(stats.singletons, 1);
    }

    #[test]
    fn orphans_are_reconciled_with_one_finer_pass() {
        let paragraphs = paragraphs(&[
            "primary cluster paragraph one",
            "primary cluster paragraph two",
            "primary cluster paragraph three",
            "orphan about databases",
            "orphan about databases again",
            "orphan about gardening",
        ]);
        let labels = vec![
            ClusterLabel::Cluster(0),
            ClusterLabel::Cluster(0),
            ClusterLabel::Cluster(0),
            ClusterLabel::Noise,
            ClusterLabel::Noise,
            ClusterLabel::Noise,
        ];
        // Second pass pairs the two database orphans, leaves gardening alone.
        let stub = StubClusterer::new(vec![
            ClusterLabel::Cluster(0),
            ClusterLabel::Cluster(0),
            ClusterLabel::Noise,
        ]);
        let config = ChunkerConfig::default();

        let (chunks, stats) = assemble(
            &paragraphs,
            &zero_vectors(6),
            &labels,
            &stub,
            &WordTokenCounter,
            &config,
        )
        .unwrap();

        assert_eq!(stub.calls(), 1, "orphans of orphans are not re-clustered");
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].paragraph_indices, vec![0, 1, 2]);
        assert_eq!(chunks[1].paragraph_indices, vec![3, 4]);
        assert_eq!(chunks[1].origin, ChunkOrigin::OrphanCluster(0));
        assert_eq!(chunks[2].paragraph_indices, vec![5]);
        assert_eq!(chunks[2].origin, ChunkOrigin::OrphanSingleton);
        assert_eq!(stats.orphan_clusters, 1);
        assert_eq!(stats.singletons, 1);
    }

    #[test]
    fn every_paragraph_lands_in_exactly_one_chunk() {
        let paragraphs = paragraphs(&[
            "paragraph zero text body",
            "paragraph one text body",
            "paragraph two text body",
            "paragraph three text body",
            "paragraph four text body",
        ]);
        let labels = vec![
            ClusterLabel::Cluster(1),
            ClusterLabel::Noise,
            ClusterLabel::Cluster(1),
            ClusterLabel::Noise,
            ClusterLabel::Cluster(1),
        ];
        let stub = StubClusterer::new(vec![ClusterLabel::Noise, ClusterLabel::Noise]);
        let config = ChunkerConfig::default();

        let (chunks, _) = assemble(
            &paragraphs,
            &zero_vectors(5),
            &labels,
            &stub,
            &WordTokenCounter,
            &config,
        )
        .unwrap();

        let mut seen: Vec<usize> = chunks
            .iter()
            .flat_map(|chunk| chunk.paragraph_indices.clone())
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);

        // cluster members stay in document order inside the joined text
        let cluster_chunk = &chunks[0];
        assert_eq!(cluster_chunk.paragraph_indices, vec![0, 2, 4]);
        let zero = cluster_chunk.text.find("paragraph zero").unwrap();
        let two = cluster_chunk.text.find("paragraph two").unwrap();
        let four = cluster_chunk.text.find("paragraph four").unwrap();
        assert!(zero < two && two < four);
    }
}
