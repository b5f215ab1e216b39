//! Density-based clustering over paragraph embeddings.
//!
//! The clustering engine is a pluggable strategy behind the [`Clusterer`]
//! trait so assembly and reconciliation stay testable with stub label
//! functions. The provided [`DensityClusterer`] is an HDBSCAN-style
//! density/hierarchy hybrid: core distances from the k nearest neighbours,
//! a mutual-reachability minimum spanning tree, and a top-down hierarchy cut
//! that spills undersized components as noise and keeps leaf components as
//! clusters.

use super::types::{ChunkingError, ClusterLabel};

/// Strategy interface for one clustering pass.
///
/// `min_cluster_size` is the only per-call tuning input. Implementations must
/// return exactly one label per input vector — no point is ever dropped — and
/// use [`ClusterLabel::Noise`] for points that fit no cluster. Returning all
/// noise is a valid outcome, not an error.
pub trait Clusterer: Send + Sync {
    fn cluster(
        &self,
        vectors: &[Vec<f32>],
        min_cluster_size: usize,
    ) -> Result<Vec<ClusterLabel>, ChunkingError>;
}

/// Default density clusterer (Euclidean distance, fixed hyperparameters).
///
/// Chosen over centroid methods because it needs no pre-specified cluster
/// count, leaves semantically isolated paragraphs unclustered instead of
/// forcing them into an ill-fitting group, and adapts to locally varying
/// topic density within a document.
#[derive(Debug, Default, Clone, Copy)]
pub struct DensityClusterer;

impl DensityClusterer {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    a: usize,
    b: usize,
    weight: f64,
}

impl Clusterer for DensityClusterer {
    fn cluster(
        &self,
        vectors: &[Vec<f32>],
        min_cluster_size: usize,
    ) -> Result<Vec<ClusterLabel>, ChunkingError> {
        if min_cluster_size < 2 {
            return Err(ChunkingError::InvalidConfig(format!(
                "min_cluster_size must be >= 2, got {min_cluster_size}"
            )));
        }
        let n = vectors.len();
        if n == 0 {
            return Ok(Vec::new());
        }
        if n < min_cluster_size {
            return Ok(vec![ClusterLabel::Noise; n]);
        }

        let dim = vectors[0].len();
        if dim == 0 {
            return Err(ChunkingError::Clustering(
                "vectors must be non-empty".into(),
            ));
        }
        for (i, vector) in vectors.iter().enumerate() {
            if vector.len() != dim {
                return Err(ChunkingError::Clustering(format!(
                    "vector {i} has dimension {}, expected {dim}",
                    vector.len()
                )));
            }
            if vector.iter().any(|v| !v.is_finite()) {
                return Err(ChunkingError::Clustering(format!(
                    "vector {i} contains a non-finite component"
                )));
            }
        }

        let distances = pairwise_distances(vectors);
        let core = core_distances(&distances, n, min_cluster_size);
        let mst = mutual_reachability_mst(&distances, &core, n);
        Ok(cut_hierarchy(&mst, n, min_cluster_size))
    }
}

fn pairwise_distances(vectors: &[Vec<f32>]) -> Vec<f64> {
    let n = vectors.len();
    let mut distances = vec![0.0f64; n * n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = euclidean(&vectors[i], &vectors[j]);
            distances[i * n + j] = d;
            distances[j * n + i] = d;
        }
    }
    distances
}

fn euclidean(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = f64::from(x - y);
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

/// Distance to the `min_cluster_size - 1`-th nearest neighbour of each point.
fn core_distances(distances: &[f64], n: usize, min_cluster_size: usize) -> Vec<f64> {
    let min_samples = (min_cluster_size - 1).clamp(1, n - 1);
    let mut core = Vec::with_capacity(n);
    for i in 0..n {
        let mut row: Vec<f64> = (0..n)
            .filter(|&j| j != i)
            .map(|j| distances[i * n + j])
            .collect();
        row.sort_by(|a, b| a.total_cmp(b));
        core.push(row[min_samples - 1]);
    }
    core
}

/// Prim's MST over the mutual reachability graph.
fn mutual_reachability_mst(distances: &[f64], core: &[f64], n: usize) -> Vec<Edge> {
    let reach = |i: usize, j: usize| distances[i * n + j].max(core[i]).max(core[j]);

    let mut in_tree = vec![false; n];
    let mut best = vec![f64::INFINITY; n];
    let mut parent = vec![0usize; n];
    let mut edges = Vec::with_capacity(n.saturating_sub(1));

    in_tree[0] = true;
    for j in 1..n {
        best[j] = reach(0, j);
    }

    for _ in 1..n {
        let mut next = usize::MAX;
        let mut next_weight = f64::INFINITY;
        for j in 0..n {
            if !in_tree[j] && best[j] < next_weight {
                next = j;
                next_weight = best[j];
            }
        }
        in_tree[next] = true;
        edges.push(Edge {
            a: parent[next].min(next),
            b: parent[next].max(next),
            weight: next_weight,
        });
        for j in 0..n {
            if !in_tree[j] {
                let w = reach(next, j);
                if w < best[j] {
                    best[j] = w;
                    parent[j] = next;
                }
            }
        }
    }
    edges
}

/// Relative tolerance for grouping mutual-reachability weights into one
/// hierarchy level. Weights derive from `f32` coordinates, so conceptually
/// equal link weights can differ by a few ulps.
const TIE_EPSILON: f64 = 1e-6;

/// Top-down cut of the single-linkage hierarchy encoded by the MST.
///
/// Repeatedly removes the heaviest remaining edges (near-ties within
/// [`TIE_EPSILON`] all at once) from the current component. Sub-components
/// smaller than `min_cluster_size` spill out as noise; a component whose next
/// split would leave no viable sub-component is kept whole as a leaf cluster.
fn cut_hierarchy(mst: &[Edge], n: usize, min_cluster_size: usize) -> Vec<ClusterLabel> {
    let mut labels = vec![ClusterLabel::Noise; n];
    let mut next_label = 0u32;

    // (component nodes, MST edges internal to the component, sorted desc)
    let mut sorted: Vec<Edge> = mst.to_vec();
    sorted.sort_by(|x, y| {
        y.weight
            .total_cmp(&x.weight)
            .then(x.a.cmp(&y.a))
            .then(x.b.cmp(&y.b))
    });
    let mut stack: Vec<(Vec<usize>, Vec<Edge>)> = vec![((0..n).collect(), sorted)];

    while let Some((nodes, edges)) = stack.pop() {
        if nodes.len() < min_cluster_size {
            continue; // stays noise
        }
        if edges.is_empty() {
            for &node in &nodes {
                labels[node] = ClusterLabel::Cluster(next_label);
            }
            next_label += 1;
            continue;
        }

        let cutoff = edges[0].weight * (1.0 - TIE_EPSILON);
        let kept: Vec<Edge> = edges
            .iter()
            .copied()
            .filter(|edge| edge.weight < cutoff)
            .collect();
        let components = connected_components(&nodes, &kept);

        if components
            .iter()
            .all(|component| component.len() < min_cluster_size)
        {
            // Leaf cluster: no viable split remains below this level.
            for &node in &nodes {
                labels[node] = ClusterLabel::Cluster(next_label);
            }
            next_label += 1;
            continue;
        }

        for component in components {
            if component.len() < min_cluster_size {
                continue; // spilled as noise
            }
            let internal: Vec<Edge> = kept
                .iter()
                .copied()
                .filter(|edge| component.binary_search(&edge.a).is_ok())
                .collect();
            stack.push((component, internal));
        }
    }

    labels
}

fn connected_components(nodes: &[usize], edges: &[Edge]) -> Vec<Vec<usize>> {
    use std::collections::HashMap;

    let mut adjacency: HashMap<usize, Vec<usize>> = HashMap::new();
    for edge in edges {
        adjacency.entry(edge.a).or_default().push(edge.b);
        adjacency.entry(edge.b).or_default().push(edge.a);
    }

    let mut seen: HashMap<usize, bool> = nodes.iter().map(|&node| (node, false)).collect();
    let mut components = Vec::new();

    for &start in nodes {
        if seen[&start] {
            continue;
        }
        let mut component = vec![start];
        seen.insert(start, true);
        let mut queue = vec![start];
        while let Some(node) = queue.pop() {
            if let Some(neighbours) = adjacency.get(&node) {
                for &neighbour in neighbours {
                    if let Some(visited) = seen.get_mut(&neighbour)
                        && !*visited
                    {
                        *visited = true;
                        component.push(neighbour);
                        queue.push(neighbour);
                    }
                }
            }
        }
        component.sort_unstable();
        components.push(component);
    }
    components
}
