//! Reciprocal Rank Fusion.

use std::collections::HashMap;

use crate::stores::ScoredPoint;

/// Standard RRF dampening constant.
pub const DEFAULT_RRF_K: f32 = 60.0;

/// Fuse ranked lists by Reciprocal Rank Fusion.
///
/// A candidate's fused score is the sum over the lists it appears in of
/// `1 / (rank + k)` with 1-based ranks; lists it is absent from contribute
/// zero. Input scores are ignored — only positions matter. The fused ranking
/// is truncated to `limit`; score ties break by id so the output is
/// deterministic.
pub fn rrf_fuse(lists: &[Vec<ScoredPoint>], k: f32, limit: usize) -> Vec<ScoredPoint> {
    let mut fused: HashMap<&str, f32> = HashMap::new();
    for list in lists {
        for (rank, point) in list.iter().enumerate() {
            *fused.entry(point.id.as_str()).or_insert(0.0) += 1.0 / ((rank + 1) as f32 + k);
        }
    }

    let mut ranking: Vec<ScoredPoint> = fused
        .into_iter()
        .map(|(id, score)| ScoredPoint::new(id, score))
        .collect();
    ranking.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.id.cmp(&b.id)));
    ranking.truncate(limit);
    ranking
}
