//! Presentation-only score rescaling.

use crate::stores::ScoredPoint;

/// Divide every score by the maximum score in the (already limited) result.
///
/// With a positive maximum this maps scores into `(0, 1]` without changing
/// their order; when the maximum is zero or negative, or the result is empty,
/// all scores become 0. Runs strictly after the final top-N cut so a
/// near-zero maximum can never change which candidates are returned.
pub fn normalize_scores(points: &mut [ScoredPoint]) {
    let max_score = points
        .iter()
        .map(|point| point.score)
        .fold(f32::NEG_INFINITY, f32::max);

    if max_score > 0.0 {
        for point in points.iter_mut() {
            point.score /= max_score;
        }
    } else {
        for point in points.iter_mut() {
            point.score = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rescales_into_unit_range_without_reordering() {
        let mut points = vec![
            ScoredPoint::new("a", 8.0),
            ScoredPoint::new("b", 4.0),
            ScoredPoint::new("c", 2.0),
        ];
        normalize_scores(&mut points);

        assert_eq!(points[0].score, 1.0);
        assert_eq!(points[1].score, 0.5);
        assert_eq!(points[2].score, 0.25);
        let ids: Vec<&str> = points.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(points.iter().all(|p| (0.0..=1.0).contains(&p.score)));
    }

    #[test]
    fn zero_maximum_zeroes_everything() {
        let mut points = vec![ScoredPoint::new("a", 0.0), ScoredPoint::new("b", 0.0)];
        normalize_scores(&mut points);
        assert!(points.iter().all(|p| p.score == 0.0));
    }

    #[test]
    fn negative_maximum_zeroes_everything() {
        let mut points = vec![ScoredPoint::new("a", -0.2), ScoredPoint::new("b", -0.9)];
        normalize_scores(&mut points);
        assert!(points.iter().all(|p| p.score == 0.0));
    }

    #[test]
    fn empty_input_is_a_no_op() {
        let mut points: Vec<ScoredPoint> = Vec::new();
        normalize_scores(&mut points);
        assert!(points.is_empty());
    }
}
