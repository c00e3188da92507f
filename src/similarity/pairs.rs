//! Threshold-based pair extraction.

use serde::Serialize;

use super::{SimilarityError, SimilarityMatrix};

/// An unordered document pair whose similarity reached a threshold.
///
/// `index_a < index_b` always holds. Serialized with the API's field names
/// (`index_1`, `index_2`, `similarity`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimilarPair {
    #[serde(rename = "index_1")]
    pub index_a: usize,
    #[serde(rename = "index_2")]
    pub index_b: usize,
    #[serde(rename = "similarity")]
    pub score: f32,
}

/// Find every pair in the strict upper triangle with `score >= threshold`.
///
/// `threshold` must lie in `[0.0, 1.0]`. Results are sorted by score
/// descending, ties by `(index_a, index_b)` ascending.
pub fn find_pairs(
    matrix: &SimilarityMatrix,
    threshold: f32,
) -> Result<Vec<SimilarPair>, SimilarityError> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(SimilarityError::InvalidThreshold(threshold));
    }

    let mut pairs: Vec<SimilarPair> = matrix
        .upper_triangle()
        .filter(|(_, _, score)| *score >= threshold)
        .map(|(index_a, index_b, score)| SimilarPair {
            index_a,
            index_b,
            score,
        })
        .collect();

    pairs.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(a.index_a.cmp(&b.index_a))
            .then(a.index_b.cmp(&b.index_b))
    });

    log::debug!(
        "found {} pairs at or above threshold {threshold}",
        pairs.len()
    );

    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_matrix() -> SimilarityMatrix {
        SimilarityMatrix::from_rows(vec![
            vec![1.0, 0.9, 0.2],
            vec![0.9, 1.0, 0.3],
            vec![0.2, 0.3, 1.0],
        ])
        .unwrap()
    }

    fn key(pair: &SimilarPair) -> (usize, usize) {
        (pair.index_a, pair.index_b)
    }

    #[test]
    fn test_three_document_scenario() {
        let pairs = find_pairs(&scenario_matrix(), 0.7).unwrap();
        assert_eq!(
            pairs,
            vec![SimilarPair {
                index_a: 0,
                index_b: 1,
                score: 0.9
            }]
        );
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let pairs = find_pairs(&scenario_matrix(), 0.3).unwrap();
        let keys: Vec<_> = pairs.iter().map(key).collect();
        assert_eq!(keys, vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn test_invalid_threshold() {
        let matrix = scenario_matrix();
        for threshold in [-0.1, 1.01, f32::NAN, f32::INFINITY] {
            let result = find_pairs(&matrix, threshold);
            assert!(
                matches!(result, Err(SimilarityError::InvalidThreshold(_))),
                "threshold {threshold} accepted"
            );
        }
    }

    #[test]
    fn test_boundaries_accepted() {
        let matrix = scenario_matrix();
        assert_eq!(find_pairs(&matrix, 0.0).unwrap().len(), 3);
        assert!(find_pairs(&matrix, 1.0).unwrap().is_empty());
    }

    #[test]
    fn test_zero_threshold_returns_every_pair() {
        for n in 0..6usize {
            let rows = (0..n)
                .map(|i| {
                    (0..n)
                        .map(|j| if i == j { 1.0 } else { 0.1 * ((i + j) % 5) as f32 })
                        .collect()
                })
                .collect();
            let matrix = SimilarityMatrix::from_rows(rows).unwrap();
            let pairs = find_pairs(&matrix, 0.0).unwrap();
            assert_eq!(pairs.len(), n * n.saturating_sub(1) / 2);
        }
    }

    #[test]
    fn test_descending_order_with_index_tie_break() {
        let matrix = SimilarityMatrix::from_rows(vec![
            vec![1.0, 0.8, 0.8, 0.9],
            vec![0.8, 1.0, 0.8, 0.1],
            vec![0.8, 0.8, 1.0, 0.8],
            vec![0.9, 0.1, 0.8, 1.0],
        ])
        .unwrap();

        let pairs = find_pairs(&matrix, 0.5).unwrap();
        let keys: Vec<_> = pairs.iter().map(key).collect();
        assert_eq!(keys, vec![(0, 3), (0, 1), (0, 2), (1, 2), (2, 3)]);
    }

    #[test]
    fn test_deterministic() {
        let matrix = scenario_matrix();
        let first = find_pairs(&matrix, 0.1).unwrap();
        let second = find_pairs(&matrix, 0.1).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_threshold_monotonicity() {
        let matrix = SimilarityMatrix::from_rows(vec![
            vec![1.0, 0.95, 0.4, 0.72],
            vec![0.95, 1.0, 0.61, 0.33],
            vec![0.4, 0.61, 1.0, 0.85],
            vec![0.72, 0.33, 0.85, 1.0],
        ])
        .unwrap();

        let thresholds = [0.0, 0.3, 0.5, 0.7, 0.85, 0.9, 1.0];
        for window in thresholds.windows(2) {
            let loose = find_pairs(&matrix, window[0]).unwrap();
            let strict = find_pairs(&matrix, window[1]).unwrap();
            for pair in &strict {
                assert!(loose.iter().any(|p| key(p) == key(pair)));
            }
        }
    }

    #[test]
    fn test_pairs_are_canonical() {
        let pairs = find_pairs(&scenario_matrix(), 0.0).unwrap();
        assert!(pairs.iter().all(|p| p.index_a < p.index_b));
    }

    #[test]
    fn test_serialized_field_names() {
        let pair = SimilarPair {
            index_a: 0,
            index_b: 2,
            score: 0.5,
        };
        let value = serde_json::to_value(pair).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"index_1": 0, "index_2": 2, "similarity": 0.5})
        );
    }
}
