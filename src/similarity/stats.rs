//! Descriptive statistics over the similarity space.

use serde::Serialize;

use super::SimilarityMatrix;

/// Statistics over the strict upper triangle of a similarity matrix.
///
/// `std_similarity` is the population standard deviation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SimilarityStatistics {
    pub total_pairs: usize,
    pub mean_similarity: f32,
    pub max_similarity: f32,
    pub min_similarity: f32,
    pub std_similarity: f32,
}

/// Compute statistics over every unordered pair `(i, j)`, `i < j`.
///
/// A matrix with fewer than two rows has no pairs and yields the all-zero
/// record.
pub fn compute_statistics(matrix: &SimilarityMatrix) -> SimilarityStatistics {
    let scores: Vec<f32> = matrix.upper_triangle().map(|(_, _, score)| score).collect();

    if scores.is_empty() {
        return SimilarityStatistics::default();
    }

    let count = scores.len() as f64;
    let mean = scores.iter().map(|&s| f64::from(s)).sum::<f64>() / count;
    let variance = scores
        .iter()
        .map(|&s| (f64::from(s) - mean).powi(2))
        .sum::<f64>()
        / count;

    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let min = scores.iter().copied().fold(f32::INFINITY, f32::min);

    SimilarityStatistics {
        total_pairs: scores.len(),
        mean_similarity: mean as f32,
        max_similarity: max,
        min_similarity: min,
        std_similarity: variance.sqrt() as f32,
    }
}
