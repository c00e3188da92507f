//! Pairwise similarity over normalized embedding vectors.
//!
//! Everything in here is synchronous and side-effect free:
//!
//! - `matrix`: full N×N similarity matrix from unit-length vectors
//! - `pairs`: threshold extraction over the upper triangle
//! - `stats`: descriptive statistics over the same population

mod matrix;
mod pairs;
mod stats;

pub use matrix::{check_normalized, compute_matrix, SimilarityMatrix};
pub use pairs::{find_pairs, SimilarPair};
pub use stats::{compute_statistics, SimilarityStatistics};

/// Allowed deviation of a vector's L2 norm from 1.0 before it is rejected.
pub const DEFAULT_NORM_TOLERANCE: f32 = 1e-3;

/// Errors raised by the similarity engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimilarityError {
    #[error("no embedding vectors provided")]
    EmptyInput,

    #[error("threshold must be between 0.0 and 1.0, got {0}")]
    InvalidThreshold(f32),

    #[error("dimension mismatch at vector {index}: expected {expected}, got {got}")]
    DimensionMismatch {
        expected: usize,
        got: usize,
        index: usize,
    },

    #[error("vector {index} is not unit length (norm {norm})")]
    NotNormalized { index: usize, norm: f32 },
}
