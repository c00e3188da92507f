//! Embedding generation for similarity analysis.
//!
//! # Architecture
//!
//! - `cache`: per-key model cache that never holds its map lock across a load
//! - `catalog`: supported model keys and their metadata
//! - `provider`: fastembed-backed provider with a lazy per-model cache
//!
//! The detection layer only sees the [`EmbeddingProvider`] trait, so tests and
//! alternative backends can stand in for fastembed.

mod cache;
mod catalog;
mod provider;

pub use catalog::{lookup, ModelInfo, DEFAULT_MODEL_KEY, MODELS};
pub use provider::FastEmbedProvider;

use serde::Serialize;

/// Error type for embedding operations
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("unknown model key: {0}")]
    UnknownModel(String),

    #[error("model initialization failed: {0}")]
    InitFailed(String),

    #[error("embedding generation failed: {0}")]
    EmbeddingFailed(String),
}

/// Catalog entry plus whether the model is currently held in memory.
#[derive(Debug, Clone, Serialize)]
pub struct ModelStatus {
    #[serde(flatten)]
    pub info: ModelInfo,
    pub loaded: bool,
}

/// Source of L2-normalized document embeddings.
///
/// Implementations return exactly one vector per input document, in input
/// order, each of unit length. Unrecognized keys fail with
/// [`EmbeddingError::UnknownModel`].
pub trait EmbeddingProvider: Send + Sync {
    fn embed(&self, documents: &[String], model_key: &str)
        -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Catalog with per-model load state.
    fn models(&self) -> Vec<ModelStatus>;

    /// Make sure a model is ready for use, loading it if needed.
    fn ensure_loaded(&self, model_key: &str) -> Result<(), EmbeddingError> {
        lookup(model_key).map(|_| ())
    }

    /// Drop every cached model.
    fn release_all(&self) {}
}

/// Scale a vector to unit L2 norm in place. Zero vectors are left untouched.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_l2_normalize() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_l2_normalize_zero_vector() {
        let mut v = vec![0.0, 0.0, 0.0];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.0, 0.0, 0.0]);
    }
}
