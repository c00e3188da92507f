use crate::embeddings::EmbeddingError;
use crate::similarity::SimilarityError;

/// Coarse failure class, for callers that branch on who is at fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller-correctable input problem.
    Validation,
    /// Model key not in the catalog. Caller-correctable.
    UnknownModel,
    /// The embedding provider failed internally.
    EmbeddingFailure,
    /// An engine invariant was violated.
    Internal,
}

#[derive(thiserror::Error, Debug)]
pub enum DetectionError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DetectionError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DetectionError::Validation(_) => ErrorKind::Validation,
            DetectionError::Embedding(EmbeddingError::UnknownModel(_)) => ErrorKind::UnknownModel,
            DetectionError::Embedding(_) => ErrorKind::EmbeddingFailure,
            DetectionError::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<SimilarityError> for DetectionError {
    fn from(err: SimilarityError) -> Self {
        match err {
            SimilarityError::EmptyInput | SimilarityError::InvalidThreshold(_) => {
                DetectionError::Validation(err.to_string())
            }
            SimilarityError::DimensionMismatch { .. } | SimilarityError::NotNormalized { .. } => {
                DetectionError::Internal(err.to_string())
            }
        }
    }
}
