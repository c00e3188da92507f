//! Supported embedding models.

use serde::Serialize;

use super::EmbeddingError;

/// Model key used when a request does not name one.
pub const DEFAULT_MODEL_KEY: &str = "miniLM";

/// Static description of a supported model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelInfo {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub dimensions: usize,
}

pub const MODELS: &[ModelInfo] = &[
    ModelInfo {
        key: "miniLM",
        name: "all-MiniLM-L6-v2",
        description: "Lightweight model, fast inference, good for general use",
        dimensions: 384,
    },
    ModelInfo {
        key: "mpnet",
        name: "all-mpnet-base-v2",
        description: "High-quality embeddings, balanced speed and accuracy",
        dimensions: 768,
    },
    ModelInfo {
        key: "bge-small",
        name: "bge-small-en-v1.5",
        description: "Compact BGE model, strong retrieval quality for its size",
        dimensions: 384,
    },
    ModelInfo {
        key: "bge-base",
        name: "bge-base-en-v1.5",
        description: "Larger BGE model, best accuracy of the bundled set",
        dimensions: 768,
    },
];

/// Resolve a model key. Keys are case-sensitive.
pub fn lookup(key: &str) -> Result<&'static ModelInfo, EmbeddingError> {
    MODELS
        .iter()
        .find(|m| m.key == key)
        .ok_or_else(|| EmbeddingError::UnknownModel(key.to_string()))
}

impl ModelInfo {
    pub(super) fn fastembed_model(&self) -> fastembed::EmbeddingModel {
        match self.key {
            "mpnet" => fastembed::EmbeddingModel::AllMpnetBaseV2,
            "bge-small" => fastembed::EmbeddingModel::BGESmallENV15,
            "bge-base" => fastembed::EmbeddingModel::BGEBaseENV15,
            _ => fastembed::EmbeddingModel::AllMiniLML6V2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_model_is_in_catalog() {
        let info = lookup(DEFAULT_MODEL_KEY).unwrap();
        assert_eq!(info.name, "all-MiniLM-L6-v2");
        assert_eq!(info.dimensions, 384);
    }

    #[test]
    fn test_unknown_key() {
        let result = lookup("word2vec");
        assert!(matches!(result, Err(EmbeddingError::UnknownModel(key)) if key == "word2vec"));
    }

    #[test]
    fn test_keys_are_unique() {
        for (i, a) in MODELS.iter().enumerate() {
            for b in &MODELS[i + 1..] {
                assert_ne!(a.key, b.key);
            }
        }
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        assert!(lookup("minilm").is_err());
    }
}
