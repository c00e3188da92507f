//! fastembed-backed embedding provider.
//!
//! - Lazy model loading into `<cache_dir>` on first use
//! - One cached `TextEmbedding` per model key
//! - Batch embedding with explicit L2 normalization

use fastembed::{InitOptions, TextEmbedding};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use super::cache::ModelCache;
use super::{catalog, l2_normalize, EmbeddingError, EmbeddingProvider, ModelStatus};

/// fastembed's embed() requires &mut self, hence a Mutex per model.
type SharedModel = Arc<Mutex<TextEmbedding>>;

/// Embedding provider that runs fastembed models locally.
pub struct FastEmbedProvider {
    cache_dir: PathBuf,
    models: ModelCache<Mutex<TextEmbedding>>,
}

impl FastEmbedProvider {
    /// Create a provider that downloads and caches models under `cache_dir`.
    ///
    /// Nothing is loaded until the first request for a model.
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            models: ModelCache::new(),
        }
    }

    /// Load a model if not already loaded and return a handle to it.
    ///
    /// Only callers asking for the same key wait on a load in progress.
    pub fn load_model(&self, model_key: &str) -> Result<SharedModel, EmbeddingError> {
        let info = catalog::lookup(model_key)?;

        self.models.get_or_load(info.key, || {
            log::info!("Loading model: {} (key: {})", info.name, info.key);

            std::fs::create_dir_all(&self.cache_dir).map_err(|e| {
                EmbeddingError::InitFailed(format!("Failed to create models directory: {}", e))
            })?;

            let options = InitOptions::new(info.fastembed_model())
                .with_cache_dir(self.cache_dir.clone())
                .with_show_download_progress(false);

            let model = TextEmbedding::try_new(options).map_err(|e| {
                log::error!("Failed to load model {}: {}", info.key, e);
                EmbeddingError::InitFailed(format!("Failed to load model {}: {}", info.key, e))
            })?;

            log::info!("Successfully loaded model: {}", info.key);
            Ok(Mutex::new(model))
        })
    }

    /// Check if a model is already loaded in memory.
    pub fn is_model_loaded(&self, model_key: &str) -> bool {
        self.models.is_loaded(model_key)
    }

    /// Unload a model from memory. Returns whether it was loaded.
    #[allow(dead_code)]
    pub fn unload_model(&self, model_key: &str) -> bool {
        let removed = self.models.remove(model_key);
        if removed {
            log::info!("Unloaded model: {model_key}");
        }
        removed
    }

    /// Clear all loaded models from memory.
    pub fn clear_all_models(&self) {
        self.models.clear();
        log::info!("Cleared all models from memory");
    }
}

impl EmbeddingProvider for FastEmbedProvider {
    fn embed(
        &self,
        documents: &[String],
        model_key: &str,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let model = self.load_model(model_key)?;

        if documents.is_empty() {
            return Ok(vec![]);
        }

        let mut model = model.lock().map_err(|e| {
            EmbeddingError::EmbeddingFailed(format!("Failed to acquire model lock: {}", e))
        })?;

        log::info!(
            "Generating embeddings for {} texts using {}",
            documents.len(),
            model_key
        );

        let mut embeddings = model.embed(documents.to_vec(), None).map_err(|e| {
            log::error!("Error generating embeddings: {}", e);
            EmbeddingError::EmbeddingFailed(e.to_string())
        })?;

        for embedding in embeddings.iter_mut() {
            l2_normalize(embedding);
        }

        log::debug!(
            "Generated {} embeddings of {} dimensions",
            embeddings.len(),
            embeddings.first().map(Vec::len).unwrap_or(0)
        );

        Ok(embeddings)
    }

    fn models(&self) -> Vec<ModelStatus> {
        catalog::MODELS
            .iter()
            .map(|info| ModelStatus {
                info: *info,
                loaded: self.is_model_loaded(info.key),
            })
            .collect()
    }

    fn ensure_loaded(&self, model_key: &str) -> Result<(), EmbeddingError> {
        self.load_model(model_key).map(|_| ())
    }

    fn release_all(&self) {
        self.clear_all_models();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_model_fails_before_loading() {
        let temp_dir = tempfile::tempdir().unwrap();
        let provider = FastEmbedProvider::new(temp_dir.path().join("models"));

        let result = provider.embed(&["hello".to_string()], "nonexistent-model");
        assert!(matches!(result, Err(EmbeddingError::UnknownModel(_))));
        assert!(!temp_dir.path().join("models").exists());
    }

    #[test]
    fn test_nothing_loaded_initially() {
        let temp_dir = tempfile::tempdir().unwrap();
        let provider = FastEmbedProvider::new(temp_dir.path().to_path_buf());

        assert!(provider.models().iter().all(|m| !m.loaded));
        assert!(!provider.is_model_loaded("miniLM"));
        assert!(!provider.unload_model("miniLM"));
    }

    // Integration tests require model download - run with --ignored
    #[test]
    #[ignore = "requires model download"]
    fn test_embeddings_are_normalized() {
        let temp_dir = tempfile::tempdir().unwrap();
        let provider = FastEmbedProvider::new(temp_dir.path().to_path_buf());

        let documents = vec!["Hello, world!".to_string(), "Goodbye.".to_string()];
        let embeddings = provider.embed(&documents, "miniLM").unwrap();

        assert_eq!(embeddings.len(), 2);
        for embedding in &embeddings {
            assert_eq!(embedding.len(), 384);
            let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 0.001);
        }
    }

    #[test]
    #[ignore = "requires model download"]
    fn test_model_cache_lifecycle() {
        let temp_dir = tempfile::tempdir().unwrap();
        let provider = FastEmbedProvider::new(temp_dir.path().to_path_buf());

        provider.ensure_loaded("miniLM").unwrap();
        assert!(provider.is_model_loaded("miniLM"));
        assert!(provider.models().iter().any(|m| m.info.key == "miniLM" && m.loaded));

        assert!(provider.unload_model("miniLM"));
        assert!(!provider.is_model_loaded("miniLM"));

        provider.ensure_loaded("miniLM").unwrap();
        provider.release_all();
        assert!(!provider.is_model_loaded("miniLM"));
    }
}
