//! In-memory embedding provider for tests that must not download models.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::embeddings::{self, l2_normalize, EmbeddingError, EmbeddingProvider, ModelStatus};

const DIMENSIONS: usize = 64;

/// Deterministic provider: explicit vectors for known texts, otherwise a
/// normalized bag-of-words hash. Identical texts always embed identically.
#[derive(Default)]
pub struct FakeProvider {
    vectors: HashMap<String, Vec<f32>>,
    failure: Option<String>,
    calls: AtomicUsize,
    last_inputs: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `vector` verbatim whenever `text` is embedded.
    pub fn with_vector(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }

    /// Fail every embed call after the model key check.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_inputs(&self) -> Vec<String> {
        self.last_inputs.lock().unwrap().clone()
    }
}

impl EmbeddingProvider for FakeProvider {
    fn embed(
        &self,
        documents: &[String],
        model_key: &str,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_inputs.lock().unwrap() = documents.to_vec();

        embeddings::lookup(model_key)?;

        if let Some(message) = &self.failure {
            return Err(EmbeddingError::EmbeddingFailed(message.clone()));
        }

        Ok(documents
            .iter()
            .map(|doc| {
                self.vectors
                    .get(doc)
                    .cloned()
                    .unwrap_or_else(|| hashed_embedding(doc))
            })
            .collect())
    }

    fn models(&self) -> Vec<ModelStatus> {
        embeddings::MODELS
            .iter()
            .map(|info| ModelStatus {
                info: *info,
                loaded: false,
            })
            .collect()
    }
}

fn hashed_embedding(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0; DIMENSIONS];
    for word in text.to_lowercase().split_whitespace() {
        let mut hasher = DefaultHasher::new();
        word.hash(&mut hasher);
        vector[(hasher.finish() % DIMENSIONS as u64) as usize] += 1.0;
    }
    l2_normalize(&mut vector);
    vector
}

/// Unit vectors whose pairwise dot products are 0.9 (0,1), 0.2 (0,2) and
/// 0.3 (1,2).
pub fn scenario_vectors() -> [Vec<f32>; 3] {
    let b1 = (1.0f32 - 0.81).sqrt();
    let b2 = (0.3 - 0.9 * 0.2) / b1;
    let c2 = (1.0 - 0.04 - b2 * b2).sqrt();
    [
        vec![1.0, 0.0, 0.0],
        vec![0.9, b1, 0.0],
        vec![0.2, b2, c2],
    ]
}

/// Provider serving [`scenario_vectors`] for the texts "alpha", "beta", "gamma".
pub fn scenario_provider() -> FakeProvider {
    let [a, b, c] = scenario_vectors();
    FakeProvider::new()
        .with_vector("alpha", a)
        .with_vector("beta", b)
        .with_vector("gamma", c)
}

pub fn texts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
