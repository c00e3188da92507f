//! Duplicate and paraphrase detection.
//!
//! [`DetectionService`] sequences embedding retrieval, matrix construction and
//! pair extraction, and assembles typed results with previews and metadata.
//! It owns no mutable state: one instance can serve concurrent callers as long
//! as the embedding provider can.

mod errors;
mod preview;
mod types;

pub use errors::{DetectionError, ErrorKind};
pub use preview::{text_preview, DEFAULT_PREVIEW_LENGTH};
pub use types::{AnalysisMetadata, AnalysisResult, MultiLevelResult, PreviewPair, SimilarityReport};

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::embeddings::{EmbeddingError, EmbeddingProvider};
use crate::preprocess::{preprocess_texts, PreprocessOptions};
use crate::similarity::{
    check_normalized, compute_matrix, compute_statistics, find_pairs, SimilarPair,
    SimilarityMatrix, DEFAULT_NORM_TOLERANCE,
};

/// Score at or above which two texts are reported as highly similar.
pub const HIGH_SIMILARITY_BAND: f32 = 0.85;

/// Score at or above which two texts are reported as moderately similar.
pub const MODERATE_SIMILARITY_BAND: f32 = 0.70;

/// Tunables for a [`DetectionService`].
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionOptions {
    /// Preview budget in characters.
    pub preview_length: usize,
    /// Accepted deviation of provider vectors from unit length.
    pub normalization_tolerance: f32,
    /// Preprocessing applied to the embedding input only; previews always
    /// show the original text.
    pub preprocessing: Option<PreprocessOptions>,
}

impl Default for DetectionOptions {
    fn default() -> Self {
        Self {
            preview_length: DEFAULT_PREVIEW_LENGTH,
            normalization_tolerance: DEFAULT_NORM_TOLERANCE,
            preprocessing: None,
        }
    }
}

impl DetectionOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            preview_length: config.preview_length,
            normalization_tolerance: config.normalization_tolerance,
            preprocessing: config.preprocessing.options(),
        }
    }
}

/// Orchestrates similarity analysis over a batch of documents.
pub struct DetectionService {
    provider: Arc<dyn EmbeddingProvider>,
    options: DetectionOptions,
}

impl DetectionService {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, options: DetectionOptions) -> Self {
        Self { provider, options }
    }

    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    pub fn options(&self) -> &DetectionOptions {
        &self.options
    }

    /// Find every document pair whose similarity reaches `threshold`.
    ///
    /// Fails with a validation error before any embedding work when
    /// `documents` is empty or `threshold` lies outside `[0.0, 1.0]`.
    pub fn analyze(
        &self,
        documents: &[String],
        model_key: &str,
        threshold: f32,
    ) -> Result<AnalysisResult, DetectionError> {
        let started = Instant::now();

        validate_documents(documents)?;
        validate_threshold("threshold", threshold)?;

        log::info!(
            "Starting analysis of {} texts (model={}, threshold={})",
            documents.len(),
            model_key,
            threshold
        );

        let matrix = self.similarity_matrix(documents, model_key)?;
        let pairs = find_pairs(&matrix, threshold)?;
        let pairs = self.with_previews(&pairs, documents);
        let metadata = analysis_metadata(&matrix, model_key, threshold, started);

        log::info!(
            "Analysis completed in {:.2}s, {} pairs at or above {}",
            metadata.execution_time,
            pairs.len(),
            threshold
        );

        Ok(AnalysisResult {
            similarity_matrix: matrix,
            pairs,
            metadata,
        })
    }

    /// Report pairs at a strict and a moderate tier from a single matrix.
    ///
    /// No ordering is enforced between the two thresholds.
    pub fn detect_multi_level(
        &self,
        documents: &[String],
        model_key: &str,
        strict_threshold: f32,
        moderate_threshold: f32,
    ) -> Result<MultiLevelResult, DetectionError> {
        let started = Instant::now();

        validate_documents(documents)?;
        validate_threshold("strict_threshold", strict_threshold)?;
        validate_threshold("moderate_threshold", moderate_threshold)?;

        log::info!(
            "Starting multi-level analysis of {} texts (model={}, strict={}, moderate={})",
            documents.len(),
            model_key,
            strict_threshold,
            moderate_threshold
        );

        let matrix = self.similarity_matrix(documents, model_key)?;
        let strict = find_pairs(&matrix, strict_threshold)?;
        let moderate = find_pairs(&matrix, moderate_threshold)?;

        let high_confidence = self.with_previews(&strict, documents);
        let moderate_confidence = self.with_previews(&moderate, documents);
        let metadata = analysis_metadata(&matrix, model_key, moderate_threshold, started);

        log::info!(
            "Multi-level analysis completed in {:.2}s: {} high, {} moderate",
            metadata.execution_time,
            high_confidence.len(),
            moderate_confidence.len()
        );

        Ok(MultiLevelResult {
            high_confidence,
            moderate_confidence,
            similarity_matrix: matrix,
            strict_threshold,
            metadata,
        })
    }

    /// Score two texts against each other and classify the result.
    ///
    /// Both bands are evaluated independently, so a highly similar pair is
    /// also moderately similar.
    pub fn compare_two_documents(
        &self,
        text_a: &str,
        text_b: &str,
        model_key: &str,
    ) -> Result<SimilarityReport, DetectionError> {
        let started = Instant::now();

        if text_a.trim().is_empty() || text_b.trim().is_empty() {
            return Err(DetectionError::validation("both texts must be non-empty"));
        }

        log::info!("Comparing two texts (model={})", model_key);

        let documents = [text_a.to_string(), text_b.to_string()];
        let matrix = self.similarity_matrix(&documents, model_key)?;
        let score = matrix.get(0, 1);

        Ok(SimilarityReport {
            similarity_score: score,
            is_highly_similar: score >= HIGH_SIMILARITY_BAND,
            is_moderately_similar: score >= MODERATE_SIMILARITY_BAND,
            text1_preview: text_preview(text_a, self.options.preview_length),
            text2_preview: text_preview(text_b, self.options.preview_length),
            model_used: model_key.to_string(),
            analysis_time: started.elapsed().as_secs_f64(),
        })
    }

    /// Embed all documents in one batch and build the similarity matrix.
    fn similarity_matrix(
        &self,
        documents: &[String],
        model_key: &str,
    ) -> Result<SimilarityMatrix, DetectionError> {
        let inputs: Cow<[String]> = match &self.options.preprocessing {
            Some(options) => Cow::Owned(preprocess_texts(documents, options)),
            None => Cow::Borrowed(documents),
        };

        let vectors = self.provider.embed(&inputs, model_key)?;

        if vectors.len() != documents.len() {
            return Err(EmbeddingError::EmbeddingFailed(format!(
                "provider returned {} embeddings for {} texts",
                vectors.len(),
                documents.len()
            ))
            .into());
        }

        check_normalized(&vectors, self.options.normalization_tolerance)?;
        Ok(compute_matrix(&vectors)?)
    }

    fn with_previews(&self, pairs: &[SimilarPair], documents: &[String]) -> Vec<PreviewPair> {
        let length = self.options.preview_length;
        pairs
            .iter()
            .map(|pair| PreviewPair {
                pair: *pair,
                text_a_preview: text_preview(&documents[pair.index_a], length),
                text_b_preview: text_preview(&documents[pair.index_b], length),
            })
            .collect()
    }
}

fn validate_documents(documents: &[String]) -> Result<(), DetectionError> {
    if documents.is_empty() {
        return Err(DetectionError::validation("no texts provided for analysis"));
    }
    Ok(())
}

fn validate_threshold(name: &str, value: f32) -> Result<(), DetectionError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(DetectionError::validation(format!(
            "{name} must be between 0.0 and 1.0, got {value}"
        )));
    }
    Ok(())
}

fn analysis_metadata(
    matrix: &SimilarityMatrix,
    model_key: &str,
    threshold: f32,
    started: Instant,
) -> AnalysisMetadata {
    let n = matrix.len();
    AnalysisMetadata {
        model_used: model_key.to_string(),
        threshold_used: threshold,
        total_comparisons: n * n.saturating_sub(1) / 2,
        similarity_stats: compute_statistics(matrix),
        execution_time: started.elapsed().as_secs_f64(),
    }
}
