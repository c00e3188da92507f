use serde::Serialize;

use crate::similarity::{SimilarPair, SimilarityMatrix, SimilarityStatistics};

/// A reported pair with previews of both documents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewPair {
    #[serde(flatten)]
    pub pair: SimilarPair,
    #[serde(rename = "text_1_preview")]
    pub text_a_preview: String,
    #[serde(rename = "text_2_preview")]
    pub text_b_preview: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisMetadata {
    pub model_used: String,
    pub threshold_used: f32,
    /// Always N*(N-1)/2, regardless of how many pairs matched.
    pub total_comparisons: usize,
    /// Wall-clock seconds for the whole call.
    pub execution_time: f64,
    pub similarity_stats: SimilarityStatistics,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub similarity_matrix: SimilarityMatrix,
    pub pairs: Vec<PreviewPair>,
    pub metadata: AnalysisMetadata,
}

/// Pairs at two confidence tiers computed from one shared matrix.
#[derive(Debug, Clone, Serialize)]
pub struct MultiLevelResult {
    #[serde(rename = "high_confidence_plagiarism")]
    pub high_confidence: Vec<PreviewPair>,
    #[serde(rename = "moderate_confidence_plagiarism")]
    pub moderate_confidence: Vec<PreviewPair>,
    pub similarity_matrix: SimilarityMatrix,
    pub strict_threshold: f32,
    /// `threshold_used` holds the moderate threshold.
    pub metadata: AnalysisMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityReport {
    pub similarity_score: f32,
    pub is_highly_similar: bool,
    pub is_moderately_similar: bool,
    pub text1_preview: String,
    pub text2_preview: String,
    pub model_used: String,
    pub analysis_time: f64,
}
