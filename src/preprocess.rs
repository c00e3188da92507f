//! Text preprocessing applied before embedding.
//!
//! Optional and independent of the similarity math. Steps, in order:
//! 1. Collapse whitespace
//! 2. Strip URLs
//! 3. Strip email addresses
//! 4. Lowercase (and optionally drop punctuation)
//! 5. Optionally keep only ASCII letters, digits and spaces

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)https?://\S+").unwrap());
static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap()
});
static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+").unwrap());

/// Which preprocessing steps to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreprocessOptions {
    #[serde(default = "default_true")]
    pub remove_urls: bool,
    #[serde(default = "default_true")]
    pub remove_emails: bool,
    #[serde(default = "default_true")]
    pub normalize: bool,
    #[serde(default)]
    pub remove_punctuation: bool,
    /// Drops every non-ASCII character too, so only suits English text.
    #[serde(default)]
    pub remove_special: bool,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            remove_urls: true,
            remove_emails: true,
            normalize: true,
            remove_punctuation: false,
            remove_special: false,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Rough size figures for a text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TextStats {
    pub char_count: usize,
    pub word_count: usize,
    pub sentence_count: usize,
    pub paragraph_count: usize,
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn clean_text(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Lowercase, optionally drop ASCII punctuation, then clean whitespace.
pub fn normalize_text(text: &str, remove_punctuation: bool) -> String {
    let mut text = text.to_lowercase();
    if remove_punctuation {
        text.retain(|c| !c.is_ascii_punctuation());
    }
    clean_text(&text)
}

pub fn remove_urls(text: &str) -> String {
    clean_text(&URL.replace_all(text, ""))
}

pub fn remove_emails(text: &str) -> String {
    clean_text(&EMAIL.replace_all(text, ""))
}

/// Keep only ASCII alphanumerics (and whitespace when `keep_spaces`).
pub fn remove_special_characters(text: &str, keep_spaces: bool) -> String {
    let kept: String = text
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || (keep_spaces && c.is_whitespace()))
        .collect();
    clean_text(&kept)
}

/// Run the configured preprocessing pipeline on one text.
pub fn preprocess_for_similarity(text: &str, options: &PreprocessOptions) -> String {
    let mut processed = clean_text(text);

    if options.remove_urls {
        processed = remove_urls(&processed);
    }
    if options.remove_emails {
        processed = remove_emails(&processed);
    }
    if options.normalize {
        processed = normalize_text(&processed, options.remove_punctuation);
    }
    if options.remove_special {
        processed = remove_special_characters(&processed, true);
    }

    processed
}

pub fn preprocess_texts(texts: &[String], options: &PreprocessOptions) -> Vec<String> {
    texts
        .iter()
        .map(|text| preprocess_for_similarity(text, options))
        .collect()
}

/// Character, word, sentence and paragraph counts.
///
/// Sentences split on runs of `.`, `!`, `?`; paragraphs on blank lines.
pub fn text_stats(text: &str) -> TextStats {
    TextStats {
        char_count: text.chars().count(),
        word_count: text.split_whitespace().count(),
        sentence_count: SENTENCE_END
            .split(text)
            .filter(|s| !s.trim().is_empty())
            .count(),
        paragraph_count: text.split("\n\n").filter(|p| !p.trim().is_empty()).count(),
    }
}
