//! Bounded text previews for reported pairs.

/// Default preview budget in characters.
pub const DEFAULT_PREVIEW_LENGTH: usize = 100;

/// Ellipsis suffix when a preview is truncated
const TRUNCATION_SUFFIX: &str = "...";

/// A word boundary is only used when it falls past this share of the budget.
const WORD_BOUNDARY_RATIO: f64 = 0.8;

/// Build a display preview of at most `max_chars` characters (plus ellipsis).
///
/// The text is trimmed first. Longer texts are cut at `max_chars` characters;
/// if the last space in the cut lies within the final 20% of the budget the
/// preview ends there instead.
pub fn text_preview(text: &str, max_chars: usize) -> String {
    let text = text.trim();

    let cut = match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => byte_index,
        None => return text.to_string(),
    };

    let mut truncated = text[..cut].trim_end();

    if let Some(space) = truncated.rfind(' ') {
        let position = truncated[..space].chars().count();
        if position as f64 > max_chars as f64 * WORD_BOUNDARY_RATIO {
            truncated = &truncated[..space];
        }
    }

    format!("{}{}", truncated, TRUNCATION_SUFFIX)
}
