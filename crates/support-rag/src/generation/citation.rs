//! Citation construction from the retrieved set

use crate::types::{Citation, RetrievalResult};

/// Citations for every retrieved document, in retrieval order
///
/// Citations come from the known retrieved set only. Generated text is never
/// parsed for source claims, so a hallucinated reference cannot become a source.
pub fn citations_for(result: &RetrievalResult) -> Vec<Citation> {
    result
        .documents()
        .iter()
        .map(Citation::from_scored)
        .collect()
}

/// Truncate an excerpt to at most `max_chars` characters, preferring a word boundary
pub fn truncate_excerpt(text: &str, max_chars: usize) -> String {
    let end = match text.char_indices().nth(max_chars) {
        Some((end, _)) => end,
        None => return text.to_string(),
    };

    // Try to end at a word boundary
    if let Some(pos) = text[..end].rfind(' ') {
        if pos > 0 {
            return format!("{}...", &text[..pos]);
        }
    }

    format!("{}...", &text[..end])
}
