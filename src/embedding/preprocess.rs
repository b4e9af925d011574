//! Text normalization ahead of embedding.
//!
//! Hosts concatenate an experience's title and body, trim, and truncate to
//! a bounded length so provider inputs stay predictable:
//! 1. Trim whitespace
//! 2. Skip if both parts are empty
//! 3. Concatenate with a separator
//! 4. Truncate to max length with ellipsis

/// Maximum content length for embedding input (characters, not tokens)
const MAX_CONTENT_LENGTH: usize = 512;

/// Ellipsis suffix when content is truncated
const TRUNCATION_SUFFIX: &str = "...";

/// Prepare experience text for embedding.
///
/// Returns `None` if both title and body are empty after trimming.
pub fn preprocess_text(title: &str, body: &str) -> Option<String> {
    let title = title.trim();
    let body = body.trim();

    if title.is_empty() && body.is_empty() {
        return None;
    }

    let content = if title.is_empty() {
        body.to_string()
    } else if body.is_empty() {
        title.to_string()
    } else {
        format!("{} - {}", title, body)
    };

    Some(truncate_content(&content))
}

/// Truncate content to MAX_CONTENT_LENGTH, adding ellipsis if truncated.
fn truncate_content(content: &str) -> String {
    if content.len() <= MAX_CONTENT_LENGTH {
        return content.to_string();
    }

    // Truncate by characters so UTF-8 sequences stay intact.
    let max_chars = MAX_CONTENT_LENGTH - TRUNCATION_SUFFIX.len();
    let truncated: String = content.chars().take(max_chars).collect();

    format!("{}{}", truncated, TRUNCATION_SUFFIX)
}
