//! Sentence-level highlights for search results.

use once_cell::sync::Lazy;
use regex::Regex;

use super::query_words;

static SENTENCE_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]").expect("valid pattern"));

/// Pick the sentences of `text` that best match the query.
///
/// Sentences (split on `.`, `!`, `?`) are scored by how many query words
/// they contain as case-insensitive substrings. Sentences matching no
/// query word are dropped entirely, even when that leaves fewer than
/// `max_highlights` results. Returned sentences are trimmed and ordered
/// by score descending.
pub fn highlight(query: &str, text: &str, max_highlights: usize) -> Vec<String> {
    let words = query_words(query);
    if words.is_empty() || max_highlights == 0 {
        return Vec::new();
    }

    let mut scored: Vec<(usize, String)> = SENTENCE_SPLIT
        .split(text)
        .filter_map(|sentence| {
            let trimmed = sentence.trim();
            if trimmed.is_empty() {
                return None;
            }
            let lower = trimmed.to_lowercase();
            let matches = words.iter().filter(|word| lower.contains(word.as_str())).count();
            (matches > 0).then(|| (matches, trimmed.to_string()))
        })
        .collect();

    // Stable sort: equally-scored sentences keep text order.
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.truncate(max_highlights);
    scored.into_iter().map(|(_, sentence)| sentence).collect()
}
