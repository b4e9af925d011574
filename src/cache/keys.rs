//! Deterministic cache-key builders.
//!
//! The same logical input always produces the same key, across call order
//! and process restarts, so keys are derived from SHA-256 content hashes
//! rather than any in-memory hasher state or counter.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of the given text.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

/// Key for a cached embedding vector of `text` under `model`.
pub fn embedding_key(text: &str, model: &str) -> String {
    format!("embedding:{model}:{}", content_hash(text))
}

/// Key for a cached analysis result (e.g. a clustering run) scoped to a
/// user and analysis type, over a hash of the analysis input.
pub fn analysis_key(user_id: &str, analysis_type: &str, payload_hash: &str) -> String {
    format!("analysis:{user_id}:{analysis_type}:{payload_hash}")
}

/// Key for a cached search. Filters are sorted first so the key does not
/// depend on the order the caller assembled them in.
pub fn search_key(query: &str, filters: &[String]) -> String {
    let mut sorted = filters.to_vec();
    sorted.sort();
    format!(
        "search:{}:{}",
        content_hash(query),
        content_hash(&sorted.join("\n"))
    )
}
