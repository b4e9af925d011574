//! Similarity search over embedded candidates.
//!
//! - `rank`: cosine ranking with a score floor and top-k truncation
//! - `hybrid`: weighted keyword + semantic scoring
//! - `highlight`: sentence extraction for result snippets

mod highlight;
mod hybrid;
mod rank;

pub use highlight::highlight;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::embedding::{EmbeddingError, EmbeddingGateway};
use crate::math::MathError;

/// A searchable item: an id plus the text to embed and match against.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub id: String,
    pub text: String,
}

impl Candidate {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// One ranked result. Result lists are always sorted by score descending;
/// ties keep input order, so repeated calls agree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub score: f32,
    pub highlights: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Math(#[from] MathError),
}

/// Ranks candidates against queries or reference items.
///
/// Query and candidate embeddings go through the gateway, so repeated
/// searches over the same texts stay off the provider.
pub struct SimilaritySearch {
    gateway: Arc<EmbeddingGateway>,
    max_highlights: usize,
}

impl SimilaritySearch {
    pub fn new(gateway: Arc<EmbeddingGateway>, max_highlights: usize) -> Self {
        Self {
            gateway,
            max_highlights,
        }
    }
}

/// Descending by score. `sort_by` is stable, so equal scores keep the
/// order the caller supplied.
fn sort_hits(hits: &mut [SearchHit]) {
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Lowercased whitespace-split query words, shared by the lexical scorer
/// and the highlighter.
fn query_words(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .map(|word| word.to_lowercase())
        .collect()
}
