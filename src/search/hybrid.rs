//! Weighted keyword + semantic scoring.
//!
//! The lexical side is intentionally plain: each query word contributes
//! `1/word_count` when it appears as a case-insensitive substring of the
//! candidate text. No stemming and no stopword handling; the semantic
//! side carries the nuance.

use crate::math;

use super::{query_words, sort_hits, Candidate, SearchError, SearchHit, SimilaritySearch};

impl SimilaritySearch {
    /// Rank candidates by a weighted blend of keyword and semantic scores.
    ///
    /// `final = keyword_weight * lexical + semantic_weight * semantic`.
    /// Weights are caller-supplied and not required to sum to 1; keeping
    /// the combined score interpretable is the caller's job.
    pub fn hybrid_rank(
        &self,
        query: &str,
        candidates: &[Candidate],
        keyword_weight: f32,
        semantic_weight: f32,
        top_k: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self.gateway.embed(query)?;
        let texts: Vec<String> = candidates.iter().map(|c| c.text.clone()).collect();
        let vectors = self.gateway.embed_many(&texts)?;

        let words = query_words(query);

        let mut hits = Vec::new();
        for (candidate, vector) in candidates.iter().zip(&vectors) {
            let semantic = math::cosine_similarity(&query_vector, vector)?;
            let lexical = keyword_score(&words, &candidate.text);
            hits.push(SearchHit {
                id: candidate.id.clone(),
                score: keyword_weight * lexical + semantic_weight * semantic,
                highlights: Vec::new(),
            });
        }

        sort_hits(&mut hits);
        hits.truncate(top_k);
        self.attach_highlights(query, candidates, &mut hits);
        Ok(hits)
    }
}

/// Fraction of query words found as substrings of the candidate text.
fn keyword_score(words: &[String], text: &str) -> f32 {
    if words.is_empty() {
        return 0.0;
    }
    let text = text.to_lowercase();
    let matched = words.iter().filter(|word| text.contains(word.as_str())).count();
    matched as f32 / words.len() as f32
}
