//! Cosine ranking of candidates against a query or reference item.

use crate::math;

use super::{highlight, sort_hits, Candidate, SearchError, SearchHit, SimilaritySearch};

impl SimilaritySearch {
    /// Rank candidates against a free-text query.
    ///
    /// The query is embedded once; candidates are embedded on demand
    /// through the gateway. Results below `min_score` are dropped, the
    /// rest are sorted by score descending and truncated to `top_k`.
    ///
    /// An empty candidate list is a valid input and yields an empty
    /// result. A query that embeds to a zero vector scores 0 against
    /// everything via the zero-norm rule.
    pub fn rank(
        &self,
        query: &str,
        candidates: &[Candidate],
        top_k: usize,
        min_score: f32,
    ) -> Result<Vec<SearchHit>, SearchError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self.gateway.embed(query)?;
        let texts: Vec<String> = candidates.iter().map(|c| c.text.clone()).collect();
        let vectors = self.gateway.embed_many(&texts)?;

        let mut hits = Vec::new();
        for (candidate, vector) in candidates.iter().zip(&vectors) {
            let score = math::cosine_similarity(&query_vector, vector)?;
            if score >= min_score {
                hits.push(SearchHit {
                    id: candidate.id.clone(),
                    score,
                    highlights: Vec::new(),
                });
            }
        }

        sort_hits(&mut hits);
        hits.truncate(top_k);
        self.attach_highlights(query, candidates, &mut hits);
        Ok(hits)
    }

    /// Rank candidates against a reference item instead of a free query.
    ///
    /// With `exclude_self`, candidates sharing the reference's id are
    /// dropped before ranking.
    pub fn find_similar_to(
        &self,
        reference: &Candidate,
        candidates: &[Candidate],
        min_score: f32,
        top_k: usize,
        exclude_self: bool,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let pool: Vec<Candidate> = candidates
            .iter()
            .filter(|candidate| !(exclude_self && candidate.id == reference.id))
            .cloned()
            .collect();

        self.rank(&reference.text, &pool, top_k, min_score)
    }

    /// Fill in snippet highlights for the hits that made the cut.
    pub(super) fn attach_highlights(
        &self,
        query: &str,
        candidates: &[Candidate],
        hits: &mut [SearchHit],
    ) {
        for hit in hits {
            if let Some(candidate) = candidates.iter().find(|c| c.id == hit.id) {
                hit.highlights = highlight(query, &candidate.text, self.max_highlights);
            }
        }
    }
}
