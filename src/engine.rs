//! Service facade wiring the analytics components together.
//!
//! Collaborators are injected as trait objects: the engine only knows the
//! interfaces it was handed, never which concrete implementation (or
//! test stub) is behind them.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::{Cache, CacheBackend};
use crate::cluster::{ClusterError, ClusteringEngine, ClusteringRun};
use crate::config::KindredConfig;
use crate::embedding::{EmbeddingGateway, EmbeddingProvider};
use crate::label::TextGenerator;
use crate::search::{highlight, Candidate, SearchError, SearchHit, SimilaritySearch};
use crate::store::RecordStore;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Clustering(#[from] ClusterError),

    #[error("unexpected error: {0:?}")]
    Other(#[from] anyhow::Error),
}

pub struct Kindred {
    search: SimilaritySearch,
    clustering: ClusteringEngine,
    cache: Cache,
    config: KindredConfig,
}

impl Kindred {
    pub fn new(
        config: KindredConfig,
        provider: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn TextGenerator>,
        store: Arc<dyn RecordStore>,
        cache_backend: Arc<dyn CacheBackend>,
    ) -> Self {
        let cache = Cache::new(cache_backend);

        let gateway = Arc::new(EmbeddingGateway::new(
            provider,
            cache.clone(),
            config.embedding.model.clone(),
            Duration::from_secs(config.embedding.ttl_secs),
        ));

        let search = SimilaritySearch::new(gateway.clone(), config.search.max_highlights);

        let clustering = ClusteringEngine::new(
            gateway,
            store,
            generator,
            cache.clone(),
            Duration::from_secs(config.clustering.analysis_ttl_secs),
            config.clustering.seed,
        );

        Self {
            search,
            clustering,
            cache,
            config,
        }
    }

    /// Rank candidates against a query with the configured score floor
    /// and result cap.
    pub fn rank(&self, query: &str, candidates: &[Candidate]) -> Result<Vec<SearchHit>, EngineError> {
        Ok(self.search.rank(
            query,
            candidates,
            self.config.search.top_k,
            self.config.search.min_score,
        )?)
    }

    /// Hybrid keyword + semantic ranking with the configured weights.
    pub fn hybrid_rank(
        &self,
        query: &str,
        candidates: &[Candidate],
    ) -> Result<Vec<SearchHit>, EngineError> {
        Ok(self.search.hybrid_rank(
            query,
            candidates,
            self.config.search.keyword_weight,
            self.config.search.semantic_weight,
            self.config.search.top_k,
        )?)
    }

    /// Rank against a reference item, excluding the reference itself.
    pub fn find_similar_to(
        &self,
        reference: &Candidate,
        candidates: &[Candidate],
    ) -> Result<Vec<SearchHit>, EngineError> {
        Ok(self.search.find_similar_to(
            reference,
            candidates,
            self.config.search.min_score,
            self.config.search.top_k,
            true,
        )?)
    }

    /// Snippet highlights for one candidate text.
    pub fn highlight(&self, query: &str, text: &str) -> Vec<String> {
        highlight(query, text, self.config.search.max_highlights)
    }

    /// K-Means over all stored records with the configured iteration
    /// budget.
    pub fn kmeans(&self, k: usize) -> Result<ClusteringRun, EngineError> {
        Ok(self
            .clustering
            .kmeans(k, self.config.clustering.max_iterations)?)
    }

    /// Hierarchical clustering with the configured merge threshold.
    pub fn hierarchical(&self) -> Result<ClusteringRun, EngineError> {
        Ok(self
            .clustering
            .hierarchical(self.config.clustering.merge_threshold)?)
    }

    /// The underlying search component, for callers that need explicit
    /// parameters instead of the configured defaults.
    pub fn search(&self) -> &SimilaritySearch {
        &self.search
    }

    /// The underlying clustering engine.
    pub fn clustering(&self) -> &ClusteringEngine {
        &self.clustering
    }

    /// Purge expired cache rows. Hosts call this from a periodic task.
    pub fn cleanup_cache(&self) -> usize {
        self.cache.cleanup()
    }
}
