//! Cache-aside gateway in front of the embedding provider.
//!
//! Every embed call checks the cache first. Provider failures propagate
//! as [`EmbeddingError::Unavailable`]; cache failures never do.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::{keys, Cache};

use super::{EmbeddingError, EmbeddingProvider};

/// Default TTL for cached embeddings. Embeddings are deterministic
/// functions of (text, model), so entries live effectively forever
/// relative to typical cache horizons.
pub const DEFAULT_EMBEDDING_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

pub struct EmbeddingGateway {
    provider: Arc<dyn EmbeddingProvider>,
    cache: Cache,
    model: String,
    ttl: Duration,
}

impl EmbeddingGateway {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        cache: Cache,
        model: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            provider,
            cache,
            model: model.into(),
            ttl,
        }
    }

    /// The model name every embedding is produced under.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Embed one text, consulting the cache first.
    pub fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let key = keys::embedding_key(text, &self.model);
        if let Some(vector) = self.cache.get::<Vec<f32>>(&key) {
            return Ok(vector);
        }

        let vector = self.provider.embed_one(text, &self.model)?;
        self.cache.set(&key, &vector, self.ttl);
        Ok(vector)
    }

    /// Embed a batch. Only cache misses reach the provider; the returned
    /// list has the same length and order as `texts`.
    pub fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut vectors: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());
        let mut missing: Vec<usize> = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            let key = keys::embedding_key(text, &self.model);
            match self.cache.get::<Vec<f32>>(&key) {
                Some(vector) => vectors.push(Some(vector)),
                None => {
                    vectors.push(None);
                    missing.push(i);
                }
            }
        }

        if !missing.is_empty() {
            log::debug!(
                "embedding batch: {} cached, {} to fetch",
                texts.len() - missing.len(),
                missing.len()
            );
            let batch: Vec<String> = missing.iter().map(|&i| texts[i].clone()).collect();
            let fresh = self.provider.embed_many(&batch, &self.model)?;
            if fresh.len() != batch.len() {
                return Err(EmbeddingError::Unavailable(format!(
                    "provider returned {} vectors for {} inputs",
                    fresh.len(),
                    batch.len()
                )));
            }

            for (&i, vector) in missing.iter().zip(fresh) {
                let key = keys::embedding_key(&texts[i], &self.model);
                self.cache.set(&key, &vector, self.ttl);
                vectors[i] = Some(vector);
            }
        }

        // Every slot is filled: cached up front or fetched just now.
        Ok(vectors.into_iter().flatten().collect())
    }
}
