//! The embedding provider abstraction.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// The provider failed or timed out. Always surfaced to the caller: a
    /// made-up or zero vector would silently corrupt every downstream
    /// similarity computation.
    #[error("embedding provider unavailable: {0}")]
    Unavailable(String),

    #[error("unknown embedding model: {0}")]
    InvalidModel(String),
}

/// Turns text into fixed-length numeric vectors.
///
/// Implementations must be deterministic for identical `(text, model)`
/// pairs; the gateway caches on that assumption.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text.
    fn embed_one(&self, text: &str, model: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Embed a batch. The returned vectors align positionally with
    /// `texts`, whatever order the provider processed them in.
    fn embed_many(&self, texts: &[String], model: &str) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}
