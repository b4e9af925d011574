//! Embedding acquisition: the provider abstraction, concrete providers,
//! and the cache-aside gateway every other component goes through.
//!
//! - `provider`: the `EmbeddingProvider` trait
//! - `gateway`: cache-checked embed / embed-many
//! - `http`: OpenAI-compatible HTTP provider
//! - `local`: fastembed-backed in-process provider (feature `local-model`)
//! - `preprocess`: text normalization ahead of embedding

mod gateway;
pub mod http;
#[cfg(feature = "local-model")]
pub mod local;
pub mod preprocess;
mod provider;

pub use gateway::{EmbeddingGateway, DEFAULT_EMBEDDING_TTL};
pub use http::HttpProvider;
#[cfg(feature = "local-model")]
pub use local::LocalProvider;
pub use provider::{EmbeddingError, EmbeddingProvider};

use std::collections::HashMap;

/// A record paired with its embedding vector.
///
/// Immutable once created: a changed source text means a new record, not
/// a mutation of this one.
#[derive(Debug, Clone)]
pub struct EmbeddedRecord {
    pub id: String,
    pub source_text: String,
    pub vector: Vec<f32>,
    pub metadata: HashMap<String, String>,
}
