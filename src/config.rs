//! Configuration with serde defaults and validation.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default embedding model (bge-base offers +13% accuracy vs MiniLM)
const DEFAULT_MODEL: &str = "bge-base-en-v1.5";
/// Default similarity floor for search results
const DEFAULT_MIN_SCORE: f32 = 0.35;
const DEFAULT_TOP_K: usize = 10;
const DEFAULT_KEYWORD_WEIGHT: f32 = 0.3;
const DEFAULT_SEMANTIC_WEIGHT: f32 = 0.7;
const DEFAULT_MAX_HIGHLIGHTS: usize = 3;
/// Embeddings are pure functions of (text, model); cache them for a month
const DEFAULT_EMBEDDING_TTL_SECS: u64 = 30 * 24 * 60 * 60;
/// Clustering results go stale as records arrive; cache for an hour
const DEFAULT_ANALYSIS_TTL_SECS: u64 = 60 * 60;
const DEFAULT_MAX_ITERATIONS: usize = 50;
const DEFAULT_MERGE_THRESHOLD: f32 = 0.75;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Parse(#[from] serde_yml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model name passed to the embedding provider
    #[serde(default = "default_model")]
    pub model: String,

    /// TTL for cached embedding vectors, in seconds
    #[serde(default = "default_embedding_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            ttl_secs: DEFAULT_EMBEDDING_TTL_SECS,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Minimum similarity score [0.0, 1.0] for results
    #[serde(default = "default_min_score")]
    pub min_score: f32,

    /// Default result count cap
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Lexical weight in hybrid search
    #[serde(default = "default_keyword_weight")]
    pub keyword_weight: f32,

    /// Semantic weight in hybrid search
    #[serde(default = "default_semantic_weight")]
    pub semantic_weight: f32,

    /// Snippet count per result
    #[serde(default = "default_max_highlights")]
    pub max_highlights: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_score: DEFAULT_MIN_SCORE,
            top_k: DEFAULT_TOP_K,
            keyword_weight: DEFAULT_KEYWORD_WEIGHT,
            semantic_weight: DEFAULT_SEMANTIC_WEIGHT,
            max_highlights: DEFAULT_MAX_HIGHLIGHTS,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClusteringConfig {
    /// Iteration budget for K-Means
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Centroid similarity floor for hierarchical merging [-1.0, 1.0]
    #[serde(default = "default_merge_threshold")]
    pub merge_threshold: f32,

    /// TTL for cached clustering runs, in seconds
    #[serde(default = "default_analysis_ttl_secs")]
    pub analysis_ttl_secs: u64,

    /// Fixed RNG seed for reproducible runs; None draws from OS entropy
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            merge_threshold: DEFAULT_MERGE_THRESHOLD,
            analysis_ttl_secs: DEFAULT_ANALYSIS_TTL_SECS,
            seed: None,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct KindredConfig {
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub clustering: ClusteringConfig,
}

impl KindredConfig {
    /// Load and validate a YAML config file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_yml::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.embedding.model.trim().is_empty() {
            return Err(ConfigError::Invalid("embedding.model must be set".into()));
        }
        if !(0.0..=1.0).contains(&self.search.min_score) {
            return Err(ConfigError::Invalid(format!(
                "search.min_score must be between 0.0 and 1.0, got {}",
                self.search.min_score
            )));
        }
        if self.search.keyword_weight < 0.0 || self.search.semantic_weight < 0.0 {
            return Err(ConfigError::Invalid(
                "search weights must be non-negative".into(),
            ));
        }
        if self.clustering.max_iterations == 0 {
            return Err(ConfigError::Invalid(
                "clustering.max_iterations must be at least 1".into(),
            ));
        }
        if !(-1.0..=1.0).contains(&self.clustering.merge_threshold) {
            return Err(ConfigError::Invalid(format!(
                "clustering.merge_threshold must be between -1.0 and 1.0, got {}",
                self.clustering.merge_threshold
            )));
        }
        Ok(())
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_min_score() -> f32 {
    DEFAULT_MIN_SCORE
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_keyword_weight() -> f32 {
    DEFAULT_KEYWORD_WEIGHT
}

fn default_semantic_weight() -> f32 {
    DEFAULT_SEMANTIC_WEIGHT
}

fn default_max_highlights() -> usize {
    DEFAULT_MAX_HIGHLIGHTS
}

fn default_embedding_ttl_secs() -> u64 {
    DEFAULT_EMBEDDING_TTL_SECS
}

fn default_analysis_ttl_secs() -> u64 {
    DEFAULT_ANALYSIS_TTL_SECS
}

fn default_max_iterations() -> usize {
    DEFAULT_MAX_ITERATIONS
}

fn default_merge_threshold() -> f32 {
    DEFAULT_MERGE_THRESHOLD
}
