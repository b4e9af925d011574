//! Persistence for experience records and clustering results.
//!
//! Components receive a store implementation by injection; tests use the
//! in-memory one behind the same trait as production. No module-level
//! arrays, no hidden global state.

mod json;
mod memory;

pub use json::JsonStore;
pub use memory::MemoryStore;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cluster::Cluster;

/// A free-text experience shared on the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceRecord {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl ExperienceRecord {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata: HashMap::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0:?}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Persists experience records and the clusters computed over them.
///
/// Cluster results are replaced wholesale per parameter key: a new run
/// supersedes the previous grouping for the same parameters.
pub trait RecordStore: Send + Sync {
    fn get_all(&self) -> Result<Vec<ExperienceRecord>, StoreError>;

    fn upsert(&self, record: ExperienceRecord) -> Result<(), StoreError>;

    fn delete(&self, id: &str) -> Result<(), StoreError>;

    fn replace_clusters(&self, params_key: &str, clusters: &[Cluster]) -> Result<(), StoreError>;

    fn clusters_for(&self, params_key: &str) -> Result<Vec<Cluster>, StoreError>;
}
