//! Thematic clustering over the embedding population.
//!
//! Two partitioning strategies (K-Means and bottom-up agglomerative
//! merging) share labeling and persistence. A run reads a snapshot of all
//! records, partitions their vectors, asks the text-generation
//! collaborator for a name per group, and replaces the previous result
//! set for the same parameters.

mod engine;
mod hierarchical;
mod kmeans;
mod labeling;

pub use engine::{ClusteringEngine, ClusteringRun};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::math::MathError;
use crate::store::StoreError;

/// A member of a cluster, with its similarity to the cluster centroid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterMember {
    pub record_id: String,
    pub similarity: f32,
}

/// A labeled group of records.
///
/// The centroid is always the mean vector of the current members, never
/// independently authored; members are sorted by similarity descending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub centroid: Vec<f32>,
    pub members: Vec<ClusterMember>,
}

/// Terminal state of a partitioning pass. All variants are valid ends,
/// not failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// K-Means stopped early: an iteration produced no reassignments.
    Converged { iterations: usize },
    /// K-Means spent its full iteration budget; the last partition stands.
    MaxIterationsReached,
    /// Agglomerative merging stopped: no remaining pair reaches the
    /// threshold (or one cluster remains).
    ThresholdReached { merges: usize },
}

#[derive(Debug, Error)]
pub enum ClusterError {
    /// Fewer records than requested clusters. Reported, never retried.
    #[error("insufficient data: {got} records for k={needed}")]
    InsufficientData { needed: usize, got: usize },

    #[error("k must be at least 1")]
    InvalidK,

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Math(#[from] MathError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
