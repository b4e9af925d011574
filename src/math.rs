//! Pure vector math: cosine similarity and centroids.
//!
//! No I/O and no state. Every comparison requires equal dimensions; a
//! mismatch indicates a model-version mismatch upstream and is never
//! recovered here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MathError {
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("operation requires at least one vector")]
    EmptyInput,
}

/// Cosine similarity between two vectors of equal length.
///
/// Returns 0.0 when either vector has zero norm instead of dividing by
/// zero. Range is [-1, 1]; higher means more similar.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, MathError> {
    if a.len() != b.len() {
        return Err(MathError::DimensionMismatch {
            expected: a.len(),
            got: b.len(),
        });
    }
    Ok(cosine_unchecked(a, b))
}

/// Cosine similarity without the dimension check, for hot loops whose
/// inputs were validated once up front.
pub(crate) fn cosine_unchecked(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have same dimension");

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Element-wise mean of a non-empty set of equal-length vectors.
pub fn centroid(vectors: &[&[f32]]) -> Result<Vec<f32>, MathError> {
    let first = vectors.first().ok_or(MathError::EmptyInput)?;
    let dimensions = first.len();

    let mut mean = vec![0.0f32; dimensions];
    for vector in vectors {
        if vector.len() != dimensions {
            return Err(MathError::DimensionMismatch {
                expected: dimensions,
                got: vector.len(),
            });
        }
        for (slot, value) in mean.iter_mut().zip(vector.iter()) {
            *slot += value;
        }
    }

    let count = vectors.len() as f32;
    for slot in mean.iter_mut() {
        *slot /= count;
    }

    Ok(mean)
}
