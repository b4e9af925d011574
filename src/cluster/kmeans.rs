//! K-Means partitioning with cosine similarity.

use rand::rngs::StdRng;
use rand::seq::index::sample;
use rayon::prelude::*;

use crate::math;

use super::RunOutcome;

/// Raw partition of a vector population, before labeling.
pub(super) struct Partition {
    pub centroids: Vec<Vec<f32>>,
    pub assignments: Vec<usize>,
    pub outcome: RunOutcome,
}

/// Partition `vectors` into `k` groups.
///
/// Centroids start from `k` distinct vectors sampled without replacement
/// from the injected RNG. Assignment ties keep the earlier-indexed
/// centroid; a centroid whose cluster empties retains its previous
/// position. Stops early once an iteration reassigns nothing.
///
/// Callers guarantee `1 <= k <= vectors.len()`, `max_iterations >= 1`,
/// and uniform dimensions.
pub(super) fn kmeans_partition(
    vectors: &[Vec<f32>],
    k: usize,
    max_iterations: usize,
    rng: &mut StdRng,
) -> Partition {
    debug_assert!(k >= 1 && k <= vectors.len());
    debug_assert!(max_iterations >= 1);

    let mut centroids: Vec<Vec<f32>> = sample(rng, vectors.len(), k)
        .into_iter()
        .map(|i| vectors[i].clone())
        .collect();

    let mut assignments: Vec<usize> = Vec::new();
    let mut outcome = RunOutcome::MaxIterationsReached;
    let mut first = true;

    for iteration in 1..=max_iterations {
        let new_assignments: Vec<usize> = vectors
            .par_iter()
            .map(|vector| nearest_centroid(vector, &centroids))
            .collect();

        // The first pass populates assignments; it never counts as a
        // no-reassignment iteration.
        let converged = !first && new_assignments == assignments;
        first = false;
        assignments = new_assignments;

        // Recomputing after a no-change iteration is a no-op, so the
        // update can run unconditionally.
        update_centroids(&mut centroids, vectors, &assignments);

        if converged {
            outcome = RunOutcome::Converged { iterations: iteration };
            break;
        }
    }

    Partition {
        centroids,
        assignments,
        outcome,
    }
}

/// Index of the most cosine-similar centroid. Strictly-greater comparison
/// keeps the earlier index on ties.
fn nearest_centroid(vector: &[f32], centroids: &[Vec<f32>]) -> usize {
    let mut best = 0;
    let mut best_similarity = f32::NEG_INFINITY;

    for (i, centroid) in centroids.iter().enumerate() {
        let similarity = math::cosine_unchecked(vector, centroid);
        if similarity > best_similarity {
            best_similarity = similarity;
            best = i;
        }
    }

    best
}

/// Recompute each centroid as the mean of its members. A cluster with no
/// members keeps its previous centroid rather than becoming undefined.
fn update_centroids(centroids: &mut [Vec<f32>], vectors: &[Vec<f32>], assignments: &[usize]) {
    for (index, centroid) in centroids.iter_mut().enumerate() {
        let members: Vec<&[f32]> = assignments
            .iter()
            .zip(vectors)
            .filter(|(&assigned, _)| assigned == index)
            .map(|(_, vector)| vector.as_slice())
            .collect();

        if members.is_empty() {
            continue;
        }
        // Dimensions were validated at snapshot time.
        if let Ok(mean) = math::centroid(&members) {
            *centroid = mean;
        }
    }
}
