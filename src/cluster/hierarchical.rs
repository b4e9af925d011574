//! Bottom-up agglomerative merging by centroid similarity.

use crate::math;

/// A cluster under construction: member indices into the population plus
/// the current centroid.
pub(super) struct Agglomerate {
    pub member_indices: Vec<usize>,
    pub centroid: Vec<f32>,
}

/// Merge singleton clusters until no pair of centroids reaches
/// `merge_threshold`, returning the clusters and the number of merges.
///
/// Each merge recomputes the centroid from the full member set rather
/// than keeping a running average, so repeated merges cannot drift.
pub(super) fn agglomerate(vectors: &[Vec<f32>], merge_threshold: f32) -> (Vec<Agglomerate>, usize) {
    let mut clusters: Vec<Agglomerate> = vectors
        .iter()
        .enumerate()
        .map(|(i, vector)| Agglomerate {
            member_indices: vec![i],
            centroid: vector.clone(),
        })
        .collect();

    let mut merges = 0;
    while clusters.len() > 1 {
        let Some((i, j, similarity)) = closest_pair(&clusters) else {
            break;
        };
        if similarity < merge_threshold {
            break;
        }

        // j > i, so removing j leaves i in place.
        let absorbed = clusters.swap_remove(j);
        clusters[i].member_indices.extend(absorbed.member_indices);

        let members: Vec<&[f32]> = clusters[i]
            .member_indices
            .iter()
            .map(|&index| vectors[index].as_slice())
            .collect();
        // Dimensions were validated at snapshot time; members is non-empty.
        if let Ok(mean) = math::centroid(&members) {
            clusters[i].centroid = mean;
        }

        merges += 1;
    }

    (clusters, merges)
}

/// The pair of clusters with the highest centroid-to-centroid cosine.
fn closest_pair(clusters: &[Agglomerate]) -> Option<(usize, usize, f32)> {
    let mut best: Option<(usize, usize, f32)> = None;

    for i in 0..clusters.len() {
        for j in (i + 1)..clusters.len() {
            let similarity = math::cosine_unchecked(&clusters[i].centroid, &clusters[j].centroid);
            if best.map_or(true, |(_, _, s)| similarity > s) {
                best = Some((i, j, similarity));
            }
        }
    }

    best
}
