//! Clustering runs: snapshot, partition, label, persist.
//!
//! A run reads all records from the store, embeds them through the
//! gateway, partitions the vectors, labels each group, then caches the
//! result and replaces the store's clusters for the same parameters.
//! Repeating a run with identical parameters inside the cache TTL returns
//! the cached grouping without recomputation.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::cache::{keys, Cache};
use crate::embedding::{EmbeddedRecord, EmbeddingGateway};
use crate::label::TextGenerator;
use crate::math::{self, MathError};
use crate::store::{ExperienceRecord, RecordStore};

use super::hierarchical::agglomerate;
use super::kmeans::kmeans_partition;
use super::labeling::{label_cluster, MAX_SAMPLE_TEXTS};
use super::{Cluster, ClusterError, ClusterMember, RunOutcome};

/// Analysis keys are scoped per user in the host; clustering runs over
/// the whole population, so they share one scope.
const ANALYSIS_SCOPE: &str = "global";

/// A completed clustering run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringRun {
    /// Cache and persistence key derived from the run parameters.
    pub params_key: String,
    pub clusters: Vec<Cluster>,
    pub outcome: RunOutcome,
}

pub struct ClusteringEngine {
    gateway: Arc<EmbeddingGateway>,
    store: Arc<dyn RecordStore>,
    generator: Arc<dyn TextGenerator>,
    cache: Cache,
    analysis_ttl: Duration,
    rng: Mutex<StdRng>,
}

impl ClusteringEngine {
    /// `seed` fixes the RNG for centroid initialization and placeholder
    /// naming; pass `None` for OS entropy.
    pub fn new(
        gateway: Arc<EmbeddingGateway>,
        store: Arc<dyn RecordStore>,
        generator: Arc<dyn TextGenerator>,
        cache: Cache,
        analysis_ttl: Duration,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            gateway,
            store,
            generator,
            cache,
            analysis_ttl,
            rng: Mutex::new(rng),
        }
    }

    /// Partition all stored records into `k` thematic clusters.
    pub fn kmeans(&self, k: usize, max_iterations: usize) -> Result<ClusteringRun, ClusterError> {
        if k == 0 {
            return Err(ClusterError::InvalidK);
        }
        let records = self.snapshot()?;
        if records.len() < k {
            return Err(ClusterError::InsufficientData {
                needed: k,
                got: records.len(),
            });
        }

        let params_key = self.params_key(
            "kmeans",
            &format!("k={k};max_iterations={max_iterations}"),
            &records,
        );
        if let Some(run) = self.cache.get::<ClusteringRun>(&params_key) {
            log::debug!("clustering run {params_key} served from cache");
            return Ok(run);
        }

        let embedded = self.embed_records(records)?;
        let vectors: Vec<Vec<f32>> = embedded.iter().map(|record| record.vector.clone()).collect();
        validate_dimensions(&vectors)?;

        log::debug!("kmeans over {} records, k={k}", embedded.len());
        let partition = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            kmeans_partition(&vectors, k, max_iterations, &mut rng)
        };

        let mut groups: Vec<Vec<usize>> = vec![Vec::new(); k];
        for (record_index, &cluster_index) in partition.assignments.iter().enumerate() {
            groups[cluster_index].push(record_index);
        }

        let clusters = self.build_clusters(&embedded, groups, partition.centroids);
        self.persist(params_key, clusters, partition.outcome)
    }

    /// Merge records bottom-up while any pair of cluster centroids is at
    /// least `merge_threshold` similar.
    pub fn hierarchical(&self, merge_threshold: f32) -> Result<ClusteringRun, ClusterError> {
        let records = self.snapshot()?;

        let params_key = self.params_key(
            "hierarchical",
            &format!("threshold={merge_threshold}"),
            &records,
        );
        if let Some(run) = self.cache.get::<ClusteringRun>(&params_key) {
            log::debug!("clustering run {params_key} served from cache");
            return Ok(run);
        }

        let embedded = self.embed_records(records)?;
        let vectors: Vec<Vec<f32>> = embedded.iter().map(|record| record.vector.clone()).collect();
        validate_dimensions(&vectors)?;

        log::debug!(
            "hierarchical merge over {} records, threshold={merge_threshold}",
            embedded.len()
        );
        let (agglomerates, merges) = agglomerate(&vectors, merge_threshold);

        let mut groups = Vec::with_capacity(agglomerates.len());
        let mut centroids = Vec::with_capacity(agglomerates.len());
        for agglomerate in agglomerates {
            groups.push(agglomerate.member_indices);
            centroids.push(agglomerate.centroid);
        }

        let clusters = self.build_clusters(&embedded, groups, centroids);
        self.persist(params_key, clusters, RunOutcome::ThresholdReached { merges })
    }

    /// Records as of run start, in id order so runs are reproducible
    /// regardless of store iteration order.
    fn snapshot(&self) -> Result<Vec<ExperienceRecord>, ClusterError> {
        let mut records = self.store.get_all()?;
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }

    fn embed_records(
        &self,
        records: Vec<ExperienceRecord>,
    ) -> Result<Vec<EmbeddedRecord>, ClusterError> {
        let texts: Vec<String> = records.iter().map(|record| record.text.clone()).collect();
        let vectors = self.gateway.embed_many(&texts)?;

        Ok(records
            .into_iter()
            .zip(vectors)
            .map(|(record, vector)| EmbeddedRecord {
                id: record.id,
                source_text: record.text,
                vector,
                metadata: record.metadata,
            })
            .collect())
    }

    /// One key per (algorithm, parameters, model, population) combination:
    /// any change to the inputs produces a fresh run instead of a stale
    /// cache hit.
    fn params_key(&self, algorithm: &str, params: &str, records: &[ExperienceRecord]) -> String {
        let mut payload = format!("{algorithm};{params};model={}", self.gateway.model());
        for record in records {
            payload.push_str(&format!(";{}:{}", record.id, keys::content_hash(&record.text)));
        }
        keys::analysis_key(ANALYSIS_SCOPE, "clustering", &keys::content_hash(&payload))
    }

    /// Turn raw groups into labeled clusters. Empty groups are dropped;
    /// members come out sorted by similarity-to-centroid descending.
    fn build_clusters(
        &self,
        embedded: &[EmbeddedRecord],
        groups: Vec<Vec<usize>>,
        centroids: Vec<Vec<f32>>,
    ) -> Vec<Cluster> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let mut clusters = Vec::new();

        for (group, centroid) in groups.into_iter().zip(centroids) {
            if group.is_empty() {
                continue;
            }

            let mut ranked: Vec<(usize, f32)> = group
                .iter()
                .map(|&index| {
                    (
                        index,
                        math::cosine_unchecked(&embedded[index].vector, &centroid),
                    )
                })
                .collect();
            ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

            let samples: Vec<&str> = ranked
                .iter()
                .take(MAX_SAMPLE_TEXTS)
                .map(|&(index, _)| embedded[index].source_text.as_str())
                .collect();

            let index = clusters.len();
            let label = label_cluster(
                self.generator.as_ref(),
                &samples,
                index,
                ranked.len(),
                &mut rng,
            );

            clusters.push(Cluster {
                id: (index + 1) as u32,
                name: label.name,
                description: label.description,
                centroid,
                members: ranked
                    .into_iter()
                    .map(|(member_index, similarity)| ClusterMember {
                        record_id: embedded[member_index].id.clone(),
                        similarity,
                    })
                    .collect(),
            });
        }

        clusters
    }

    fn persist(
        &self,
        params_key: String,
        clusters: Vec<Cluster>,
        outcome: RunOutcome,
    ) -> Result<ClusteringRun, ClusterError> {
        let run = ClusteringRun {
            params_key,
            clusters,
            outcome,
        };

        self.cache.set(&run.params_key, &run, self.analysis_ttl);
        self.store.replace_clusters(&run.params_key, &run.clusters)?;
        log::info!(
            "clustering run {} persisted: {} clusters, outcome {:?}",
            run.params_key,
            run.clusters.len(),
            run.outcome
        );
        Ok(run)
    }
}

fn validate_dimensions(vectors: &[Vec<f32>]) -> Result<(), ClusterError> {
    let Some(first) = vectors.first() else {
        return Ok(());
    };
    for vector in vectors {
        if vector.len() != first.len() {
            return Err(MathError::DimensionMismatch {
                expected: first.len(),
                got: vector.len(),
            }
            .into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::cache::MemoryCache;
    use crate::store::MemoryStore;
    use crate::tests::support::{FailingGenerator, JsonGenerator, StubProvider};

    use super::*;

    /// Six records in two tight directions, with stub vectors per text.
    fn two_theme_fixture() -> (Arc<StubProvider>, Arc<MemoryStore>) {
        let provider = Arc::new(StubProvider::new(&[
            ("hiking the ridge", vec![1.0, 0.05, 0.0]),
            ("a mountain trail", vec![0.95, 0.1, 0.05]),
            ("alpine sunrise walk", vec![1.0, 0.0, 0.1]),
            ("sourdough first loaf", vec![0.0, 0.05, 1.0]),
            ("baking rye bread", vec![0.05, 0.1, 0.95]),
            ("my pastry disaster", vec![0.1, 0.0, 1.0]),
        ]));
        let store = Arc::new(MemoryStore::with_records([
            ExperienceRecord::new("a", "hiking the ridge"),
            ExperienceRecord::new("b", "a mountain trail"),
            ExperienceRecord::new("c", "alpine sunrise walk"),
            ExperienceRecord::new("d", "sourdough first loaf"),
            ExperienceRecord::new("e", "baking rye bread"),
            ExperienceRecord::new("f", "my pastry disaster"),
        ]));
        (provider, store)
    }

    fn engine(
        provider: Arc<StubProvider>,
        store: Arc<MemoryStore>,
        generator: Arc<dyn TextGenerator>,
    ) -> ClusteringEngine {
        let cache = Cache::new(Arc::new(MemoryCache::new()));
        let gateway = Arc::new(EmbeddingGateway::new(
            provider,
            cache.clone(),
            "stub-model",
            Duration::from_secs(3600),
        ));
        ClusteringEngine::new(
            gateway,
            store,
            generator,
            cache,
            Duration::from_secs(3600),
            Some(42),
        )
    }

    #[test]
    fn test_kmeans_insufficient_data() {
        let (provider, store) = two_theme_fixture();
        let engine = engine(provider, store, Arc::new(JsonGenerator::default()));

        let result = engine.kmeans(10, 50);
        assert!(matches!(
            result,
            Err(ClusterError::InsufficientData { needed: 10, got: 6 })
        ));
    }

    #[test]
    fn test_kmeans_zero_k_rejected() {
        let (provider, store) = two_theme_fixture();
        let engine = engine(provider, store, Arc::new(JsonGenerator::default()));

        assert!(matches!(engine.kmeans(0, 50), Err(ClusterError::InvalidK)));
    }

    #[test]
    fn test_kmeans_separates_two_themes() {
        let (provider, store) = two_theme_fixture();
        let engine = engine(provider, store.clone(), Arc::new(JsonGenerator::default()));

        let run = engine.kmeans(2, 50).unwrap();

        assert!(matches!(run.outcome, RunOutcome::Converged { .. }));
        assert_eq!(run.clusters.len(), 2);

        let mut groups: Vec<Vec<String>> = run
            .clusters
            .iter()
            .map(|cluster| {
                let mut ids: Vec<String> = cluster
                    .members
                    .iter()
                    .map(|member| member.record_id.clone())
                    .collect();
                ids.sort();
                ids
            })
            .collect();
        groups.sort();
        assert_eq!(groups[0], vec!["a", "b", "c"]);
        assert_eq!(groups[1], vec!["d", "e", "f"]);

        // Members are sorted by similarity to the centroid.
        for cluster in &run.clusters {
            for pair in cluster.members.windows(2) {
                assert!(pair[0].similarity >= pair[1].similarity);
            }
        }
    }

    #[test]
    fn test_kmeans_persists_to_store() {
        let (provider, store) = two_theme_fixture();
        let engine = engine(provider, store.clone(), Arc::new(JsonGenerator::default()));

        let run = engine.kmeans(2, 50).unwrap();

        let stored = store.clusters_for(&run.params_key).unwrap();
        assert_eq!(stored, run.clusters);
    }

    #[test]
    fn test_repeat_run_served_from_cache() {
        let (provider, store) = two_theme_fixture();
        let generator = Arc::new(JsonGenerator::default());
        let engine = engine(provider, store, generator.clone());

        let first = engine.kmeans(2, 50).unwrap();
        let calls_after_first = generator.calls();

        let second = engine.kmeans(2, 50).unwrap();
        assert_eq!(generator.calls(), calls_after_first);
        assert_eq!(first.clusters, second.clusters);
    }

    #[test]
    fn test_population_change_invalidates_cache_key() {
        let (provider, store) = two_theme_fixture();
        let engine = engine(provider.clone(), store.clone(), Arc::new(JsonGenerator::default()));

        let first = engine.kmeans(2, 50).unwrap();

        provider.insert("kayaking the fjord", vec![0.9, 0.2, 0.0]);
        store
            .upsert(ExperienceRecord::new("g", "kayaking the fjord"))
            .unwrap();

        let second = engine.kmeans(2, 50).unwrap();
        assert_ne!(first.params_key, second.params_key);
    }

    #[test]
    fn test_labeling_failure_never_aborts_run() {
        let (provider, store) = two_theme_fixture();
        let engine = engine(provider, store, Arc::new(FailingGenerator));

        let run = engine.kmeans(2, 50).unwrap();

        assert_eq!(run.clusters.len(), 2);
        for cluster in &run.clusters {
            assert!(!cluster.name.is_empty());
            assert!(!cluster.description.is_empty());
        }
        assert_ne!(run.clusters[0].name, run.clusters[1].name);
    }

    #[test]
    fn test_kmeans_deterministic_with_seed() {
        let (provider_a, store_a) = two_theme_fixture();
        let (provider_b, store_b) = two_theme_fixture();

        let run_a = engine(provider_a, store_a, Arc::new(JsonGenerator::default()))
            .kmeans(3, 50)
            .unwrap();
        let run_b = engine(provider_b, store_b, Arc::new(JsonGenerator::default()))
            .kmeans(3, 50)
            .unwrap();

        assert_eq!(run_a.clusters, run_b.clusters);
        assert_eq!(run_a.outcome, run_b.outcome);
    }

    #[test]
    fn test_hierarchical_high_threshold_keeps_singletons() {
        let provider = Arc::new(StubProvider::new(&[
            ("north", vec![1.0, 0.0, 0.0]),
            ("east", vec![0.0, 1.0, 0.0]),
            ("up", vec![0.0, 0.0, 1.0]),
        ]));
        let store = Arc::new(MemoryStore::with_records([
            ExperienceRecord::new("n", "north"),
            ExperienceRecord::new("e", "east"),
            ExperienceRecord::new("u", "up"),
        ]));
        let engine = engine(provider, store, Arc::new(JsonGenerator::default()));

        let run = engine.hierarchical(0.99).unwrap();

        assert_eq!(run.clusters.len(), 3);
        assert_eq!(run.outcome, RunOutcome::ThresholdReached { merges: 0 });
        for cluster in &run.clusters {
            assert_eq!(cluster.members.len(), 1);
        }
    }

    #[test]
    fn test_hierarchical_merges_themes() {
        let (provider, store) = two_theme_fixture();
        let engine = engine(provider, store, Arc::new(JsonGenerator::default()));

        let run = engine.hierarchical(0.9).unwrap();

        assert_eq!(run.clusters.len(), 2);
        let mut sizes: Vec<usize> = run
            .clusters
            .iter()
            .map(|cluster| cluster.members.len())
            .collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![3, 3]);
    }

    #[test]
    fn test_hierarchical_empty_population() {
        let provider = Arc::new(StubProvider::new(&[]));
        let store = Arc::new(MemoryStore::new());
        let engine = engine(provider, store, Arc::new(JsonGenerator::default()));

        let run = engine.hierarchical(0.5).unwrap();
        assert!(run.clusters.is_empty());
    }

    #[test]
    fn test_new_run_replaces_previous_clusters() {
        let (provider, store) = two_theme_fixture();
        let engine = engine(provider, store.clone(), Arc::new(JsonGenerator::default()));

        let run_k2 = engine.kmeans(2, 50).unwrap();
        let run_k3 = engine.kmeans(3, 50).unwrap();

        // Different parameters, different keys, independent result sets.
        assert_ne!(run_k2.params_key, run_k3.params_key);
        assert_eq!(
            store.clusters_for(&run_k2.params_key).unwrap(),
            run_k2.clusters
        );
        assert_eq!(
            store.clusters_for(&run_k3.params_key).unwrap(),
            run_k3.clusters
        );
    }
}
