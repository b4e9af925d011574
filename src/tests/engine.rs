//! End-to-end flow through the `Kindred` facade: embed, search, cluster,
//! persist.

use std::sync::Arc;

use crate::cache::MemoryCache;
use crate::cluster::RunOutcome;
use crate::config::KindredConfig;
use crate::engine::Kindred;
use crate::search::Candidate;
use crate::store::{ExperienceRecord, MemoryStore, RecordStore};
use crate::tests::support::{FailingGenerator, JsonGenerator, StubProvider};

fn seeded_config() -> KindredConfig {
    let mut config = KindredConfig::default();
    config.search.min_score = 0.0;
    config.clustering.seed = Some(42);
    config
}

fn provider() -> Arc<StubProvider> {
    Arc::new(StubProvider::new(&[
        // Query texts.
        ("quiet mornings", vec![1.0, 0.0, 0.0]),
        // Two tight themes: outdoors (x-axis) and kitchen (z-axis).
        ("sunrise hike above the fog", vec![1.0, 0.05, 0.0]),
        ("a long walk at dawn", vec![0.95, 0.1, 0.05]),
        ("morning run by the river", vec![1.0, 0.0, 0.1]),
        ("sourdough finally worked", vec![0.0, 0.05, 1.0]),
        ("cooking for my parents", vec![0.05, 0.1, 0.95]),
        ("burnt the holiday roast", vec![0.1, 0.0, 1.0]),
    ]))
}

fn records() -> Vec<ExperienceRecord> {
    vec![
        ExperienceRecord::new("exp-1", "sunrise hike above the fog"),
        ExperienceRecord::new("exp-2", "a long walk at dawn"),
        ExperienceRecord::new("exp-3", "morning run by the river"),
        ExperienceRecord::new("exp-4", "sourdough finally worked"),
        ExperienceRecord::new("exp-5", "cooking for my parents"),
        ExperienceRecord::new("exp-6", "burnt the holiday roast"),
    ]
}

fn candidates() -> Vec<Candidate> {
    records()
        .into_iter()
        .map(|record| Candidate::new(record.id, record.text))
        .collect()
}

#[test]
fn test_rank_through_facade() {
    let provider = provider();
    let store = Arc::new(MemoryStore::with_records(records()));
    let kindred = Kindred::new(
        seeded_config(),
        provider,
        Arc::new(JsonGenerator::default()),
        store,
        Arc::new(MemoryCache::new()),
    );

    let hits = kindred.rank("quiet mornings", &candidates()).unwrap();

    assert_eq!(hits.len(), 6);
    // Outdoor experiences align with the query direction.
    assert!(["exp-1", "exp-2", "exp-3"].contains(&hits[0].id.as_str()));
    for pair in hits.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[test]
fn test_search_reuses_cached_embeddings() {
    let provider = provider();
    let store = Arc::new(MemoryStore::with_records(records()));
    let kindred = Kindred::new(
        seeded_config(),
        provider.clone(),
        Arc::new(JsonGenerator::default()),
        store,
        Arc::new(MemoryCache::new()),
    );

    kindred.rank("quiet mornings", &candidates()).unwrap();
    let calls_after_first = provider.calls();

    kindred.rank("quiet mornings", &candidates()).unwrap();
    assert_eq!(provider.calls(), calls_after_first);
}

#[test]
fn test_kmeans_full_flow() {
    let provider = provider();
    let store = Arc::new(MemoryStore::with_records(records()));
    let kindred = Kindred::new(
        seeded_config(),
        provider,
        Arc::new(JsonGenerator::default()),
        store.clone(),
        Arc::new(MemoryCache::new()),
    );

    let run = kindred.kmeans(2).unwrap();

    assert!(matches!(run.outcome, RunOutcome::Converged { .. }));
    assert_eq!(run.clusters.len(), 2);
    for cluster in &run.clusters {
        assert_eq!(cluster.name, "Shared moments");
        assert_eq!(cluster.members.len(), 3);
    }

    // The run replaced the stored clusters for its parameter key.
    let stored = store.clusters_for(&run.params_key).unwrap();
    assert_eq!(stored, run.clusters);
}

#[test]
fn test_clustering_survives_label_outage() {
    let provider = provider();
    let store = Arc::new(MemoryStore::with_records(records()));
    let kindred = Kindred::new(
        seeded_config(),
        provider,
        Arc::new(FailingGenerator),
        store,
        Arc::new(MemoryCache::new()),
    );

    let run = kindred.kmeans(2).unwrap();
    assert_eq!(run.clusters.len(), 2);
    assert_ne!(run.clusters[0].name, run.clusters[1].name);
    for cluster in &run.clusters {
        assert!(cluster.name.starts_with("Theme "));
        assert!(!cluster.description.is_empty());
    }
}

#[test]
fn test_hierarchical_through_facade() {
    let provider = provider();
    let store = Arc::new(MemoryStore::with_records(records()));
    let mut config = seeded_config();
    config.clustering.merge_threshold = 0.9;
    let kindred = Kindred::new(
        config,
        provider,
        Arc::new(JsonGenerator::default()),
        store,
        Arc::new(MemoryCache::new()),
    );

    let run = kindred.hierarchical().unwrap();

    assert_eq!(run.clusters.len(), 2);
    assert!(matches!(run.outcome, RunOutcome::ThresholdReached { .. }));
}

#[test]
fn test_find_similar_excludes_reference() {
    let provider = provider();
    let store = Arc::new(MemoryStore::with_records(records()));
    let kindred = Kindred::new(
        seeded_config(),
        provider,
        Arc::new(JsonGenerator::default()),
        store,
        Arc::new(MemoryCache::new()),
    );

    let reference = Candidate::new("exp-1", "sunrise hike above the fog");
    let hits = kindred.find_similar_to(&reference, &candidates()).unwrap();

    assert_eq!(hits.len(), 5);
    assert!(hits.iter().all(|hit| hit.id != "exp-1"));
}

#[test]
fn test_hybrid_rank_through_facade() {
    let provider = provider();
    provider.insert("sourdough", vec![0.2, 0.0, 0.98]);
    let store = Arc::new(MemoryStore::with_records(records()));
    let kindred = Kindred::new(
        seeded_config(),
        provider,
        Arc::new(JsonGenerator::default()),
        store,
        Arc::new(MemoryCache::new()),
    );

    let hits = kindred.hybrid_rank("sourdough", &candidates()).unwrap();

    // The lexical component lifts the literal match to the top even
    // though its stub vector is not the semantically closest.
    assert_eq!(hits[0].id, "exp-4");
}

#[test]
fn test_cache_cleanup_through_facade() {
    let provider = provider();
    let store = Arc::new(MemoryStore::with_records(records()));
    let kindred = Kindred::new(
        seeded_config(),
        provider,
        Arc::new(JsonGenerator::default()),
        store,
        Arc::new(MemoryCache::new()),
    );

    // Nothing cached yet, nothing to purge.
    assert_eq!(kindred.cleanup_cache(), 0);

    kindred.rank("quiet mornings", &candidates()).unwrap();
    // Fresh entries are not purged.
    assert_eq!(kindred.cleanup_cache(), 0);
}
