//! In-memory record store for tests and single-process hosts.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::cluster::Cluster;

use super::{ExperienceRecord, RecordStore, StoreError};

#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, ExperienceRecord>>,
    clusters: Mutex<HashMap<String, Vec<Cluster>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with records.
    pub fn with_records(records: impl IntoIterator<Item = ExperienceRecord>) -> Self {
        let map: HashMap<String, ExperienceRecord> = records
            .into_iter()
            .map(|record| (record.id.clone(), record))
            .collect();
        Self {
            records: Mutex::new(map),
            clusters: Mutex::new(HashMap::new()),
        }
    }

    fn lock<'a, T>(mutex: &'a Mutex<T>) -> Result<MutexGuard<'a, T>, StoreError> {
        mutex
            .lock()
            .map_err(|err| StoreError::Backend(format!("lock poisoned: {err}")))
    }
}

impl RecordStore for MemoryStore {
    /// Records in id order, so snapshot-based consumers see a stable
    /// sequence.
    fn get_all(&self) -> Result<Vec<ExperienceRecord>, StoreError> {
        let mut records: Vec<ExperienceRecord> =
            Self::lock(&self.records)?.values().cloned().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }

    fn upsert(&self, record: ExperienceRecord) -> Result<(), StoreError> {
        Self::lock(&self.records)?.insert(record.id.clone(), record);
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        Self::lock(&self.records)?.remove(id);
        Ok(())
    }

    fn replace_clusters(&self, params_key: &str, clusters: &[Cluster]) -> Result<(), StoreError> {
        Self::lock(&self.clusters)?.insert(params_key.to_string(), clusters.to_vec());
        Ok(())
    }

    fn clusters_for(&self, params_key: &str) -> Result<Vec<Cluster>, StoreError> {
        Ok(Self::lock(&self.clusters)?
            .get(params_key)
            .cloned()
            .unwrap_or_default())
    }
}
