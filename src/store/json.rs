//! File-backed store persisting records and cluster runs as JSON.
//!
//! Writes go to a temp file first and are renamed into place, so a crash
//! mid-write never leaves a truncated file behind.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cluster::Cluster;

use super::{ExperienceRecord, RecordStore, StoreError};

pub struct JsonStore {
    records_path: PathBuf,
    clusters_path: PathBuf,
}

impl JsonStore {
    /// Store files live under `dir` as `records.json` and `clusters.json`.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        Ok(Self {
            records_path: dir.join("records.json"),
            clusters_path: dir.join("clusters.json"),
        })
    }

    fn load_records(&self) -> Result<HashMap<String, ExperienceRecord>, StoreError> {
        if !self.records_path.exists() {
            return Ok(HashMap::new());
        }
        let data = fs::read_to_string(&self.records_path)?;
        Ok(serde_json::from_str(&data)?)
    }

    fn save_records(&self, records: &HashMap<String, ExperienceRecord>) -> Result<(), StoreError> {
        write_atomic(&self.records_path, &serde_json::to_vec_pretty(records)?)
    }

    fn load_clusters(&self) -> Result<HashMap<String, Vec<Cluster>>, StoreError> {
        if !self.clusters_path.exists() {
            return Ok(HashMap::new());
        }
        let data = fs::read_to_string(&self.clusters_path)?;
        Ok(serde_json::from_str(&data)?)
    }

    fn save_clusters(&self, clusters: &HashMap<String, Vec<Cluster>>) -> Result<(), StoreError> {
        write_atomic(&self.clusters_path, &serde_json::to_vec_pretty(clusters)?)
    }
}

impl RecordStore for JsonStore {
    fn get_all(&self) -> Result<Vec<ExperienceRecord>, StoreError> {
        let mut records: Vec<ExperienceRecord> = self.load_records()?.into_values().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }

    fn upsert(&self, record: ExperienceRecord) -> Result<(), StoreError> {
        let mut records = self.load_records()?;
        records.insert(record.id.clone(), record);
        self.save_records(&records)
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut records = self.load_records()?;
        if records.remove(id).is_some() {
            self.save_records(&records)?;
        }
        Ok(())
    }

    fn replace_clusters(&self, params_key: &str, clusters: &[Cluster]) -> Result<(), StoreError> {
        let mut all = self.load_clusters()?;
        all.insert(params_key.to_string(), clusters.to_vec());
        self.save_clusters(&all)
    }

    fn clusters_for(&self, params_key: &str) -> Result<Vec<Cluster>, StoreError> {
        Ok(self
            .load_clusters()?
            .get(params_key)
            .cloned()
            .unwrap_or_default())
    }
}

/// Atomic write: temp file, then rename over the target.
fn write_atomic(path: &Path, data: &[u8]) -> Result<(), StoreError> {
    let temp_path = path.with_extension("tmp");

    if let Err(err) = fs::write(&temp_path, data) {
        let _ = fs::remove_file(&temp_path);
        return Err(err.into());
    }

    fs::rename(&temp_path, path)?;
    Ok(())
}
