//! TTL key/value cache that keeps redundant collaborator calls off the wire.
//!
//! - `backend`: the raw key/value trait and the in-memory implementation
//! - `keys`: deterministic cache-key builders
//!
//! Caching is a performance optimization, never a correctness dependency:
//! a backend failure on read degrades to a miss (callers recompute) and a
//! failure on write is logged and swallowed.

mod backend;
pub mod keys;

pub use backend::{CacheBackend, CacheEntry, CacheError, MemoryCache};

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Cache-aside wrapper over a [`CacheBackend`].
///
/// Expiry policy lives here: the backend stores rows as-is, and a read
/// that finds an expired row treats it as a miss and deletes it.
#[derive(Clone)]
pub struct Cache {
    backend: Arc<dyn CacheBackend>,
}

impl Cache {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    /// Typed read. Returns `None` on a miss, an expired entry (deleted as
    /// a side effect), a backend failure, or an undecodable payload.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entry = match self.backend.get(key) {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(err) => {
                log::warn!("cache read failed for {key}: {err}");
                return None;
            }
        };

        if entry.expires_at <= Utc::now() {
            // Lazy expiry: the read that finds a stale row removes it.
            self.delete(key);
            return None;
        }

        match serde_json::from_value(entry.value) {
            Ok(value) => Some(value),
            Err(err) => {
                log::warn!("cache entry for {key} failed to decode: {err}");
                None
            }
        }
    }

    /// Upsert. Last write wins and overwrites any existing TTL.
    pub fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(err) => {
                log::warn!("cache entry for {key} failed to encode: {err}");
                return;
            }
        };

        let entry = CacheEntry {
            value,
            expires_at: expiry(ttl),
        };
        if let Err(err) = self.backend.set(key, entry) {
            log::warn!("cache write failed for {key}: {err}");
        }
    }

    pub fn delete(&self, key: &str) {
        if let Err(err) = self.backend.delete(key) {
            log::warn!("cache delete failed for {key}: {err}");
        }
    }

    /// Bulk-delete expired rows. Intended to run periodically out-of-band;
    /// it only touches rows whose expiry has already passed, so it can
    /// safely race concurrent `set`s.
    pub fn cleanup(&self) -> usize {
        match self.backend.cleanup() {
            Ok(purged) => {
                if purged > 0 {
                    log::debug!("cache cleanup purged {purged} expired entries");
                }
                purged
            }
            Err(err) => {
                log::warn!("cache cleanup failed: {err}");
                0
            }
        }
    }
}

fn expiry(ttl: Duration) -> DateTime<Utc> {
    let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
    Utc::now()
        .checked_add_signed(ttl)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
