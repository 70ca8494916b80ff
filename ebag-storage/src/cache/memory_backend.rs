//! In-process cache store.
//!
//! Entries carry an optional deadline and expire lazily: a read that finds
//! an elapsed entry removes it and reports a miss. [`InMemoryCacheStore::purge_expired`]
//! sweeps the whole map for callers that want to reclaim memory eagerly.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use ebag_core::CacheError;

use super::traits::{CacheStats, CacheStore};

#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: Vec<u8>, ttl: Option<Duration>) -> Self {
        let now = Instant::now();
        Self {
            value,
            // A TTL too large to represent never expires.
            expires_at: ttl.and_then(|ttl| now.checked_add(ttl)),
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: u64,
    misses: u64,
    expirations: u64,
}

/// Cache store backed by a `HashMap` behind a `RwLock`.
///
/// Cloning shares the underlying map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCacheStore {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
    counters: Arc<RwLock<Counters>>,
}

fn poisoned() -> CacheError {
    CacheError::Unavailable {
        reason: "in-memory cache lock poisoned".to_string(),
    }
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries held, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> Result<usize, CacheError> {
        let now = Instant::now();
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        let purged = before - entries.len();
        drop(entries);

        if purged > 0 {
            if let Ok(mut counters) = self.counters.write() {
                counters.expirations += purged as u64;
            }
            tracing::debug!(purged, "purged expired cache entries");
        }
        Ok(purged)
    }

    fn record(&self, update: impl FnOnce(&mut Counters)) {
        if let Ok(mut counters) = self.counters.write() {
            update(&mut counters);
        }
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let now = Instant::now();
        {
            let entries = self.entries.read().map_err(|_| poisoned())?;
            match entries.get(key) {
                Some(entry) if !entry.is_expired(now) => {
                    let value = entry.value.clone();
                    drop(entries);
                    self.record(|c| c.hits += 1);
                    return Ok(Some(value));
                }
                Some(_) => {}
                None => {
                    drop(entries);
                    self.record(|c| c.misses += 1);
                    return Ok(None);
                }
            }
        }

        // Expired: drop it unless a writer replaced it in the meantime.
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        let removed = match entries.get(key) {
            Some(entry) if entry.is_expired(now) => entries.remove(key).is_some(),
            _ => false,
        };
        drop(entries);
        self.record(|c| {
            c.misses += 1;
            if removed {
                c.expirations += 1;
            }
        });
        Ok(None)
    }

    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<bool, CacheError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.insert(key.to_string(), Entry::new(value, ttl));
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        Ok(entries.remove(key).is_some())
    }

    async fn stats(&self) -> Result<CacheStats, CacheError> {
        let (entry_count, memory_bytes) = {
            let entries = self.entries.read().map_err(|_| poisoned())?;
            let bytes: usize = entries.iter().map(|(k, e)| k.len() + e.value.len()).sum();
            (entries.len() as u64, bytes as u64)
        };
        let counters = self.counters.read().map_err(|_| poisoned())?;
        Ok(CacheStats {
            hits: counters.hits,
            misses: counters.misses,
            entry_count,
            memory_bytes,
            expirations: counters.expirations,
        })
    }
}
