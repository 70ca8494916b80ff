//! LMDB-backed cache store.
//!
//! Uses the heed crate (Rust bindings for LMDB) so cached entries survive a
//! process restart and can be shared by processes on the same host.
//!
//! # Value layout
//!
//! ```text
//! [expires_at: i64 LE, unix millis, 0 = never][payload bytes]
//! ```
//!
//! Expiry is checked on read. An elapsed entry is deleted in a follow-up
//! write transaction and reported as absent.

use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use ebag_core::CacheError;
use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use super::traits::{CacheStats, CacheStore};

const HEADER_LEN: usize = 8;
const NEVER: i64 = 0;

/// Error type for LMDB cache operations.
#[derive(Debug, thiserror::Error)]
pub enum LmdbCacheError {
    /// Failed to open or create the LMDB environment.
    #[error("Failed to open LMDB environment: {0}")]
    EnvOpen(String),

    /// Failed to open the database within the environment.
    #[error("Failed to open database: {0}")]
    DbOpen(String),

    /// Transaction error.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Stored value is shorter than its header.
    #[error("Corrupt entry for key '{0}'")]
    CorruptEntry(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<LmdbCacheError> for CacheError {
    fn from(e: LmdbCacheError) -> Self {
        CacheError::Unavailable {
            reason: e.to_string(),
        }
    }
}

/// `max_size_mb` in bytes, or `None` if that does not fit in `usize`.
pub fn map_size_bytes(max_size_mb: usize) -> Option<usize> {
    max_size_mb.checked_mul(1024 * 1024)
}

fn txn_err(e: heed::Error) -> LmdbCacheError {
    LmdbCacheError::Transaction(e.to_string())
}

/// Compute the stored deadline for a TTL relative to `now_millis`.
fn deadline(now_millis: i64, ttl: Option<Duration>) -> i64 {
    match ttl {
        None => NEVER,
        Some(ttl) => {
            let ttl_millis = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
            now_millis.saturating_add(ttl_millis).max(1)
        }
    }
}

fn encode_entry(expires_at: i64, payload: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(&expires_at.to_le_bytes());
    bytes.extend_from_slice(payload);
    bytes
}

/// Split a stored value into its deadline and payload.
fn decode_entry(bytes: &[u8]) -> Option<(i64, &[u8])> {
    if bytes.len() < HEADER_LEN {
        return None;
    }
    let (header, payload) = bytes.split_at(HEADER_LEN);
    let header: [u8; HEADER_LEN] = header.try_into().ok()?;
    Some((i64::from_le_bytes(header), payload))
}

fn is_expired(expires_at: i64, now_millis: i64) -> bool {
    expires_at != NEVER && now_millis >= expires_at
}

/// LMDB-backed cache store.
///
/// # Example
///
/// ```ignore
/// let store = LmdbCacheStore::new("/var/cache/ebag", 64)?;
/// let cache = CacheAside::with_defaults(Arc::new(store));
/// ```
pub struct LmdbCacheStore {
    /// The LMDB environment.
    env: Env,
    /// The main database (single unnamed database).
    db: Database<Bytes, Bytes>,
    /// Hit, miss and expiration counters.
    stats: Arc<RwLock<CacheStats>>,
}

impl LmdbCacheStore {
    /// Open (or create) an LMDB cache store.
    ///
    /// # Arguments
    ///
    /// * `path` - Directory where LMDB files will be stored
    /// * `max_size_mb` - Maximum size of the database in megabytes
    pub fn new<P: AsRef<Path>>(path: P, max_size_mb: usize) -> Result<Self, LmdbCacheError> {
        let map_size = map_size_bytes(max_size_mb).ok_or_else(|| {
            LmdbCacheError::EnvOpen(format!("map size of {max_size_mb} MB overflows usize"))
        })?;
        std::fs::create_dir_all(&path)?;

        // SAFETY: the environment is opened once per store and the directory
        // is not opened again by this process while the store is alive.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(1)
                .open(path.as_ref())
        }
        .map_err(|e| LmdbCacheError::EnvOpen(e.to_string()))?;

        let mut wtxn = env.write_txn().map_err(txn_err)?;
        let db: Database<Bytes, Bytes> = env
            .create_database(&mut wtxn, None)
            .map_err(|e| LmdbCacheError::DbOpen(e.to_string()))?;
        wtxn.commit().map_err(txn_err)?;

        tracing::info!(path = %path.as_ref().display(), max_size_mb, "opened LMDB cache store");

        Ok(Self {
            env,
            db,
            stats: Arc::new(RwLock::new(CacheStats::default())),
        })
    }

    fn record(&self, update: impl FnOnce(&mut CacheStats)) {
        if let Ok(mut stats) = self.stats.write() {
            update(&mut stats);
        }
    }

    /// Delete `key` if it still holds an expired entry.
    fn remove_if_expired(&self, key: &str, now_millis: i64) -> Result<bool, LmdbCacheError> {
        let mut wtxn = self.env.write_txn().map_err(txn_err)?;
        let expired = match self.db.get(&wtxn, key.as_bytes()).map_err(txn_err)? {
            Some(bytes) => decode_entry(bytes)
                .map(|(expires_at, _)| is_expired(expires_at, now_millis))
                .unwrap_or(true),
            None => false,
        };
        let removed = expired && self.db.delete(&mut wtxn, key.as_bytes()).map_err(txn_err)?;
        wtxn.commit().map_err(txn_err)?;
        Ok(removed)
    }

    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, LmdbCacheError> {
        let now_millis = Utc::now().timestamp_millis();

        let found = {
            let rtxn = self.env.read_txn().map_err(txn_err)?;
            match self.db.get(&rtxn, key.as_bytes()).map_err(txn_err)? {
                None => None,
                Some(bytes) => {
                    let (expires_at, payload) = decode_entry(bytes)
                        .ok_or_else(|| LmdbCacheError::CorruptEntry(key.to_string()))?;
                    Some((expires_at, payload.to_vec()))
                }
            }
        };

        match found {
            None => {
                self.record(|s| s.misses += 1);
                Ok(None)
            }
            Some((expires_at, _)) if is_expired(expires_at, now_millis) => {
                let removed = self.remove_if_expired(key, now_millis)?;
                self.record(|s| {
                    s.misses += 1;
                    if removed {
                        s.expirations += 1;
                    }
                });
                Ok(None)
            }
            Some((_, payload)) => {
                self.record(|s| s.hits += 1);
                Ok(Some(payload))
            }
        }
    }

    fn write(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<(), LmdbCacheError> {
        let entry = encode_entry(deadline(Utc::now().timestamp_millis(), ttl), value);
        let mut wtxn = self.env.write_txn().map_err(txn_err)?;
        self.db
            .put(&mut wtxn, key.as_bytes(), &entry)
            .map_err(txn_err)?;
        wtxn.commit().map_err(txn_err)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, LmdbCacheError> {
        let mut wtxn = self.env.write_txn().map_err(txn_err)?;
        let deleted = self.db.delete(&mut wtxn, key.as_bytes()).map_err(txn_err)?;
        wtxn.commit().map_err(txn_err)?;
        Ok(deleted)
    }

    fn usage(&self) -> Result<(u64, u64), LmdbCacheError> {
        let rtxn = self.env.read_txn().map_err(txn_err)?;
        let mut entries = 0u64;
        let mut bytes = 0u64;
        for item in self.db.iter(&rtxn).map_err(txn_err)? {
            let (key, value) = item.map_err(txn_err)?;
            entries += 1;
            bytes += (key.len() + value.len().saturating_sub(HEADER_LEN)) as u64;
        }
        Ok((entries, bytes))
    }
}

#[async_trait]
impl CacheStore for LmdbCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.read(key)?)
    }

    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<bool, CacheError> {
        self.write(key, &value, ttl)?;
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.remove(key)?)
    }

    async fn stats(&self) -> Result<CacheStats, CacheError> {
        let (entry_count, memory_bytes) = self.usage()?;
        let mut stats = self
            .stats
            .read()
            .map(|s| s.clone())
            .unwrap_or_default();
        stats.entry_count = entry_count;
        stats.memory_bytes = memory_bytes;
        Ok(stats)
    }
}
