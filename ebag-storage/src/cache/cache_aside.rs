//! Cache-aside accessor.
//!
//! [`CacheAside::get`] looks a key up in the cache store, decodes a hit with
//! the caller's codec, and on a miss runs the caller's supplier against the
//! system of record and writes the result back.
//!
//! The cache is never authoritative:
//! - a store read failure or an undecodable payload is handled as a miss
//! - a store write failure is logged and dropped
//! - a supplier failure is returned to the caller unchanged, with no write
//!
//! Concurrent misses on the same key each run their supplier. There is no
//! request coalescing; suppliers must tolerate being invoked more than once.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ebag_core::{CacheError, ConfigError};

use super::codec::{Codec, CodecError};
use super::key::CacheKey;
use super::traits::CacheStore;

/// Environment variable holding the default TTL in seconds (`0` = no expiry).
pub const ENV_CACHE_TTL_SECS: &str = "EBAG_CACHE_TTL_SECS";

/// Environment variable that disables the cache when set to `false` or `0`.
pub const ENV_CACHE_ENABLED: &str = "EBAG_CACHE_ENABLED";

/// Configuration for the cache-aside accessor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// TTL applied by `get` when the caller does not pass one.
    /// `None` keeps entries until they are invalidated.
    pub default_ttl: Option<Duration>,
    /// When false, every read goes straight to the supplier.
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Some(Duration::from_secs(3600)), // 1 hour
            enabled: true,
        }
    }
}

impl CacheConfig {
    /// Create a new cache config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// Keep entries until they are invalidated.
    pub fn without_ttl(mut self) -> Self {
        self.default_ttl = None;
        self
    }

    /// Enable or disable the cache.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Load from environment variables.
    ///
    /// - `EBAG_CACHE_TTL_SECS`: default TTL in seconds, `0` for no expiry
    ///   (default: 3600)
    /// - `EBAG_CACHE_ENABLED`: `true`/`false`, `1`/`0`, `yes`/`no` or `on`/`off`
    ///   (default: true)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup.
    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_CACHE_TTL_SECS) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue {
                    field: ENV_CACHE_TTL_SECS.to_string(),
                    value: raw.clone(),
                    reason: "must be a whole number of seconds".to_string(),
                })?;
            config.default_ttl = if secs == 0 {
                None
            } else {
                Some(Duration::from_secs(secs))
            };
        }

        if let Some(raw) = lookup(ENV_CACHE_ENABLED) {
            config.enabled = match raw.trim().to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => true,
                "false" | "0" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: ENV_CACHE_ENABLED.to_string(),
                        value: raw,
                        reason: "expected true/false, 1/0, yes/no or on/off".to_string(),
                    })
                }
            };
        }

        Ok(config)
    }
}

/// Where a value returned by [`CacheAside::read`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadSource {
    /// Decoded from a live cache entry.
    Cache,
    /// Produced by the supplier.
    Supplier,
}

/// Value returned by [`CacheAside::read`], tagged with its source.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheRead<T> {
    value: T,
    source: ReadSource,
}

impl<T> CacheRead<T> {
    pub fn from_cache(value: T) -> Self {
        Self {
            value,
            source: ReadSource::Cache,
        }
    }

    pub fn from_supplier(value: T) -> Self {
        Self {
            value,
            source: ReadSource::Supplier,
        }
    }

    pub fn source(&self) -> ReadSource {
        self.source
    }

    pub fn was_cache_hit(&self) -> bool {
        self.source == ReadSource::Cache
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

/// Snapshot of accessor counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessorStats {
    /// Reads served from the cache.
    pub hits: u64,
    /// Reads that fell through to the supplier.
    pub misses: u64,
    /// Misses caused by a payload that did not decode.
    pub decode_failures: u64,
    /// Misses caused by the store failing to read.
    pub read_failures: u64,
    /// Values the store accepted.
    pub writes: u64,
    /// Writes that failed to encode, were declined, or errored.
    pub write_failures: u64,
    /// Supplier calls that returned an error.
    pub supplier_failures: u64,
}

impl AccessorStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    decode_failures: AtomicU64,
    read_failures: AtomicU64,
    writes: AtomicU64,
    write_failures: AtomicU64,
    supplier_failures: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> AccessorStats {
        AccessorStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            read_failures: self.read_failures.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            supplier_failures: self.supplier_failures.load(Ordering::Relaxed),
        }
    }
}

/// Typed get-or-compute-and-cache accessor over a [`CacheStore`].
///
/// # Example
///
/// ```ignore
/// let cache = CacheAside::new(Arc::new(InMemoryCacheStore::new()), CacheConfig::default());
///
/// let key = CacheKey::entity("demo", id)?;
/// let demo = cache
///     .get(&key, &JsonCodec::<Demo>::new(), || records.find_demo_by_id(id))
///     .await?;
/// ```
pub struct CacheAside<S: ?Sized> {
    store: Arc<S>,
    config: CacheConfig,
    counters: Arc<Counters>,
}

impl<S: CacheStore + ?Sized> CacheAside<S> {
    /// Create a new accessor.
    pub fn new(store: Arc<S>, config: CacheConfig) -> Self {
        Self {
            store,
            config,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Create a new accessor with default configuration.
    pub fn with_defaults(store: Arc<S>) -> Self {
        Self::new(store, CacheConfig::default())
    }

    /// Get the accessor configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Get a reference to the cache store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the value under `key`, computing and caching it on a miss.
    ///
    /// Uses the configured default TTL for the write. `Ok(None)` means the
    /// supplier found nothing; absent values are never cached.
    pub async fn get<T, C, F, Fut, E>(
        &self,
        key: &CacheKey,
        codec: &C,
        supplier: F,
    ) -> Result<Option<T>, E>
    where
        C: Codec<T> + ?Sized,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        self.get_with_ttl(key, codec, self.config.default_ttl, supplier)
            .await
    }

    /// Like [`get`](Self::get) with an explicit TTL (`None` = no expiry).
    pub async fn get_with_ttl<T, C, F, Fut, E>(
        &self,
        key: &CacheKey,
        codec: &C,
        ttl: Option<Duration>,
        supplier: F,
    ) -> Result<Option<T>, E>
    where
        C: Codec<T> + ?Sized,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        let read = self.read(key, codec, ttl, supplier).await?;
        Ok(read.map(CacheRead::into_value))
    }

    /// Like [`get_with_ttl`](Self::get_with_ttl), but reports whether the
    /// value came from the cache or the supplier.
    pub async fn read<T, C, F, Fut, E>(
        &self,
        key: &CacheKey,
        codec: &C,
        ttl: Option<Duration>,
        supplier: F,
    ) -> Result<Option<CacheRead<T>>, E>
    where
        C: Codec<T> + ?Sized,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        if self.config.enabled {
            if let Some(value) = self.lookup(key, codec).await {
                return Ok(Some(CacheRead::from_cache(value)));
            }
        }

        let fetched = match supplier().await {
            Ok(fetched) => fetched,
            Err(err) => {
                Counters::bump(&self.counters.supplier_failures);
                tracing::debug!(key = %key, "supplier failed; nothing cached");
                return Err(err);
            }
        };

        match fetched {
            Some(value) => {
                if self.config.enabled {
                    self.populate(key, codec, &value, ttl).await;
                }
                Ok(Some(CacheRead::from_supplier(value)))
            }
            None => {
                tracing::debug!(key = %key, "supplier returned no value; nothing cached");
                Ok(None)
            }
        }
    }

    /// Write `value` under `key` with the default TTL.
    ///
    /// Unlike the read path, failures are returned to the caller. A disabled
    /// cache writes nothing and returns `Ok(false)`.
    pub async fn put<T, C>(&self, key: &CacheKey, codec: &C, value: &T) -> Result<bool, CacheError>
    where
        C: Codec<T> + ?Sized,
    {
        if !self.config.enabled {
            return Ok(false);
        }
        let bytes = codec
            .encode(value)
            .map_err(|e| CacheError::Serialization {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        let stored = self
            .store
            .set(key.as_str(), bytes, self.config.default_ttl)
            .await?;
        if stored {
            Counters::bump(&self.counters.writes);
        }
        Ok(stored)
    }

    /// Remove the entry under `key`, e.g. after the record changed.
    pub async fn invalidate(&self, key: &CacheKey) -> Result<bool, CacheError> {
        let removed = self.store.delete(key.as_str()).await?;
        tracing::debug!(key = %key, removed, "cache entry invalidated");
        Ok(removed)
    }

    /// Snapshot of the accessor counters.
    pub fn stats(&self) -> AccessorStats {
        self.counters.snapshot()
    }

    async fn lookup<T, C>(&self, key: &CacheKey, codec: &C) -> Option<T>
    where
        C: Codec<T> + ?Sized,
    {
        match self.store.get(key.as_str()).await {
            Ok(Some(bytes)) => match codec.decode(&bytes) {
                Ok(value) => {
                    Counters::bump(&self.counters.hits);
                    tracing::debug!(key = %key, "cache hit");
                    Some(value)
                }
                Err(err) => {
                    let err = decode_failure(key, &err);
                    Counters::bump(&self.counters.decode_failures);
                    Counters::bump(&self.counters.misses);
                    tracing::warn!(
                        key = %key,
                        error = %err,
                        "cached payload did not decode; treating as miss"
                    );
                    None
                }
            },
            Ok(None) => {
                Counters::bump(&self.counters.misses);
                tracing::debug!(key = %key, "cache miss");
                None
            }
            Err(err) => {
                Counters::bump(&self.counters.read_failures);
                Counters::bump(&self.counters.misses);
                tracing::warn!(
                    key = %key,
                    error = %err,
                    "cache read failed; treating as miss"
                );
                None
            }
        }
    }

    async fn populate<T, C>(&self, key: &CacheKey, codec: &C, value: &T, ttl: Option<Duration>)
    where
        C: Codec<T> + ?Sized,
    {
        let bytes = match codec.encode(value) {
            Ok(bytes) => bytes,
            Err(err) => {
                Counters::bump(&self.counters.write_failures);
                tracing::warn!(key = %key, error = %err, "value did not encode; not cached");
                return;
            }
        };

        match self.store.set(key.as_str(), bytes, ttl).await {
            Ok(true) => {
                Counters::bump(&self.counters.writes);
                tracing::debug!(key = %key, ttl = ?ttl, "cache populated");
            }
            Ok(false) => {
                Counters::bump(&self.counters.write_failures);
                tracing::warn!(key = %key, "cache store declined write");
            }
            Err(err) => {
                Counters::bump(&self.counters.write_failures);
                tracing::warn!(key = %key, error = %err, "cache write failed; value not cached");
            }
        }
    }
}

fn decode_failure(key: &CacheKey, err: &CodecError) -> CacheError {
    CacheError::Deserialization {
        key: key.to_string(),
        reason: err.to_string(),
    }
}

impl<S: ?Sized> Clone for CacheAside<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
            counters: Arc::clone(&self.counters),
        }
    }
}
