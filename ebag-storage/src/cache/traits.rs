//! Cache store trait and store statistics.
//!
//! A cache store only ever sees opaque bytes. It keeps no shape information,
//! so every read goes through a caller-supplied [`Codec`](super::Codec).

use std::time::Duration;

use async_trait::async_trait;
use ebag_core::CacheError;

/// Key-value cache store consumed by the cache-aside accessor.
///
/// Implementations must be safe for concurrent use by many callers.
/// Entries written with a TTL must read as absent once it has elapsed.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get the payload stored under `key`, or `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store `value` under `key`, replacing any previous entry.
    ///
    /// `ttl = None` keeps the entry until it is deleted. Returns whether the
    /// store accepted the write.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>)
        -> Result<bool, CacheError>;

    /// Remove the entry under `key`. Returns whether an entry existed.
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;

    /// Get store statistics.
    async fn stats(&self) -> Result<CacheStats, CacheError>;
}

/// Statistics about cache store usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of reads that found a live entry.
    pub hits: u64,
    /// Number of reads that found nothing (including expired entries).
    pub misses: u64,
    /// Number of entries currently in the store.
    pub entry_count: u64,
    /// Approximate payload size in bytes.
    pub memory_bytes: u64,
    /// Number of entries dropped because their TTL elapsed.
    pub expirations: u64,
}

impl CacheStats {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_stats_hit_rate() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            ..Default::default()
        };
        assert!((stats.hit_rate() - 0.8).abs() < 0.001);

        let empty_stats = CacheStats::default();
        assert!((empty_stats.hit_rate() - 0.0).abs() < 0.001);
    }
}
