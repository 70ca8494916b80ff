//! ebag Storage - cache-aside accessor, cache stores and record-store seam
//!
//! The [`CacheAside`] accessor fronts a system of record with a key-value
//! [`CacheStore`]. The cache is an optimization only: every store or decode
//! failure degrades to a miss, and the supplier stays the source of truth.

pub mod cache;
pub mod records;

pub use cache::{
    map_size_bytes, AccessorStats, CacheAside, CacheConfig, CacheKey, CacheRead, CacheStats,
    CacheStore, Codec, CodecError, FnCodec, InMemoryCacheStore, JsonCodec, LmdbCacheError,
    LmdbCacheStore, ReadSource, MAX_KEY_LEN,
};
pub use records::{InMemoryRecordStore, RecordStore};
