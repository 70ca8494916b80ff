//! Cache-aside layer.
//!
//! The cache sits beside the system of record and is never authoritative.
//! Callers name the expected value shape with a [`Codec`] and provide a
//! supplier that loads the value on a miss:
//!
//! ```ignore
//! let key = CacheKey::entity("demo", id)?;
//! let demo = cache
//!     .get(&key, &JsonCodec::<Demo>::new(), || records.find_demo_by_id(id))
//!     .await?;
//!
//! let demos = cache
//!     .get(&CacheKey::new("demos")?, &JsonCodec::<Vec<Demo>>::new(), || async {
//!         records.find_demos().await.map(Some)
//!     })
//!     .await?;
//! ```
//!
//! Two stores are provided: [`InMemoryCacheStore`] for a single process and
//! [`LmdbCacheStore`] for a cache that outlives it.

pub mod cache_aside;
pub mod codec;
pub mod key;
pub mod lmdb_backend;
pub mod memory_backend;
pub mod traits;

pub use cache_aside::{AccessorStats, CacheAside, CacheConfig, CacheRead, ReadSource};
pub use codec::{Codec, CodecError, FnCodec, JsonCodec};
pub use key::{CacheKey, MAX_KEY_LEN};
pub use lmdb_backend::{map_size_bytes, LmdbCacheError, LmdbCacheStore};
pub use memory_backend::InMemoryCacheStore;
pub use traits::{CacheStats, CacheStore};
