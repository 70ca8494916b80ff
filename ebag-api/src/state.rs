//! Shared application state for Axum routers.

use std::sync::Arc;

use ebag_storage::{
    CacheAside, CacheConfig, CacheStore, InMemoryCacheStore, InMemoryRecordStore, RecordStore,
};

/// Cache-aside accessor over whichever store the server was started with.
pub type ApiCache = CacheAside<dyn CacheStore>;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Cache in front of `records`. Handlers read through it.
    pub cache: ApiCache,
    /// System of record.
    pub records: Arc<dyn RecordStore>,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(
        store: Arc<dyn CacheStore>,
        cache_config: CacheConfig,
        records: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            cache: CacheAside::new(store, cache_config),
            records,
            start_time: std::time::Instant::now(),
        }
    }

    /// In-memory cache over the seeded record store.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryCacheStore::new()),
            CacheConfig::default(),
            Arc::new(InMemoryRecordStore::seeded()),
        )
    }
}
