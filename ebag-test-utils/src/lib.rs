//! ebag Test Utilities
//!
//! Shared test infrastructure for the ebag workspace:
//! - Collaborators that fail or count on demand
//! - Proptest generators for entities, keys, callbacks and envelopes
//! - Fixtures for the demo scenario

use std::future::{ready, Ready};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

pub use ebag_core::{
    jsonp, CacheError, CallbackName, Demo, EnvelopeError, ResultEnvelope, StorageError, User,
};
pub use ebag_storage::{
    CacheAside, CacheConfig, CacheKey, CacheStats, CacheStore, InMemoryCacheStore,
    InMemoryRecordStore, JsonCodec, RecordStore,
};

// ============================================================================
// MOCK COLLABORATORS
// ============================================================================

/// Cache store whose every call fails, as if the cache server were down.
#[derive(Debug, Clone, Default)]
pub struct UnavailableCacheStore {
    attempts: Arc<AtomicUsize>,
}

impl UnavailableCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of calls made against the store.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn refuse(&self) -> CacheError {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        CacheError::Unavailable {
            reason: "connection refused".to_string(),
        }
    }
}

#[async_trait]
impl CacheStore for UnavailableCacheStore {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Err(self.refuse())
    }

    async fn set(
        &self,
        _key: &str,
        _value: Vec<u8>,
        _ttl: Option<Duration>,
    ) -> Result<bool, CacheError> {
        Err(self.refuse())
    }

    async fn delete(&self, _key: &str) -> Result<bool, CacheError> {
        Err(self.refuse())
    }

    async fn stats(&self) -> Result<CacheStats, CacheError> {
        Err(self.refuse())
    }
}

/// Counts supplier invocations.
///
/// ```ignore
/// let calls = CallCounter::new();
/// cache.get(&key, &codec, calls.supplier(Ok::<_, StorageError>(Some(demo)))).await?;
/// assert_eq!(calls.count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    /// A supplier that records its call and resolves to `result`.
    pub fn supplier<T, E>(
        &self,
        result: Result<Option<T>, E>,
    ) -> impl FnOnce() -> Ready<Result<Option<T>, E>> {
        let calls = Arc::clone(&self.0);
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            ready(result)
        }
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for ebag types.

    use super::*;
    use proptest::prelude::*;

    pub fn arb_demo() -> impl Strategy<Value = Demo> {
        (any::<i64>(), "[A-Za-z0-9 ]{0,32}").prop_map(|(id, info)| Demo::new(id, info))
    }

    pub fn arb_user() -> impl Strategy<Value = User> {
        (any::<i64>(), "[a-z][a-z0-9_]{0,15}", proptest::option::of(any::<i64>()))
            .prop_map(|(id, username, school_id)| User::new(id, username, school_id))
    }

    pub fn arb_cache_key() -> impl Strategy<Value = CacheKey> {
        "[a-z]{1,12}_[0-9]{1,6}".prop_filter_map("valid cache key", |s| CacheKey::new(s).ok())
    }

    /// Callback names that pass [`CallbackName::parse`].
    pub fn arb_callback_name() -> impl Strategy<Value = CallbackName> {
        r"[A-Za-z_$][A-Za-z0-9_$]{0,15}(\.[A-Za-z_$][A-Za-z0-9_$]{0,7}){0,2}"
            .prop_filter_map("valid callback", |s| CallbackName::parse(s).ok())
    }

    pub type DemoEnvelope = ResultEnvelope<Demo, String>;

    /// Envelopes carrying a demo on success and a diagnostic on failure.
    pub fn arb_envelope() -> impl Strategy<Value = DemoEnvelope> {
        let message = "[A-Za-z ]{0,24}";
        let code = proptest::option::of(any::<i32>());
        prop_oneof![
            (message, proptest::option::of(arb_demo()), code.clone()).prop_map(
                |(message, data, code)| DemoEnvelope::ok_with_code(message, data, code)
            ),
            (message, proptest::option::of("[ -~]{0,24}"), code).prop_map(
                |(message, data, code)| DemoEnvelope::fail_with_code(message, data, code)
            ),
        ]
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built fixtures for the demo scenario.

    use super::*;

    /// The row cached under `demo_1`.
    pub fn demo_biao() -> Demo {
        Demo::new(1, "Biao")
    }

    /// Accessor over a fresh in-memory store, plus a handle on the store.
    pub fn memory_cache() -> (Arc<InMemoryCacheStore>, CacheAside<InMemoryCacheStore>) {
        let store = Arc::new(InMemoryCacheStore::new());
        let cache = CacheAside::new(Arc::clone(&store), CacheConfig::default());
        (store, cache)
    }

    /// Raw JSON bytes the accessor writes for `value`.
    pub fn encoded<T: serde::Serialize>(value: &T) -> Vec<u8> {
        serde_json::to_vec(value).unwrap_or_default()
    }
}
