//! Cache statistics endpoint.

use axum::{extract::State, routing::get, Json, Router};
use ebag_core::ResultEnvelope;
use ebag_storage::{AccessorStats, CacheStats};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::response::Envelope;
use crate::state::AppState;

// ============================================================================
// TYPES
// ============================================================================

/// Accessor-level counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessorStatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub decode_failures: u64,
    pub read_failures: u64,
    pub writes: u64,
    pub write_failures: u64,
    pub supplier_failures: u64,
}

impl From<AccessorStats> for AccessorStatsResponse {
    fn from(stats: AccessorStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            decode_failures: stats.decode_failures,
            read_failures: stats.read_failures,
            writes: stats.writes,
            write_failures: stats.write_failures,
            supplier_failures: stats.supplier_failures,
        }
    }
}

/// Store-level counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreStatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub entry_count: u64,
    pub memory_bytes: u64,
    pub expirations: u64,
}

impl From<CacheStats> for StoreStatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            entry_count: stats.entry_count,
            memory_bytes: stats.memory_bytes,
            expirations: stats.expirations,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStatsResponse {
    pub enabled: bool,
    /// Default TTL in seconds; absent when entries never expire.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_ttl_secs: Option<u64>,
    pub accessor: AccessorStatsResponse,
    pub store: StoreStatsResponse,
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /api/cache/stats
pub async fn cache_stats(State(state): State<AppState>) -> ApiResult<Envelope<CacheStatsResponse>> {
    let config = state.cache.config();
    let store = state.cache.store().stats().await?;

    Ok(Json(ResultEnvelope::ok_data(CacheStatsResponse {
        enabled: config.enabled,
        default_ttl_secs: config.default_ttl.map(|ttl| ttl.as_secs()),
        accessor: state.cache.stats().into(),
        store: store.into(),
    })))
}

pub fn create_router() -> Router<AppState> {
    Router::new().route("/api/cache/stats", get(cache_stats))
}
