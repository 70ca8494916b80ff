//! ebag API Server Entry Point
//!
//! Loads configuration, opens the cache store and starts the Axum server.

use std::sync::Arc;

use ebag_api::telemetry::init_tracing;
use ebag_api::{create_api_router, ApiConfig, ApiError, ApiResult, AppState};
use ebag_storage::{CacheStore, InMemoryCacheStore, InMemoryRecordStore, LmdbCacheStore};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let config = ApiConfig::from_env()?;
    init_tracing(config.log_format)?;

    let store: Arc<dyn CacheStore> = match &config.lmdb_path {
        Some(path) => {
            let store = LmdbCacheStore::new(path, config.lmdb_size_mb).map_err(|e| {
                ApiError::internal_error(format!("Failed to open cache store: {}", e))
            })?;
            Arc::new(store)
        }
        None => {
            tracing::info!("EBAG_CACHE_LMDB_PATH unset, using in-memory cache store");
            Arc::new(InMemoryCacheStore::new())
        }
    };

    let state = AppState::new(
        store,
        config.cache.clone(),
        Arc::new(InMemoryRecordStore::seeded()),
    );
    let app = create_api_router(state, &config);

    let addr = config.bind_addr()?;
    tracing::info!(
        %addr,
        cache_enabled = config.cache.enabled,
        default_ttl = ?config.cache.default_ttl,
        "Starting ebag API server"
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
