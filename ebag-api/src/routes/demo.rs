//! Demo REST API Routes
//!
//! Reads go through the cache-aside accessor in front of the record store.
//! Cache keys follow the `<entity>_<id>` convention, so `/api/demo/mybatis/1`
//! is cached under `demo_1` and the full listing under `demos`.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use ebag_core::{CallbackName, Demo, ResultEnvelope, User, DEFAULT_OK_MESSAGE};
use ebag_storage::{CacheKey, JsonCodec};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::response::{Envelope, JsonpResponse};
use crate::state::AppState;

/// Page size for school member listings.
const SCHOOL_USERS_PAGE: usize = 100;

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /api/demo/mybatis/:id - Demo row, cached under `demo_<id>`
pub async fn get_demo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Envelope<Demo>> {
    let key = CacheKey::entity("demo", id)?;
    let demo = state
        .cache
        .get(&key, &JsonCodec::<Demo>::new(), || state.records.find_demo_by_id(id))
        .await?;

    Ok(Json(ResultEnvelope::ok_message(DEFAULT_OK_MESSAGE, demo)))
}

/// GET /api/demo/mybatis - All demo rows, cached under `demos`
pub async fn list_demos(State(state): State<AppState>) -> ApiResult<Envelope<Vec<Demo>>> {
    let key = CacheKey::new("demos")?;
    let demos = state
        .cache
        .get(&key, &JsonCodec::<Vec<Demo>>::new(), || async {
            state.records.find_demos().await.map(Some)
        })
        .await?
        .unwrap_or_default();

    Ok(Json(ResultEnvelope::ok_data(demos)))
}

/// GET /api/demo/users/:id - User row, uncached
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Envelope<User>> {
    let user = state.records.find_user_by_id(id).await?;
    Ok(Json(ResultEnvelope::ok_message(DEFAULT_OK_MESSAGE, user)))
}

/// GET /api/demo/schools/:id/users - First page of a school's users, uncached
pub async fn list_school_users(
    State(state): State<AppState>,
    Path(school_id): Path<i64>,
) -> ApiResult<Envelope<Vec<User>>> {
    let users = state
        .records
        .find_users_by_school_id(school_id, 0, SCHOOL_USERS_PAGE)
        .await?;
    Ok(Json(ResultEnvelope::ok_data(users)))
}

#[derive(Debug, Deserialize)]
pub struct JsonpParams {
    pub callback: Option<String>,
}

/// GET /demo/jsonp-test?callback=cb - Envelope delivered as a JSONP script
pub async fn jsonp_test(Query(params): Query<JsonpParams>) -> ApiResult<JsonpResponse> {
    let raw = params
        .callback
        .ok_or_else(|| ApiError::missing_field("callback"))?;
    let callback = CallbackName::parse(raw)?;

    let envelope: ResultEnvelope<&str> =
        ResultEnvelope::ok_message("Congratulation", "Your data object");
    JsonpResponse::render(&callback, &envelope)
}

// ============================================================================
// ROUTER
// ============================================================================

/// Create the demo routes router.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/api/demo/mybatis", get(list_demos))
        .route("/api/demo/mybatis/:id", get(get_demo))
        .route("/api/demo/users/:id", get(get_user))
        .route("/api/demo/schools/:id/users", get(list_school_users))
        .route("/demo/jsonp-test", get(jsonp_test))
}
