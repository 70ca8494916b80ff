//! Route tests for the demo API.
//!
//! Requests are driven through the router with `oneshot`, no socket needed.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use ebag_api::{build_router, create_api_router, ApiConfig, AppState};
use ebag_core::{Demo, ResultEnvelope, User, JSONP_CONTENT_TYPE};
use ebag_storage::{CacheConfig, CacheStore, InMemoryCacheStore, InMemoryRecordStore};
use ebag_test_utils::UnavailableCacheStore;
use serde_json::Value;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    store: Arc<InMemoryCacheStore>,
    records: Arc<InMemoryRecordStore>,
}

fn test_app() -> TestApp {
    let store = Arc::new(InMemoryCacheStore::new());
    let records = Arc::new(InMemoryRecordStore::seeded());
    let state = AppState::new(store.clone(), CacheConfig::default(), records.clone());
    TestApp {
        router: build_router(state),
        store,
        records,
    }
}

async fn send(router: &Router, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request should build");
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible");
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should read");
    (status, content_type, body.to_vec())
}

#[tokio::test]
async fn test_demo_lookup_is_cached() {
    let app = test_app();

    let (status, _, body) = send(&app.router, "/api/demo/mybatis/1").await;
    assert_eq!(status, StatusCode::OK);
    let envelope: ResultEnvelope<Demo> = serde_json::from_slice(&body).expect("valid envelope");
    assert!(envelope.is_success());
    assert_eq!(envelope.ok_value(), Some(&Demo::new(1, "Biao")));
    assert_eq!(app.records.query_count(), 1);
    assert!(app
        .store
        .get("demo_1")
        .await
        .expect("get should succeed")
        .is_some());

    let (status, _, second) = send(&app.router, "/api/demo/mybatis/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second, body);
    // Served from the cache.
    assert_eq!(app.records.query_count(), 1);
}

#[tokio::test]
async fn test_missing_demo_is_success_without_data() {
    let app = test_app();

    let (status, _, body) = send(&app.router, "/api/demo/mybatis/404").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).expect("valid json");
    assert_eq!(json, serde_json::json!({"success": true, "message": "success"}));
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn test_demo_list_is_cached() {
    let app = test_app();

    let (status, _, body) = send(&app.router, "/api/demo/mybatis").await;
    assert_eq!(status, StatusCode::OK);
    let envelope: ResultEnvelope<Vec<Demo>> =
        serde_json::from_slice(&body).expect("valid envelope");
    assert_eq!(envelope.ok_value().map(Vec::len), Some(3));

    send(&app.router, "/api/demo/mybatis").await;
    assert_eq!(app.records.query_count(), 1);
}

#[tokio::test]
async fn test_cache_down_still_serves_records() {
    let records = Arc::new(InMemoryRecordStore::seeded());
    let state = AppState::new(
        Arc::new(UnavailableCacheStore::new()),
        CacheConfig::default(),
        records.clone(),
    );
    let router = build_router(state);

    for _ in 0..2 {
        let (status, _, body) = send(&router, "/api/demo/mybatis/1").await;
        assert_eq!(status, StatusCode::OK);
        let envelope: ResultEnvelope<Demo> =
            serde_json::from_slice(&body).expect("valid envelope");
        assert_eq!(envelope.ok_value(), Some(&Demo::new(1, "Biao")));
    }
    assert_eq!(records.query_count(), 2);
}

#[tokio::test]
async fn test_school_users() {
    let app = test_app();

    let (status, _, body) = send(&app.router, "/api/demo/schools/1/users").await;
    assert_eq!(status, StatusCode::OK);
    let envelope: ResultEnvelope<Vec<User>> =
        serde_json::from_slice(&body).expect("valid envelope");
    let ids: Vec<i64> = envelope
        .ok_value()
        .map(|users| users.iter().map(|u| u.id).collect())
        .unwrap_or_default();
    assert_eq!(ids, vec![1, 2]);

    let (status, _, body) = send(&app.router, "/api/demo/users/3").await;
    assert_eq!(status, StatusCode::OK);
    let envelope: ResultEnvelope<User> = serde_json::from_slice(&body).expect("valid envelope");
    assert_eq!(envelope.ok_value(), Some(&User::new(3, "bob", Some(2))));
}

#[tokio::test]
async fn test_invalid_path_id() {
    let app = test_app();
    let (status, _, _) = send(&app.router, "/api/demo/mybatis/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_jsonp_route() {
    let app = test_app();

    let (status, content_type, body) = send(&app.router, "/demo/jsonp-test?callback=cb").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some(JSONP_CONTENT_TYPE));
    assert_eq!(
        String::from_utf8(body).expect("utf-8 body"),
        r#"cb({"success":true,"message":"Congratulation","data":"Your data object"})"#
    );
}

#[tokio::test]
async fn test_jsonp_rejects_unsafe_callback() {
    let app = test_app();

    let (status, content_type, body) =
        send(&app.router, "/demo/jsonp-test?callback=alert(1)//").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    let envelope: ResultEnvelope<(), ()> = serde_json::from_slice(&body).expect("valid envelope");
    assert!(!envelope.is_success());
    assert_eq!(envelope.code(), Some(400));

    let (status, _, body) = send(&app.router, "/demo/jsonp-test").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let envelope: ResultEnvelope<(), ()> = serde_json::from_slice(&body).expect("valid envelope");
    assert_eq!(envelope.message(), "Required field 'callback' is missing");
}

#[tokio::test]
async fn test_cache_stats() {
    let app = test_app();
    send(&app.router, "/api/demo/mybatis/1").await;
    send(&app.router, "/api/demo/mybatis/1").await;

    let (status, _, body) = send(&app.router, "/api/cache/stats").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).expect("valid json");
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["enabled"], true);
    assert_eq!(json["data"]["default_ttl_secs"], 3600);
    assert_eq!(json["data"]["accessor"]["hits"], 1);
    assert_eq!(json["data"]["accessor"]["misses"], 1);
    assert_eq!(json["data"]["store"]["entry_count"], 1);
}

#[tokio::test]
async fn test_health_ping_through_full_stack() {
    let router = create_api_router(AppState::in_memory(), &ApiConfig::default());
    let (status, _, body) = send(&router, "/health/ping").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"pong".to_vec());
}
