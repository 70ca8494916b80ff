//! Property-Based Tests for the JSONP route
//!
//! Any valid callback name comes back as `<name>(<envelope json>)` with the
//! JSONP content type; any name carrying script syntax is refused with a
//! failed envelope and no script body.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use ebag_api::{build_router, AppState};
use ebag_core::{ResultEnvelope, JSONP_CONTENT_TYPE};
use ebag_test_utils::generators::arb_callback_name;
use proptest::prelude::*;
use tower::ServiceExt;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime should build")
}

async fn jsonp_request(router: Router, callback: &str) -> (StatusCode, Option<String>, String) {
    let request = Request::builder()
        .uri(format!("/demo/jsonp-test?callback={}", callback))
        .body(Body::empty())
        .expect("request should build");
    let response = router.oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should read");
    (
        status,
        content_type,
        String::from_utf8(body.to_vec()).expect("utf-8 body"),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Valid callback names wrap the congratulation envelope verbatim.
    #[test]
    fn prop_valid_callback_wraps_envelope(callback in arb_callback_name()) {
        runtime().block_on(async {
            let router = build_router(AppState::in_memory());
            let (status, content_type, body) = jsonp_request(router, callback.as_str()).await;

            prop_assert_eq!(status, StatusCode::OK);
            prop_assert_eq!(content_type.as_deref(), Some(JSONP_CONTENT_TYPE));
            prop_assert_eq!(
                body,
                format!(
                    r#"{}({{"success":true,"message":"Congratulation","data":"Your data object"}})"#,
                    callback
                )
            );
            Ok(())
        })?;
    }

    /// Names that would inject a call are refused with a 400 envelope.
    #[test]
    fn prop_call_syntax_is_refused(name in "[a-z]{1,8}", arg in "[0-9]{0,4}") {
        runtime().block_on(async {
            let router = build_router(AppState::in_memory());
            let injected = format!("{}({});x", name, arg);
            let (status, content_type, body) = jsonp_request(router, &injected).await;

            prop_assert_eq!(status, StatusCode::BAD_REQUEST);
            prop_assert_eq!(content_type.as_deref(), Some("application/json"));
            let envelope: ResultEnvelope<(), ()> =
                serde_json::from_str(&body).expect("valid envelope");
            prop_assert!(!envelope.is_success());
            prop_assert_eq!(envelope.code(), Some(400));
            Ok(())
        })?;
    }
}
