//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, TimeZone, Utc};
use serde_json::Value;
use tower::ServiceExt;

use doc_cache::api::create_router;
use doc_cache::{AppState, CacheOptions, CacheService, ManualClock, MemoryCollection};

// == Helper Functions ==

fn create_test_app() -> Router {
    let (app, _) = create_test_app_with_clock();
    app
}

fn create_test_app_with_clock() -> (Router, ManualClock) {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    let options = CacheOptions {
        wait_for_refresh_on_get: true,
        ..CacheOptions::default()
    };
    let service = CacheService::new(Arc::new(MemoryCollection::new("cache")), options)
        .with_clock(Arc::new(clock.clone()));
    (create_router(AppState::new(service)), clock)
}

async fn body_bytes(body: Body) -> Vec<u8> {
    axum::body::to_bytes(body, usize::MAX).await.unwrap().to_vec()
}

async fn body_to_json(body: Body) -> Value {
    serde_json::from_slice(&body_bytes(body).await).unwrap()
}

async fn send(app: &Router, method: &str, uri: &str, body: Body) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(body)
                .unwrap(),
        )
        .await
        .unwrap()
}

// == SET Endpoint Tests ==

#[tokio::test]
async fn test_set_endpoint_success() {
    let app = create_test_app();

    let response = send(&app, "PUT", "/entries/test_key", Body::from("test_value")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["key"].as_str().unwrap(), "test_key");
    assert!(json["message"].as_str().unwrap().contains("test_key"));
}

#[tokio::test]
async fn test_set_endpoint_rejects_conflicting_deadlines() {
    let app = create_test_app();

    let response = send(
        &app,
        "PUT",
        "/entries/k?absolute_expiration=2030-01-01T00:00:00Z&expires_in_ms=1000",
        Body::from("v"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("mutually exclusive"));
}

#[tokio::test]
async fn test_set_endpoint_rejects_out_of_range_millis() {
    let app = create_test_app();

    for uri in [
        "/entries/k?sliding_ms=-9223372036854775808",
        "/entries/k?expires_in_ms=-9223372036854775808",
    ] {
        let response = send(&app, "PUT", uri, Body::from("v")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_to_json(response.into_body()).await;
        assert!(json["error"].as_str().unwrap().contains("out of range"));
    }

    let response = send(&app, "GET", "/entries/k", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// == GET Endpoint Tests ==

#[tokio::test]
async fn test_get_endpoint_returns_raw_bytes() {
    let app = create_test_app();
    let payload = vec![0u8, 159, 146, 150, 255];

    let set_response = send(&app, "PUT", "/entries/bin", Body::from(payload.clone())).await;
    assert_eq!(set_response.status(), StatusCode::OK);

    let get_response = send(&app, "GET", "/entries/bin", Body::empty()).await;
    assert_eq!(get_response.status(), StatusCode::OK);
    assert_eq!(
        get_response.headers()["content-type"],
        "application/octet-stream"
    );
    assert_eq!(body_bytes(get_response.into_body()).await, payload);
}

#[tokio::test]
async fn test_get_endpoint_not_found() {
    let app = create_test_app();

    let response = send(&app, "GET", "/entries/nonexistent_key", Body::empty()).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("nonexistent_key"));
}

// == Expiration Tests ==

#[tokio::test]
async fn test_sliding_expiration_over_http() {
    let (app, clock) = create_test_app_with_clock();

    send(&app, "PUT", "/entries/b?sliding_ms=1000", Body::from(vec![9u8])).await;

    clock.advance(Duration::milliseconds(500));
    let response = send(&app, "GET", "/entries/b", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response.into_body()).await, vec![9u8]);

    clock.advance(Duration::milliseconds(1500));
    let response = send(&app, "GET", "/entries/b", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_refresh_endpoint_extends_lifetime() {
    let (app, clock) = create_test_app_with_clock();

    send(&app, "PUT", "/entries/r?sliding_ms=1000", Body::from("v")).await;

    clock.advance(Duration::milliseconds(800));
    let response = send(&app, "POST", "/entries/r/refresh", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert!(json["message"].as_str().unwrap().contains("refreshed"));

    clock.advance(Duration::milliseconds(800));
    let response = send(&app, "GET", "/entries/r", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_absolute_expiration_over_http() {
    let (app, clock) = create_test_app_with_clock();

    send(&app, "PUT", "/entries/a?expires_in_ms=1000", Body::from("v")).await;

    clock.advance(Duration::milliseconds(999));
    let response = send(&app, "GET", "/entries/a", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);

    clock.advance(Duration::milliseconds(1));
    let response = send(&app, "GET", "/entries/a", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// == DELETE Endpoint Tests ==

#[tokio::test]
async fn test_delete_endpoint_success() {
    let app = create_test_app();

    let set_response = send(&app, "PUT", "/entries/a", Body::from(vec![1u8, 2, 3])).await;
    assert_eq!(set_response.status(), StatusCode::OK);

    let get_response = send(&app, "GET", "/entries/a", Body::empty()).await;
    assert_eq!(body_bytes(get_response.into_body()).await, vec![1u8, 2, 3]);

    let del_response = send(&app, "DELETE", "/entries/a", Body::empty()).await;
    assert_eq!(del_response.status(), StatusCode::OK);

    let get_response = send(&app, "GET", "/entries/a", Body::empty()).await;
    assert_eq!(get_response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_endpoint_missing_key_is_ok() {
    let app = create_test_app();

    let response = send(&app, "DELETE", "/entries/nonexistent_key", Body::empty()).await;

    assert_eq!(response.status(), StatusCode::OK);
}

// == HEALTH Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let response = send(&app, "GET", "/health", Body::empty()).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
}
