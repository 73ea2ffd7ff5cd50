//! Integration Tests for API Endpoints
//!
//! Tests the full request/response cycle for each endpoint.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use request_cache::{api::create_router, AppState, CacheConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

// == Helper Functions ==

fn create_test_app() -> Router {
    create_app_with_capacity(64 * 1024)
}

fn create_app_with_capacity(capacity_bytes: usize) -> Router {
    let state = AppState::in_memory(capacity_bytes, &CacheConfig::default()).unwrap();
    create_router(state)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

// == PUT /cache ==

#[tokio::test]
async fn test_set_endpoint_returns_canonical_key() {
    let app = create_test_app();

    let response = app
        .oneshot(json_request(
            "PUT",
            "/cache",
            json!({"url": "/api/list", "params": {"page": 2, "_t": 123}, "data": {"foo": 1}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["key"], "/api/list-?page=2");
    assert_eq!(json["stored"], true);
}

#[tokio::test]
async fn test_set_endpoint_skips_empty_payload() {
    let app = create_test_app();

    let response = app
        .oneshot(json_request("PUT", "/cache", json!({"url": "/api/list", "data": []})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["stored"], false);
}

#[tokio::test]
async fn test_set_endpoint_empty_url() {
    let app = create_test_app();

    let response = app
        .oneshot(json_request("PUT", "/cache", json!({"url": "", "data": {"foo": 1}})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("empty"));
}

#[tokio::test]
async fn test_set_endpoint_payload_too_large() {
    let app = create_app_with_capacity(256);

    let response = app
        .oneshot(json_request(
            "PUT",
            "/cache",
            json!({"url": "/api/big", "data": {"blob": "x".repeat(1024)}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INSUFFICIENT_STORAGE);
}

#[tokio::test]
async fn test_set_endpoint_invalid_json() {
    let app = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/cache")
                .header("content-type", "application/json")
                .body(Body::from("not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

// == POST /cache/lookup ==

#[tokio::test]
async fn test_lookup_endpoint_success() {
    let app = create_test_app();

    let set_response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/cache",
            json!({"url": "/api/user?id=7", "data": {"name": "ada"}}),
        ))
        .await
        .unwrap();
    assert_eq!(set_response.status(), StatusCode::OK);

    // Same request, parameters supplied explicitly instead of in the query
    let response = app
        .oneshot(json_request(
            "POST",
            "/cache/lookup",
            json!({"url": "/api/user", "params": {"id": "7"}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["key"], "/api/user-?id=7");
    assert_eq!(json["data"], json!({"name": "ada"}));
}

#[tokio::test]
async fn test_lookup_endpoint_not_found() {
    let app = create_test_app();

    let response = app
        .oneshot(json_request("POST", "/cache/lookup", json!({"url": "/nonexistent"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("/nonexistent-"));
}

#[tokio::test]
async fn test_lookup_endpoint_identity_mismatch() {
    let app = create_test_app();

    app.clone()
        .oneshot(json_request(
            "PUT",
            "/cache",
            json!({"url": "/api/me", "data": {"role": "admin"}, "identity": "alice"}),
        ))
        .await
        .unwrap();

    let other = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/cache/lookup",
            json!({"url": "/api/me", "identity": "bob"}),
        ))
        .await
        .unwrap();
    assert_eq!(other.status(), StatusCode::NOT_FOUND);

    let same = app
        .oneshot(json_request(
            "POST",
            "/cache/lookup",
            json!({"url": "/api/me", "identity": "alice"}),
        ))
        .await
        .unwrap();
    assert_eq!(same.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_lookup_endpoint_stale_needs_force() {
    let app = create_test_app();

    // A negative max age makes the entry stale immediately, well inside the grace period
    app.clone()
        .oneshot(json_request(
            "PUT",
            "/cache",
            json!({"url": "/api/feed", "params": {"dtMaxAge": -60000}, "data": [1, 2]}),
        ))
        .await
        .unwrap();

    let plain = app
        .clone()
        .oneshot(json_request("POST", "/cache/lookup", json!({"url": "/api/feed"})))
        .await
        .unwrap();
    assert_eq!(plain.status(), StatusCode::NOT_FOUND);

    let forced = app
        .oneshot(json_request(
            "POST",
            "/cache/lookup",
            json!({"url": "/api/feed", "force_to_cache": true}),
        ))
        .await
        .unwrap();
    assert_eq!(forced.status(), StatusCode::OK);
    let json = body_to_json(forced.into_body()).await;
    assert_eq!(json["data"], json!([1, 2]));
}

// == DELETE /cache ==

#[tokio::test]
async fn test_delete_endpoint_success() {
    let app = create_test_app();

    app.clone()
        .oneshot(json_request("PUT", "/cache", json!({"url": "/api/list", "data": [1]})))
        .await
        .unwrap();

    let delete_response = app
        .clone()
        .oneshot(json_request("DELETE", "/cache", json!({"url": "/api/list"})))
        .await
        .unwrap();
    assert_eq!(delete_response.status(), StatusCode::OK);
    let json = body_to_json(delete_response.into_body()).await;
    assert_eq!(json["key"], "/api/list-");

    let get_response = app
        .oneshot(json_request("POST", "/cache/lookup", json!({"url": "/api/list"})))
        .await
        .unwrap();
    assert_eq!(get_response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_endpoint_missing_key_is_ok() {
    let app = create_test_app();

    let response = app
        .oneshot(json_request("DELETE", "/cache", json!({"url": "/never/cached"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

// == POST /cache/clear ==

#[tokio::test]
async fn test_clear_endpoint_empties_cache() {
    let app = create_test_app();

    for url in ["/a", "/b", "/c"] {
        app.clone()
            .oneshot(json_request("PUT", "/cache", json!({"url": url, "data": [1]})))
            .await
            .unwrap();
    }

    let clear_response = app
        .clone()
        .oneshot(empty_request("POST", "/cache/clear"))
        .await
        .unwrap();
    assert_eq!(clear_response.status(), StatusCode::OK);

    let stats_response = app.oneshot(empty_request("GET", "/stats")).await.unwrap();
    let json = body_to_json(stats_response.into_body()).await;
    assert_eq!(json["total_entries"], 0);
}

// == GET /stats ==

#[tokio::test]
async fn test_stats_endpoint_counts_traffic() {
    let app = create_test_app();

    app.clone()
        .oneshot(json_request("PUT", "/cache", json!({"url": "/api/list", "data": [1]})))
        .await
        .unwrap();
    app.clone()
        .oneshot(json_request("POST", "/cache/lookup", json!({"url": "/api/list"})))
        .await
        .unwrap();
    app.clone()
        .oneshot(json_request("POST", "/cache/lookup", json!({"url": "/api/other"})))
        .await
        .unwrap();

    let response = app.oneshot(empty_request("GET", "/stats")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["hits"], 1);
    assert_eq!(json["misses"], 1);
    assert_eq!(json["fallback_hits"], 0);
    assert_eq!(json["total_entries"], 1);
    assert_eq!(json["hit_rate"], 0.5);
}

// == GET /health ==

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let response = app.oneshot(empty_request("GET", "/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
    assert!(json["timestamp"].is_string());
}
