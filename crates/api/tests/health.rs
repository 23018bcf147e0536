//! Integration tests for the root-level health endpoint and shared
//! middleware behaviour.

mod common;

use axum::http::StatusCode;
use common::{body_json, get};

#[tokio::test]
async fn test_health_reports_memory_store() {
    let app = common::build_test_app();

    let response = get(app.app(), "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["store"], "memory");
    assert_eq!(json["db_healthy"], true);
    assert_eq!(json["diffusion_loaded"], false);
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let app = common::build_test_app();

    let response = get(app.app(), "/health").await;

    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("x-request-id header should be set");
    assert!(!request_id.is_empty());
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let app = common::build_test_app();

    let response = get(app.app(), "/api/v1/nope").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
