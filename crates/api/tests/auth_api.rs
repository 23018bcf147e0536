//! HTTP-level integration tests for registration, login and bearer-token
//! enforcement.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, get_auth, post_json, register_and_login};
use serde_json::json;

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_register_returns_201_with_user() {
    let app = common::build_test_app();

    let body = json!({ "username": "mira", "password": "password123" });
    let response = post_json(app.app(), "/api/v1/auth/register", body).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert!(json["data"]["id"].is_number());
    assert_eq!(json["data"]["username"], "mira");
    assert!(json["data"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_register_duplicate_username_conflicts() {
    let app = common::build_test_app();
    let body = json!({ "username": "mira", "password": "password123" });

    let first = post_json(app.app(), "/api/v1/auth/register", body.clone()).await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = post_json(app.app(), "/api/v1/auth/register", body).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(second).await["code"], "CONFLICT");
}

#[tokio::test]
async fn test_register_rejects_short_password_and_username() {
    let app = common::build_test_app();

    for body in [
        json!({ "username": "mira", "password": "short" }),
        json!({ "username": "mi", "password": "password123" }),
    ] {
        let response = post_json(app.app(), "/api/v1/auth/register", body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
    }
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_login_success() {
    let app = common::build_test_app();
    let body = json!({ "username": "mira", "password": "password123" });
    post_json(app.app(), "/api/v1/auth/register", body.clone()).await;

    let response = post_json(app.app(), "/api/v1/auth/login", body).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["access_token"].is_string());
    assert_eq!(json["expires_in"], 3600);
}

#[tokio::test]
async fn test_login_wrong_password() {
    let app = common::build_test_app();
    post_json(
        app.app(),
        "/api/v1/auth/register",
        json!({ "username": "mira", "password": "password123" }),
    )
    .await;

    let body = json!({ "username": "mira", "password": "incorrect_password" });
    let response = post_json(app.app(), "/api/v1/auth/login", body).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
    assert_eq!(json["error"], "Invalid username or password");
}

#[tokio::test]
async fn test_login_unknown_user() {
    let app = common::build_test_app();

    let body = json!({ "username": "ghost", "password": "password123" });
    let response = post_json(app.app(), "/api/v1/auth/login", body).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Bearer token enforcement
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_protected_route_requires_token() {
    let app = common::build_test_app();

    let response = get(app.app(), "/api/v1/stories").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await["error"],
        "Missing Authorization header"
    );
}

#[tokio::test]
async fn test_protected_route_rejects_bad_token() {
    let app = common::build_test_app();

    let response = get_auth(app.app(), "/api/v1/stories", "not-a-token").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Invalid or expired token");
}

#[tokio::test]
async fn test_issued_token_grants_access() {
    let app = common::build_test_app();
    let token = register_and_login(&app.router, "mira").await;

    let response = get_auth(app.app(), "/api/v1/stories", &token).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"], json!([]));
}
