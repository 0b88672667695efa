//! Router tests that never reach the database
//!
//! The pool connects lazily, so every request below must be answered by
//! routing, authentication, authorization or validation.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use creative_server::{
    api,
    models::{Role, UserClaims},
    AppConfig, AppState,
};

fn app() -> Router {
    let config = AppConfig::default();
    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database.url)
        .expect("lazy pool");
    api::create_router(AppState::new(config, pool))
}

fn token_for(role: Role) -> String {
    let now = Utc::now().timestamp();
    let claims = UserClaims {
        sub: format!("{}-user", role),
        user_id: 42,
        role,
        exp: now + 3600,
        iat: now,
    };
    claims
        .create_token(&AppConfig::default().auth.jwt_secret)
        .expect("token")
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn test_health_is_served_at_root_and_under_api() {
    for uri in ["/health", "/api/health"] {
        let response = app()
            .oneshot(request(Method::GET, uri, None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
    }
}

#[tokio::test]
async fn test_loans_require_a_token() {
    let response = app()
        .oneshot(request(Method::GET, "/api/loans", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let response = app()
        .oneshot(request(Method::GET, "/api/patients", Some("not-a-jwt"), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_loan_with_return_date_before_start_is_rejected() {
    let token = token_for(Role::Staff);
    let body = json!({
        "equipment_id": 1,
        "patient_id": 1,
        "start_date": "2025-03-10T09:00:00Z",
        "expected_return_date": "2025-03-01T09:00:00Z"
    });

    let response = app()
        .oneshot(request(Method::POST, "/api/loans", Some(&token), Some(body)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_viewer_cannot_delete_patients() {
    let token = token_for(Role::Viewer);

    let response = app()
        .oneshot(request(Method::DELETE, "/api/patients/1", Some(&token), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_viewer_cannot_create_loans() {
    let token = token_for(Role::Viewer);
    let body = json!({ "equipment_id": 1, "patient_id": 1 });

    let response = app()
        .oneshot(request(Method::POST, "/loans", Some(&token), Some(body)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_user_management_is_admin_only() {
    let token = token_for(Role::Manager);

    let response = app()
        .oneshot(request(Method::GET, "/api/users", Some(&token), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_login_requires_credentials() {
    let body = json!({ "login": "", "password": "" });

    let response = app()
        .oneshot(request(Method::POST, "/api/auth/login", None, Some(body)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bulk_status_rejects_open_target() {
    let token = token_for(Role::Manager);
    let body = json!({ "ids": [1, 2], "status": "active" });

    let response = app()
        .oneshot(request(Method::PATCH, "/api/loans/bulk-status", Some(&token), Some(body)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_loan_without_patient_is_rejected_with_envelope() {
    let token = token_for(Role::Staff);
    let body = json!({ "equipment_id": 1 });

    let response = app()
        .oneshot(request(Method::POST, "/api/loans", Some(&token), Some(body)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "BadValue");
    assert!(body["message"].as_str().unwrap().contains("patient_id"));
}

#[tokio::test]
async fn test_unknown_return_condition_is_rejected_with_envelope() {
    let token = token_for(Role::Staff);
    let body = json!({ "condition": "broken" });

    let response = app()
        .oneshot(request(Method::PUT, "/api/loans/1/return", Some(&token), Some(body)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_malformed_json_is_rejected_with_envelope() {
    let token = token_for(Role::Staff);
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/loans")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"equipment_id\": 1,"))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["success"], false);
}

#[tokio::test]
async fn test_non_numeric_id_reads_as_not_found() {
    let token = token_for(Role::Viewer);

    let response = app()
        .oneshot(request(Method::GET, "/api/loans/abc", Some(&token), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "NotFound");
}

#[tokio::test]
async fn test_invalid_query_parameter_is_rejected_with_envelope() {
    let token = token_for(Role::Viewer);

    let response = app()
        .oneshot(request(Method::GET, "/api/loans?status=lost", Some(&token), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["success"], false);
}
