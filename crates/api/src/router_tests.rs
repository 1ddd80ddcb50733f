//! Router tests that run without a database.
//!
//! Most tests hold a disconnected `DatabaseConnection` and only exercise
//! paths that never query. Database failures are driven through a
//! `MockDatabase` with queued errors.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use rstest::rstest;
use sea_orm::{DatabaseBackend, DatabaseConnection, DbErr, MockDatabase};
use serde_json::Value;
use shareslice_shared::{
    AppConfig,
    config::{DatabaseConfig, PaginationConfig, ServerConfig, SessionConfig},
};
use tower::ServiceExt;

use super::*;

fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig::default(),
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        session: SessionConfig::default(),
        pagination: PaginationConfig::default(),
    }
}

fn app() -> Router {
    create_router(AppState::new(DatabaseConnection::Disconnected, test_config()))
}

/// A router whose first query fails.
fn failing_app() -> Router {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_errors([DbErr::Custom("connection reset".to_string())])
        .into_connection();
    create_router(AppState::new(db, test_config()))
}

async fn send(request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, String) {
    send_to(app(), request).await
}

async fn send_to(
    app: Router,
    request: Request<Body>,
) -> (StatusCode, axum::http::HeaderMap, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let (status, _, body) = send(get("/api/v1/health")).await;
    assert_eq!(status, StatusCode::OK);

    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "shareslice");
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn test_db_health_reports_unavailable() {
    let (status, _, body) = send(get("/api/v1/health/db")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "unhealthy");
}

#[rstest]
#[case("GET", "/api/v1/auth/me")]
#[case("GET", "/api/v1/users")]
#[case("GET", "/api/v1/assets")]
#[case("POST", "/api/v1/assets/00000000-0000-0000-0000-000000000000/approve")]
#[case("POST", "/api/v1/trades")]
#[case("GET", "/api/v1/offers")]
#[case("GET", "/api/v1/offers/00000000-0000-0000-0000-000000000000")]
#[case("PUT", "/api/v1/offers/00000000-0000-0000-0000-000000000000")]
#[case("GET", "/api/v1/admin/stats")]
#[tokio::test]
async fn test_protected_routes_require_session(#[case] method: &str, #[case] uri: &str) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"], "UNAUTHORIZED");
    assert_eq!(json["message"], "Authentication required");
}

#[tokio::test]
async fn test_session_lookup_failure_is_masked() {
    let request = Request::builder()
        .uri("/api/v1/auth/me")
        .header(header::COOKIE, "shareslice_session=abc")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send_to(failing_app(), request).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"], "DATABASE_ERROR");
    assert_eq!(json["message"], "An internal error occurred");
}

#[tokio::test]
async fn test_signup_validation_runs_before_database() {
    let body = r#"{"username":"alice","email":"not-an-email","password":"short","confirm_password":"other"}"#;
    let (status, _, body) = send(post_json("/api/v1/auth/signup", body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"], "VALIDATION_ERROR");
    let message = json["message"].as_str().unwrap();
    assert!(message.contains("email"));
    assert!(message.contains("password"));
}

#[tokio::test]
async fn test_signup_rejects_username_with_at_sign() {
    let body = r#"{"username":"a@b","email":"a@example.com","password":"password123","confirm_password":"password123"}"#;
    let (status, _, _) = send(post_json("/api/v1/auth/signup", body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_json_uses_error_envelope() {
    let (status, _, body) = send(post_json("/api/v1/auth/login", "{not json")).await;
    assert!(status.is_client_error());

    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_logout_without_session_succeeds() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/logout")
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_login_page_renders() {
    let (status, headers, body) = send(get("/login")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        headers[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/html")
    );
    assert!(body.contains(r#"<form method="post" action="/login">"#));
}

#[rstest]
#[case("/")]
#[case("/dashboard")]
#[tokio::test]
async fn test_pages_redirect_to_login_without_session(#[case] uri: &str) {
    let (status, headers, _) = send(get(uri)).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(headers[header::LOCATION], "/login");
}

#[tokio::test]
async fn test_failed_form_login_rerenders_with_401() {
    let request = Request::builder()
        .method("POST")
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("login=&password="))
        .unwrap();
    let (status, _, body) = send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains(r#"class="error""#));
}

#[tokio::test]
async fn test_dashboard_database_failure_renders_error_page() {
    let request = Request::builder()
        .uri("/dashboard")
        .header(header::COOKIE, "shareslice_session=abc")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send_to(failing_app(), request).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("An internal error occurred"));
    assert!(!body.contains("connection reset"));
}
