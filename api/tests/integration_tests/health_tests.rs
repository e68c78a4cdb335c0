//! Integration tests for health check and general API functionality.
//!
//! Tests cover:
//! - Health check endpoint
//! - Behavior against a store that answers nothing

use axum::http::StatusCode;

use super::common::{get, test_app};

#[tokio::test]
async fn test_health_check() {
    let app = test_app();

    let (status, response) = get(app.router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["status"], "healthy");
    assert_eq!(response["service"], "loggate-api");
}

#[tokio::test]
async fn test_health_check_does_not_touch_store() {
    let app = test_app();

    let (status, _) = get(app.router, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert!(app.executor.executed().is_empty());
}

#[tokio::test]
async fn test_unreachable_store_reports_bad_gateway() {
    let app = test_app();

    let (status, response) = get(app.router, "/api/v1/logs?db=logs&table=app").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(response["error"], "execution_error");
    assert!(response["message"]
        .as_str()
        .is_some_and(|m| m.contains("Unknown query")));
}
