//! Common test utilities and helpers for integration tests.
//!
//! This module provides shared functionality used across all integration tests,
//! including test app setup, store scripting and HTTP request helpers.

use api::{create_router, AppState};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use shared::storage::{InMemoryExecutor, InMemoryFieldCatalog, ResultSet};
use std::sync::Arc;

/// Handles of a test app.
pub struct TestApp {
    /// The configured router.
    pub router: Router,
    /// The scripted store behind the default instance.
    pub executor: Arc<InMemoryExecutor>,
    /// The declared fields catalog.
    pub fields: Arc<InMemoryFieldCatalog>,
}

/// Creates a test app with a fresh scripted store.
pub fn test_app() -> TestApp {
    let executor = InMemoryExecutor::new_shared();
    let fields = InMemoryFieldCatalog::new_shared();
    let state = AppState::with_executor(executor.clone(), fields.clone());

    TestApp {
        router: create_router(state),
        executor,
        fields,
    }
}

/// Scripts a single-column `name` result, as returned by `show` queries.
pub fn script_names(executor: &InMemoryExecutor, sql: &str, names: &[&str]) {
    let result = names.iter().fold(
        ResultSet::new(&[("name", "String")]),
        |result, name| result.with_row(vec![json!(name)]),
    );
    executor.script(sql, result);
}

/// Helper to make a GET request.
///
/// # Returns
///
/// A tuple containing the response status code and parsed JSON response body.
pub async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = tower::ServiceExt::oneshot(
        app,
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

    (status, json)
}
