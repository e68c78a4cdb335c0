//! Liveness endpoint of the log query gateway.
//!
//! `GET /health` answers from the process alone: it never queries ClickHouse,
//! so a reachable gateway reports healthy even while its store is down. Store
//! failures surface per request on the search and discovery routes instead.

use axum::{routing::get, Json, Router};
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `healthy` while the process serves requests.
    pub status: &'static str,
    /// `loggate-api`.
    pub service: &'static str,
    /// Crate version of the running binary.
    pub version: &'static str,
}

/// Creates the liveness route.
pub fn health_routes() -> Router {
    Router::new().route("/health", get(health_check))
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "loggate-api",
        version: env!("CARGO_PKG_VERSION"),
    })
}
