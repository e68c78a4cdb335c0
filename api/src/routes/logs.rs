//! Log search endpoints.
//!
//! Provides paginated search over a log table and per-value group counts.

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use shared::models::{QueryRequest, QueryResult};
use std::collections::BTreeMap;
use validator::Validate;

/// Query string parameters of the search endpoints.
///
/// Every parameter except `db` and `table` is optional; missing values are
/// filled in by request normalization.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct SearchParams {
    /// Datasource type (defaults to the configured instance's).
    #[serde(default)]
    pub dt: Option<String>,

    /// Instance name (defaults to the configured instance's).
    #[serde(default, rename = "in")]
    pub instance: Option<String>,

    /// Database holding the table.
    #[validate(length(min = 1, message = "db is required"))]
    #[serde(default)]
    pub db: String,

    /// Table to search.
    #[validate(length(min = 1, message = "table is required"))]
    #[serde(default)]
    pub table: String,

    /// Filter expression.
    #[serde(default)]
    pub query: String,

    /// Window start, unix seconds.
    #[serde(default)]
    pub st: i64,

    /// Window end, unix seconds.
    #[serde(default)]
    pub et: i64,

    /// One-based page number.
    #[serde(default)]
    pub page: u32,

    /// Rows per page.
    #[serde(default, rename = "pageSize")]
    pub page_size: u32,

    /// Column to group by (group counts only).
    #[serde(default)]
    pub field: Option<String>,
}

impl SearchParams {
    /// Converts the parameters into a raw request, falling back to the
    /// default instance of `state`.
    fn into_request(self, state: &AppState) -> QueryRequest {
        let instance = state.default_instance();
        let mut req = QueryRequest::new(self.db, self.table)
            .with_instance(
                self.dt.unwrap_or_else(|| instance.datasource_type.clone()),
                self.instance.unwrap_or_else(|| instance.name.clone()),
            )
            .with_query(self.query)
            .with_time_range(self.st, self.et)
            .with_page(self.page, self.page_size);
        if let Some(field) = self.field {
            req = req.with_group_field(field);
        }
        req
    }
}

/// Response of the group counts endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct GroupCountsResponse {
    /// Field the rows were grouped by.
    pub field: String,
    /// Matching row count per field value.
    pub groups: BTreeMap<String, u64>,
}

/// Creates the log search routes with application state.
pub fn logs_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/logs", get(search_logs))
        .route("/api/v1/logs/groups", get(group_logs))
        .with_state(state)
}

/// Validates the parameters and normalizes them into a request.
fn prepare(state: &AppState, params: SearchParams) -> Result<QueryRequest, ApiError> {
    params.validate()?;
    Ok(state.gateway().prepare(params.into_request(state)))
}

/// Handler for paginated log search.
///
/// Fails only when the row listing fails; count and field lookup failures
/// are reported in the `degraded` list of a successful response.
async fn search_logs(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<QueryResult>, ApiError> {
    let req = prepare(&state, params)?;
    let conn = state.resolve_connection(&req.datasource_type, &req.instance_name)?;

    let result = state.gateway().search(&conn, &req)?;
    if result.is_degraded() {
        tracing::info!(
            table = %req.table_ref,
            degraded = result.degraded.len(),
            "Search answered with degraded metadata"
        );
    }

    Ok(Json(result))
}

/// Handler for per-value group counts.
async fn group_logs(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<GroupCountsResponse>, ApiError> {
    let req = prepare(&state, params)?;
    let Some(field) = req.group_field.clone() else {
        return Err(ApiError::BadRequest("field is required".to_string()));
    };
    let conn = state.resolve_connection(&req.datasource_type, &req.instance_name)?;

    let groups = state.gateway().group_counts(&conn, &req)?;

    Ok(Json(GroupCountsResponse { field, groups }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::json;
    use shared::models::FieldDeclaration;
    use shared::storage::{InMemoryExecutor, InMemoryFieldCatalog, ResultSet};
    use std::sync::Arc;
    use tower::ServiceExt;

    const PREDICATE: &str = "level = 'error' AND _time_ >= 100 AND _time_ < 200";

    fn create_test_router() -> (Router, Arc<InMemoryExecutor>, Arc<InMemoryFieldCatalog>) {
        let executor = InMemoryExecutor::new_shared();
        let fields = InMemoryFieldCatalog::new_shared();
        let state = AppState::with_executor(executor.clone(), fields.clone());
        (logs_routes(state), executor, fields)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn search_uri(path: &str, extra: &str) -> String {
        format!(
            "{path}?db=logs&table=app&query={}&st=100&et=200&page=1&pageSize=2{extra}",
            "level%20%3D%20%27error%27"
        )
    }

    #[tokio::test]
    async fn test_search_returns_rows_count_and_fields() {
        let (app, executor, fields) = create_test_router();
        executor.script(
            format!("SELECT * FROM logs.app WHERE {PREDICATE} LIMIT 2 OFFSET 0"),
            ResultSet::new(&[("level", "String"), ("msg", "String")])
                .with_row(vec![json!("error"), json!("disk full")]),
        );
        executor.script(
            format!("SELECT count(*) as count FROM logs.app WHERE {PREDICATE}"),
            ResultSet::new(&[("count", "UInt64")]).with_row(vec![json!("7")]),
        );
        fields
            .declare(FieldDeclaration {
                instance_id: 1,
                database: "logs".to_string(),
                table: "app".to_string(),
                fields: vec!["level".to_string()],
            })
            .unwrap();

        let (status, body) = get_json(app, &search_uri("/api/v1/logs", "")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rows"], json!([{"level": "error", "msg": "disk full"}]));
        assert_eq!(body["total_count"], 7);
        assert_eq!(body["page_size"], 2);
        assert_eq!(body["available_fields"], json!(["level"]));
        assert!(body.get("degraded").is_none());
    }

    #[tokio::test]
    async fn test_search_degrades_when_count_fails() {
        let (app, executor, _) = create_test_router();
        executor.script(
            format!("SELECT * FROM logs.app WHERE {PREDICATE} LIMIT 2 OFFSET 0"),
            ResultSet::new(&[("msg", "String")]).with_row(vec![json!("x")]),
        );

        let (status, body) = get_json(app, &search_uri("/api/v1/logs", "")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_count"], 0);
        assert_eq!(body["degraded"][0]["step"], "count");
    }

    #[tokio::test]
    async fn test_search_fails_when_listing_fails() {
        let (app, executor, _) = create_test_router();
        executor.script_error(
            format!("SELECT * FROM logs.app WHERE {PREDICATE} LIMIT 2 OFFSET 0"),
            "Code: 60. Table logs.app does not exist",
        );

        let (status, body) = get_json(app, &search_uri("/api/v1/logs", "")).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "execution_error");
    }

    #[tokio::test]
    async fn test_search_requires_table() {
        let (app, executor, _) = create_test_router();

        let (status, body) = get_json(app, "/api/v1/logs?db=logs").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_request");
        assert!(executor.executed().is_empty());
    }

    #[tokio::test]
    async fn test_search_unknown_instance() {
        let (app, _, _) = create_test_router();

        let (status, _) = get_json(app, "/api/v1/logs?db=logs&table=app&in=archive").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_group_counts() {
        let (app, executor, _) = create_test_router();
        executor.script(
            format!("SELECT count(*) as count, level as f FROM logs.app WHERE {PREDICATE} group by level"),
            ResultSet::new(&[("count", "UInt64"), ("f", "LowCardinality(String)")])
                .with_row(vec![json!("2"), json!("error")])
                .with_row(vec![json!("1"), json!("info")]),
        );

        let (status, body) =
            get_json(app, &search_uri("/api/v1/logs/groups", "&field=level")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["field"], "level");
        assert_eq!(body["groups"], json!({"error": 2, "info": 1}));
    }

    #[tokio::test]
    async fn test_group_counts_requires_field() {
        let (app, executor, _) = create_test_router();

        let (status, body) = get_json(app, &search_uri("/api/v1/logs/groups", "&field=")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_request");
        assert!(executor.executed().is_empty());
    }

    #[test]
    fn test_params_fall_back_to_default_instance() {
        let state = AppState::with_in_memory_store();
        let params = SearchParams {
            db: "logs".to_string(),
            table: "app".to_string(),
            ..SearchParams::default()
        };

        let req = params.into_request(&state);

        assert_eq!(req.datasource_type, "ch");
        assert_eq!(req.instance_name, "default");
        assert_eq!(req.group_field, None);
    }
}
