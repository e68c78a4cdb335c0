//! Integration tests for log search and group counts.
//!
//! Tests cover:
//! - Search with rows, total count and declared fields
//! - Pagination offsets
//! - Degraded enrichment
//! - Group counts

use axum::http::StatusCode;
use serde_json::json;
use shared::models::FieldDeclaration;
use shared::storage::ResultSet;

use super::common::{get, test_app};

const WINDOW: &str = "_time_ >= 1700000000 AND _time_ < 1700003600";

fn search_uri(path: &str, query: &str, extra: &str) -> String {
    format!(
        "{path}?db=logs&table=app&query={}&st=1700000000&et=1700003600{extra}",
        urlencoding::encode(query)
    )
}

fn level_declaration() -> FieldDeclaration {
    FieldDeclaration {
        instance_id: 1,
        database: "logs".to_string(),
        table: "app".to_string(),
        fields: vec!["level".to_string(), "msg".to_string()],
    }
}

#[tokio::test]
async fn test_search_flow() {
    let app = test_app();
    app.executor.script(
        format!("SELECT * FROM logs.app WHERE 1=1 AND {WINDOW} LIMIT 20 OFFSET 0"),
        ResultSet::new(&[
            ("_time_", "DateTime"),
            ("level", "LowCardinality(String)"),
            ("status", "Nullable(UInt16)"),
        ])
        .with_row(vec![json!("2023-11-14T22:13:20Z"), json!("error"), json!(500)])
        .with_row(vec![json!("2023-11-14T22:13:21Z"), json!("info"), json!(null)]),
    );
    app.executor.script(
        format!("SELECT count(*) as count FROM logs.app WHERE 1=1 AND {WINDOW}"),
        ResultSet::new(&[("count", "UInt64")]).with_row(vec![json!("2")]),
    );
    tokio_test::assert_ok!(app.fields.declare(level_declaration()));

    let (status, response) = get(app.router, &search_uri("/api/v1/logs", "", "")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["total_count"], 2);
    assert_eq!(response["page_size"], 20);
    assert_eq!(response["available_fields"], json!(["level", "msg"]));
    assert_eq!(
        response["rows"][0],
        json!({"_time_": "2023-11-14T22:13:20Z", "level": "error", "status": 500})
    );
    assert_eq!(response["rows"][1]["status"], json!(null));
    assert!(response.get("degraded").is_none());
}

#[tokio::test]
async fn test_search_pagination_and_filter() {
    let app = test_app();
    let filter = "level = 'error'";
    app.executor.script(
        format!("SELECT * FROM logs.app WHERE {filter} AND {WINDOW} LIMIT 10 OFFSET 20"),
        ResultSet::new(&[("level", "String")]),
    );
    app.executor.script(
        format!("SELECT count(*) as count FROM logs.app WHERE {filter} AND {WINDOW}"),
        ResultSet::new(&[("count", "UInt64")]).with_row(vec![json!("20")]),
    );

    let (status, response) = get(
        app.router,
        &search_uri("/api/v1/logs", filter, "&page=3&pageSize=10"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["rows"], json!([]));
    assert_eq!(response["total_count"], 20);
    assert_eq!(response["page_size"], 10);
}

#[tokio::test]
async fn test_search_degrades_count_and_fields_independently() {
    let app = test_app();
    app.executor.script(
        format!("SELECT * FROM logs.app WHERE 1=1 AND {WINDOW} LIMIT 20 OFFSET 0"),
        ResultSet::new(&[("msg", "String")]).with_row(vec![json!("hello")]),
    );
    app.executor.script_error(
        format!("SELECT count(*) as count FROM logs.app WHERE 1=1 AND {WINDOW}"),
        "Code: 159. Timeout exceeded",
    );
    tokio_test::assert_ok!(app.fields.declare(level_declaration()));

    let (status, response) = get(app.router, &search_uri("/api/v1/logs", "", "")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["rows"], json!([{"msg": "hello"}]));
    assert_eq!(response["total_count"], 0);
    assert_eq!(response["available_fields"], json!(["level", "msg"]));
    assert_eq!(response["degraded"].as_array().unwrap().len(), 1);
    assert_eq!(response["degraded"][0]["step"], "count");
}

#[tokio::test]
async fn test_search_aborts_on_partial_listing() {
    let app = test_app();
    app.executor.script(
        format!("SELECT * FROM logs.app WHERE 1=1 AND {WINDOW} LIMIT 20 OFFSET 0"),
        ResultSet::new(&[("msg", "String")])
            .with_row(vec![json!("a")])
            .with_row(vec![json!("b")])
            .failing_after(1),
    );

    let (status, response) = get(app.router, &search_uri("/api/v1/logs", "", "")).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(response["error"], "execution_error");
    assert_eq!(app.executor.open_cursors(), 0);
}

#[tokio::test]
async fn test_search_rejects_undecodable_rows() {
    let app = test_app();
    app.executor.script(
        format!("SELECT * FROM logs.app WHERE 1=1 AND {WINDOW} LIMIT 20 OFFSET 0"),
        ResultSet::new(&[("status", "UInt16")]).with_row(vec![json!("not a number")]),
    );

    let (status, response) = get(app.router, &search_uri("/api/v1/logs", "", "")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response["error"], "decode_error");
}

#[tokio::test]
async fn test_group_counts_flow() {
    let app = test_app();
    app.executor.script(
        format!(
            "SELECT count(*) as count, level as f FROM logs.app WHERE 1=1 AND {WINDOW} group by level"
        ),
        ResultSet::new(&[("count", "UInt64"), ("f", "String")])
            .with_row(vec![json!("2"), json!("error")])
            .with_row(vec![json!("1"), json!("info")]),
    );

    let (status, response) = get(
        app.router,
        &search_uri("/api/v1/logs/groups", "", "&field=level"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, json!({"field": "level", "groups": {"error": 2, "info": 1}}));
}

#[tokio::test]
async fn test_group_counts_null_group_renders_empty_key() {
    let app = test_app();
    app.executor.script(
        format!(
            "SELECT count(*) as count, host as f FROM logs.app WHERE 1=1 AND {WINDOW} group by host"
        ),
        ResultSet::new(&[("count", "UInt64"), ("f", "Nullable(String)")])
            .with_row(vec![json!("4"), json!(null)])
            .with_row(vec![json!("3"), json!("web-1")]),
    );

    let (status, response) = get(
        app.router,
        &search_uri("/api/v1/logs/groups", "", "&field=host"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["groups"], json!({"": 4, "web-1": 3}));
}

#[tokio::test]
async fn test_group_counts_failure_propagates() {
    let app = test_app();
    app.executor.script_error(
        format!(
            "SELECT count(*) as count, nope as f FROM logs.app WHERE 1=1 AND {WINDOW} group by nope"
        ),
        "Code: 47. Missing columns: 'nope'",
    );

    let (status, _) = get(
        app.router,
        &search_uri("/api/v1/logs/groups", "", "&field=nope"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
}
