//! Integration tests for schema discovery.
//!
//! Tests cover:
//! - Instance listing
//! - Database listing in store order
//! - Log table qualification by marker column

use axum::http::StatusCode;
use serde_json::json;
use shared::storage::ResultSet;

use super::common::{get, script_names, test_app};

fn probe(table: &str) -> String {
    format!("select count(*) as c from system.columns where table = '{table}' and name = '_time_'")
}

#[tokio::test]
async fn test_discovery_flow() {
    let app = test_app();
    script_names(&app.executor, "show databases", &["system", "logs"]);
    script_names(&app.executor, "show tables in logs", &["app", "users", "audit"]);
    app.executor.script(
        probe("app"),
        ResultSet::new(&[("c", "UInt64")]).with_row(vec![json!("1")]),
    );
    app.executor.script(
        probe("users"),
        ResultSet::new(&[("c", "UInt64")]).with_row(vec![json!("0")]),
    );
    app.executor.script(
        probe("audit"),
        ResultSet::new(&[("c", "UInt64")]).with_row(vec![json!("2")]),
    );

    let (status, instances) = get(app.router.clone(), "/api/v1/instances").await;
    assert_eq!(status, StatusCode::OK);
    let id = instances[0]["id"].as_u64().unwrap();

    let (status, databases) =
        get(app.router.clone(), &format!("/api/v1/instances/{id}/databases")).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = databases
        .as_array()
        .unwrap()
        .iter()
        .map(|db| db["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["system", "logs"]);

    let (status, tables) = get(
        app.router,
        &format!("/api/v1/instances/{id}/databases/logs/tables"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        tables,
        json!([
            {"name": "app", "database": "logs", "instance_id": 1, "datasource_type": "ch", "is_log_table": true},
            {"name": "audit", "database": "logs", "instance_id": 1, "datasource_type": "ch", "is_log_table": true}
        ])
    );
}

#[tokio::test]
async fn test_failed_probe_disqualifies_table() {
    let app = test_app();
    script_names(&app.executor, "show tables in logs", &["app", "broken"]);
    app.executor.script(
        probe("app"),
        ResultSet::new(&[("c", "UInt64")]).with_row(vec![json!("1")]),
    );
    app.executor.script_error(probe("broken"), "Code: 241. Memory limit exceeded");

    let (status, tables) = get(app.router, "/api/v1/instances/1/databases/logs/tables").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(tables.as_array().unwrap().len(), 1);
    assert_eq!(tables[0]["name"], "app");
}

#[tokio::test]
async fn test_empty_database_has_no_tables() {
    let app = test_app();
    script_names(&app.executor, "show tables in empty", &[]);

    let (status, tables) = get(app.router, "/api/v1/instances/1/databases/empty/tables").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(tables, json!([]));
}

#[tokio::test]
async fn test_table_listing_failure_propagates() {
    let app = test_app();
    app.executor
        .script_error("show tables in missing", "Code: 81. Database missing does not exist");

    let (status, response) =
        get(app.router, "/api/v1/instances/1/databases/missing/tables").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(response["error"], "execution_error");
}

#[tokio::test]
async fn test_unknown_instance_is_not_found() {
    let app = test_app();

    let (status, response) = get(app.router, "/api/v1/instances/7/databases/logs/tables").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(response["error"], "not_found");
    assert!(app.executor.executed().is_empty());
}
