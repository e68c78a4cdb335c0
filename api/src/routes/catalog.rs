//! Schema discovery endpoints.
//!
//! Lists registered instances, their databases, and the log tables of a database.

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use shared::models::{DatabaseDescriptor, InstanceDescriptor, TableDescriptor};

/// Creates the catalog routes with application state.
pub fn catalog_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/instances", get(list_instances))
        .route("/api/v1/instances/{id}/databases", get(list_databases))
        .route(
            "/api/v1/instances/{id}/databases/{database}/tables",
            get(list_tables),
        )
        .with_state(state)
}

/// Handler listing the registered instances.
async fn list_instances(
    State(state): State<AppState>,
) -> Result<Json<Vec<InstanceDescriptor>>, ApiError> {
    Ok(Json(state.gateway().registry().instances()?))
}

/// Handler listing the databases of an instance.
async fn list_databases(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Vec<DatabaseDescriptor>>, ApiError> {
    let conn = state.gateway().registry().connection(id)?;
    Ok(Json(state.catalog().list_databases(&conn)?))
}

/// Handler listing the log tables of a database.
///
/// Tables without the time marker column are left out.
async fn list_tables(
    State(state): State<AppState>,
    Path((id, database)): Path<(u64, String)>,
) -> Result<Json<Vec<TableDescriptor>>, ApiError> {
    let conn = state.gateway().registry().connection(id)?;
    Ok(Json(state.catalog().list_tables(&conn, &database)?))
}
