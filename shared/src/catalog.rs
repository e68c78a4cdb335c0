//! Schema discovery.
//!
//! Lists the databases of a connection and the log tables of a database. A
//! table counts as a log table only if it carries the time-partition marker
//! column; other tables are never returned.

use crate::error::GatewayError;
use crate::materializer::materialize;
use crate::models::{DatabaseDescriptor, Record, TableDescriptor};
use crate::query::{
    build_database_list_query, build_schema_probe_query, build_table_list_query, NAME_COLUMN,
    PROBE_ALIAS, TIME_COLUMN,
};
use crate::storage::ConnectionHandle;

/// Catalog service.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use shared::catalog::Catalog;
/// use shared::storage::{ConnectionHandle, InMemoryExecutor, ResultSet};
/// use std::sync::Arc;
///
/// let executor = Arc::new(InMemoryExecutor::new());
/// executor.script(
///     "show databases",
///     ResultSet::new(&[("name", "String")]).with_row(vec![json!("logs")]),
/// );
/// let conn = ConnectionHandle::new(1, "primary", "ch", executor);
///
/// let databases = Catalog::new().list_databases(&conn).unwrap();
/// assert_eq!(databases[0].name, "logs");
/// assert_eq!(databases[0].instance_id, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    marker: String,
}

impl Catalog {
    /// Creates a catalog using the default time-partition marker column.
    #[must_use]
    pub fn new() -> Self {
        Self::with_marker(TIME_COLUMN)
    }

    /// Creates a catalog qualifying tables by a custom marker column.
    #[must_use]
    pub fn with_marker(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    /// Lists every database visible to `conn`, in store order.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing query fails or a row has no name.
    pub fn list_databases(
        &self,
        conn: &ConnectionHandle,
    ) -> Result<Vec<DatabaseDescriptor>, GatewayError> {
        let rows = materialize(conn.execute(&build_database_list_query())?)?;
        let databases = rows
            .iter()
            .map(|row| {
                Ok(DatabaseDescriptor {
                    name: row_name(row)?,
                    instance_id: conn.id(),
                    instance_name: conn.instance_name().to_string(),
                    datasource_type: conn.datasource_type().to_string(),
                })
            })
            .collect::<Result<Vec<_>, GatewayError>>()?;

        tracing::debug!(
            instance = conn.instance_name(),
            count = databases.len(),
            "Listed databases"
        );
        Ok(databases)
    }

    /// Lists the log tables of `database`, in store order.
    ///
    /// Tables without the marker column are left out. A table whose probe
    /// fails is treated as not qualifying.
    ///
    /// # Errors
    ///
    /// Returns an error if the table listing query fails or a row has no name.
    pub fn list_tables(
        &self,
        conn: &ConnectionHandle,
        database: &str,
    ) -> Result<Vec<TableDescriptor>, GatewayError> {
        let rows = materialize(conn.execute(&build_table_list_query(database))?)?;

        let mut tables = Vec::new();
        for row in &rows {
            let name = row_name(row)?;
            if !self.is_log_table(conn, &name) {
                tracing::debug!(database, table = %name, "Skipping table without marker column");
                continue;
            }
            tables.push(TableDescriptor {
                name,
                database: database.to_string(),
                instance_id: conn.id(),
                datasource_type: conn.datasource_type().to_string(),
                is_log_table: true,
            });
        }

        tracing::debug!(
            database,
            candidates = rows.len(),
            accepted = tables.len(),
            "Listed tables"
        );
        Ok(tables)
    }

    /// Returns true if `table` has at least one column named after the marker.
    fn is_log_table(&self, conn: &ConnectionHandle, table: &str) -> bool {
        let probe = conn
            .execute(&build_schema_probe_query(table, &self.marker))
            .and_then(materialize);

        match probe {
            Ok(rows) => rows
                .first()
                .and_then(|row| row.get(PROBE_ALIAS))
                .and_then(crate::models::Value::as_u64)
                .is_some_and(|count| count > 0),
            Err(e) => {
                tracing::debug!(table, error = %e, "Schema probe failed");
                false
            }
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

fn row_name(row: &Record) -> Result<String, GatewayError> {
    row.get(NAME_COLUMN)
        .and_then(crate::models::Value::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| GatewayError::decode(NAME_COLUMN, "missing or not a string"))
}
