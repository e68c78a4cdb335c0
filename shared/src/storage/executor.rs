//! Query execution capability.
//!
//! A [`QueryExecutor`] runs query text against a store and hands back a
//! [`RowCursor`] over dynamically-typed columns. Implementations must be
//! thread-safe (Send + Sync); a cursor is owned by a single call.

use crate::error::GatewayError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Name and store type of a result column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMeta {
    /// Column name as reported by the store.
    pub name: String,
    /// Store type name (e.g. `Nullable(String)`, `UInt64`).
    pub type_name: String,
}

impl ColumnMeta {
    /// Creates column metadata.
    #[must_use]
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// An open result set.
///
/// Cells are handed out in their wire form (`serde_json::Value`) positionally,
/// matching [`RowCursor::columns`]. Dropping the cursor releases it.
pub trait RowCursor: Send {
    /// Columns of the result set, in row order.
    fn columns(&self) -> &[ColumnMeta];

    /// Advances to the next row.
    ///
    /// Returns `Ok(None)` once the result set is exhausted.
    ///
    /// # Errors
    ///
    /// Returns an error if the cursor fails before the end of the result set.
    fn next_row(&mut self) -> Result<Option<Vec<serde_json::Value>>, GatewayError>;
}

/// Trait for store drivers able to run query text.
pub trait QueryExecutor: Send + Sync {
    /// Runs `sql` and returns a cursor over its result set.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Execution`] if the store rejects or cannot run the query.
    fn execute(&self, sql: &str) -> Result<Box<dyn RowCursor>, GatewayError>;
}

/// A live connection to one store instance.
///
/// Immutable after construction; clones share the same executor.
#[derive(Clone)]
pub struct ConnectionHandle {
    id: u64,
    instance_name: String,
    datasource_type: String,
    executor: Arc<dyn QueryExecutor>,
}

impl ConnectionHandle {
    /// Creates a connection handle.
    pub fn new(
        id: u64,
        instance_name: impl Into<String>,
        datasource_type: impl Into<String>,
        executor: Arc<dyn QueryExecutor>,
    ) -> Self {
        Self {
            id,
            instance_name: instance_name.into(),
            datasource_type: datasource_type.into(),
            executor,
        }
    }

    /// Numeric identity of the instance.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Instance name.
    #[must_use]
    pub fn instance_name(&self) -> &str {
        &self.instance_name
    }

    /// Datasource type tag.
    #[must_use]
    pub fn datasource_type(&self) -> &str {
        &self.datasource_type
    }

    /// Runs `sql` on this connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects or cannot run the query.
    pub fn execute(&self, sql: &str) -> Result<Box<dyn RowCursor>, GatewayError> {
        self.executor.execute(sql)
    }
}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.id)
            .field("instance_name", &self.instance_name)
            .field("datasource_type", &self.datasource_type)
            .finish_non_exhaustive()
    }
}
