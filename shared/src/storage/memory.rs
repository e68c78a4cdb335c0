//! Scripted in-memory executor.
//!
//! Answers queries from a table of canned result sets keyed by the exact SQL
//! text. Suitable for development and testing without a running store.

use super::executor::{ColumnMeta, QueryExecutor, RowCursor};
use crate::error::GatewayError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// A canned result set.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    columns: Vec<ColumnMeta>,
    rows: Vec<Vec<serde_json::Value>>,
    fail_after: Option<usize>,
}

impl ResultSet {
    /// Creates an empty result set with the given `(name, type)` columns.
    #[must_use]
    pub fn new(columns: &[(&str, &str)]) -> Self {
        Self {
            columns: columns
                .iter()
                .map(|(name, type_name)| ColumnMeta::new(*name, *type_name))
                .collect(),
            ..Self::default()
        }
    }

    /// Appends a row of wire values.
    #[must_use]
    pub fn with_row(mut self, row: Vec<serde_json::Value>) -> Self {
        self.rows.push(row);
        self
    }

    /// Makes the cursor fail after handing out `rows` rows.
    #[must_use]
    pub fn failing_after(mut self, rows: usize) -> Self {
        self.fail_after = Some(rows);
        self
    }
}

#[derive(Debug, Clone)]
enum Scripted {
    Rows(ResultSet),
    Error(String),
}

/// In-memory [`QueryExecutor`] answering from scripted results.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use shared::storage::{InMemoryExecutor, QueryExecutor, ResultSet};
///
/// let executor = InMemoryExecutor::new();
/// executor.script(
///     "show databases",
///     ResultSet::new(&[("name", "String")]).with_row(vec![json!("logs")]),
/// );
///
/// let mut cursor = executor.execute("show databases").unwrap();
/// assert_eq!(cursor.columns()[0].name, "name");
/// assert_eq!(cursor.next_row().unwrap(), Some(vec![json!("logs")]));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryExecutor {
    scripts: RwLock<HashMap<String, Scripted>>,
    executed: RwLock<Vec<String>>,
    open_cursors: Arc<AtomicUsize>,
}

impl InMemoryExecutor {
    /// Creates an executor with no scripted queries.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new executor wrapped in an Arc.
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Answers `sql` with `result`.
    ///
    /// Scripting recovers a poisoned lock, so the script is always stored.
    pub fn script(&self, sql: impl Into<String>, result: ResultSet) {
        self.scripts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(sql.into(), Scripted::Rows(result));
    }

    /// Makes `sql` fail with `message`.
    pub fn script_error(&self, sql: impl Into<String>, message: impl Into<String>) {
        self.scripts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(sql.into(), Scripted::Error(message.into()));
    }

    /// Queries executed so far, in order.
    #[must_use]
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of cursors handed out and not yet dropped.
    #[must_use]
    pub fn open_cursors(&self) -> usize {
        self.open_cursors.load(Ordering::SeqCst)
    }
}

impl QueryExecutor for InMemoryExecutor {
    fn execute(&self, sql: &str) -> Result<Box<dyn RowCursor>, GatewayError> {
        self.executed
            .write()
            .map_err(|_| GatewayError::Lock("executed queries"))?
            .push(sql.to_string());

        let scripted = self
            .scripts
            .read()
            .map_err(|_| GatewayError::Lock("scripted queries"))?
            .get(sql)
            .cloned();

        match scripted {
            Some(Scripted::Rows(result)) => {
                self.open_cursors.fetch_add(1, Ordering::SeqCst);
                Ok(Box::new(MemoryCursor {
                    result,
                    position: 0,
                    open_cursors: Arc::clone(&self.open_cursors),
                }))
            }
            Some(Scripted::Error(message)) => Err(GatewayError::Execution(message)),
            None => Err(GatewayError::Execution(format!("Unknown query: {sql}"))),
        }
    }
}

struct MemoryCursor {
    result: ResultSet,
    position: usize,
    open_cursors: Arc<AtomicUsize>,
}

impl RowCursor for MemoryCursor {
    fn columns(&self) -> &[ColumnMeta] {
        &self.result.columns
    }

    fn next_row(&mut self) -> Result<Option<Vec<serde_json::Value>>, GatewayError> {
        if self.result.fail_after == Some(self.position) {
            return Err(GatewayError::Execution("connection reset".to_string()));
        }
        let row = self.result.rows.get(self.position).cloned();
        if row.is_some() {
            self.position += 1;
        }
        Ok(row)
    }
}

impl Drop for MemoryCursor {
    fn drop(&mut self) {
        self.open_cursors.fetch_sub(1, Ordering::SeqCst);
    }
}
