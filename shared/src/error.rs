//! Error type shared by every gateway operation.

use thiserror::Error;

/// Errors that can occur while querying a log store.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The store rejected or could not run a generated query.
    #[error("Query execution failed: {0}")]
    Execution(String),

    /// A cell could not be converted to the in-memory value its column declares.
    #[error("Failed to decode column '{column}': {message}")]
    Decode {
        /// Column the offending cell belongs to.
        column: String,
        /// What went wrong.
        message: String,
    },

    /// The row cursor failed before the result set was fully read.
    #[error("Result set incomplete after {rows_read} row(s): {message}")]
    Incomplete {
        /// Number of rows successfully read before the failure.
        rows_read: usize,
        /// Underlying cursor failure.
        message: String,
    },

    /// An instance or connection could not be resolved.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request violates a precondition of the requested operation.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Failed to acquire a lock on in-process state.
    #[error("Failed to acquire lock on {0}")]
    Lock(&'static str),
}

impl GatewayError {
    /// Builds a [`GatewayError::Decode`] for the given column.
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }
}

impl From<clickhouse::error::Error> for GatewayError {
    fn from(e: clickhouse::error::Error) -> Self {
        Self::Execution(e.to_string())
    }
}
