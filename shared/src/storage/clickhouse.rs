//! `ClickHouse`-backed query executor.
//!
//! Results are requested in the `JSONCompactEachRowWithNamesAndTypes` format:
//! a JSON array of column names, a JSON array of column types, then one JSON
//! array per row. The response body is streamed and split into lines as rows
//! are pulled from the cursor.

use super::executor::{ColumnMeta, QueryExecutor, RowCursor};
use crate::error::GatewayError;
use clickhouse::query::BytesCursor;
use std::sync::Arc;

/// Output format requested from the server.
const OUTPUT_FORMAT: &str = "JSONCompactEachRowWithNamesAndTypes";

/// `ClickHouse` implementation of [`QueryExecutor`].
///
/// Calls bridge into the async client with `block_in_place`, so they must run
/// on a multi-threaded Tokio runtime.
#[derive(Clone)]
pub struct ClickHouseExecutor {
    client: Arc<clickhouse::Client>,
}

impl ClickHouseExecutor {
    /// Creates a new `ClickHouse` executor with the given client.
    #[must_use]
    pub fn new(client: Arc<clickhouse::Client>) -> Self {
        Self { client }
    }

    /// Creates a new `ClickHouse` executor wrapped in an Arc.
    #[must_use]
    pub fn new_shared(client: Arc<clickhouse::Client>) -> Arc<Self> {
        Arc::new(Self::new(client))
    }
}

/// Helper to execute async operations synchronously.
fn block_on<F, T>(future: F) -> Result<T, GatewayError>
where
    F: std::future::Future<Output = Result<T, clickhouse::error::Error>>,
{
    tokio::task::block_in_place(|| {
        tokio::runtime::Handle::current()
            .block_on(future)
            .map_err(GatewayError::from)
    })
}

impl QueryExecutor for ClickHouseExecutor {
    fn execute(&self, sql: &str) -> Result<Box<dyn RowCursor>, GatewayError> {
        tracing::debug!(%sql, "Executing query on ClickHouse");

        // `?` is a bind placeholder for the client; the text is sent as-is.
        let bytes = self
            .client
            .query(&sql.replace('?', "??"))
            .with_option("date_time_output_format", "iso")
            .with_option("output_format_json_validate_utf8", "1")
            .fetch_bytes(OUTPUT_FORMAT)?;
        let mut cursor = ClickHouseCursor {
            bytes,
            lines: LineBuffer::default(),
            columns: Vec::new(),
            rows_read: 0,
        };

        let names: Vec<String> = cursor.header_line("names")?;
        let types: Vec<String> = cursor.header_line("types")?;
        if names.len() != types.len() {
            return Err(GatewayError::Execution(format!(
                "Malformed header: {} column names but {} types",
                names.len(),
                types.len()
            )));
        }
        cursor.columns = names
            .into_iter()
            .zip(types)
            .map(|(name, type_name)| ColumnMeta { name, type_name })
            .collect();

        Ok(Box::new(cursor))
    }
}

/// Splits streamed chunks into newline-terminated lines.
#[derive(Debug, Default)]
struct LineBuffer {
    buffer: Vec<u8>,
    finished: bool,
}

impl LineBuffer {
    fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    fn finish(&mut self) {
        self.finished = true;
    }

    /// Pops the next complete non-empty line; after `finish`, also the unterminated tail.
    fn pop_line(&mut self) -> Option<Vec<u8>> {
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop();
            if !line.is_empty() {
                return Some(line);
            }
        }
        if self.finished && !self.buffer.is_empty() {
            return Some(std::mem::take(&mut self.buffer));
        }
        None
    }
}

struct ClickHouseCursor {
    bytes: BytesCursor,
    lines: LineBuffer,
    columns: Vec<ColumnMeta>,
    rows_read: usize,
}

impl ClickHouseCursor {
    /// Returns the next non-empty line of the response body.
    fn next_line(&mut self) -> Result<Option<Vec<u8>>, GatewayError> {
        loop {
            if let Some(line) = self.lines.pop_line() {
                return Ok(Some(line));
            }
            if self.lines.finished {
                return Ok(None);
            }
            match block_on(self.bytes.next())? {
                Some(chunk) => self.lines.push(&chunk),
                None => self.lines.finish(),
            }
        }
    }

    /// Reads one of the two header lines.
    fn header_line(&mut self, what: &str) -> Result<Vec<String>, GatewayError> {
        let line = self.next_line()?.ok_or_else(|| {
            GatewayError::Execution(format!("Response ended before column {what}"))
        })?;
        serde_json::from_slice(&line).map_err(|e| {
            GatewayError::Execution(format!("Malformed column {what} header: {e}"))
        })
    }
}

impl RowCursor for ClickHouseCursor {
    fn columns(&self) -> &[ColumnMeta] {
        &self.columns
    }

    fn next_row(&mut self) -> Result<Option<Vec<serde_json::Value>>, GatewayError> {
        let Some(line) = self.next_line()? else {
            return Ok(None);
        };
        if line.first() != Some(&b'[') {
            // Server-side exceptions raised mid-stream arrive as plain text lines.
            return Err(GatewayError::Execution(
                String::from_utf8_lossy(&line).trim().to_string(),
            ));
        }

        // Row contents stay out of the error message.
        let row = serde_json::from_slice(&line).map_err(|e| {
            GatewayError::decode(
                format!("<row {}>", self.rows_read),
                format!("row is not valid JSON at column {}", e.column()),
            )
        })?;
        self.rows_read += 1;
        Ok(Some(row))
    }
}
