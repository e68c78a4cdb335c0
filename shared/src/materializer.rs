//! Row materialization.
//!
//! Turns an open [`RowCursor`] into a `Vec<Record>`. A decode table is built
//! once from the cursor's column metadata and applied positionally to every
//! row, then each cell is keyed by its column name.

use crate::error::GatewayError;
use crate::models::{Record, Value};
use crate::storage::{ColumnMeta, RowCursor};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value as Cell;

/// In-memory representation a column decodes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Text,
    Int,
    UInt,
    Float,
    Bool,
    Date,
    DateTime,
    /// Composite or unknown types, kept as their JSON text.
    Raw,
}

/// Decoder of a single column.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ColumnDecoder {
    name: String,
    kind: Kind,
    nullable: bool,
}

/// Strips a `Wrapper(...)` around a type name.
fn unwrap_type<'a>(type_name: &'a str, wrapper: &str) -> Option<&'a str> {
    type_name
        .strip_prefix(wrapper)
        .and_then(|rest| rest.strip_prefix('('))
        .and_then(|rest| rest.strip_suffix(')'))
}

impl ColumnDecoder {
    fn for_column(column: &ColumnMeta) -> Self {
        let mut type_name = column.type_name.trim();
        let mut nullable = false;
        loop {
            if let Some(inner) = unwrap_type(type_name, "LowCardinality") {
                type_name = inner;
            } else if let Some(inner) = unwrap_type(type_name, "Nullable") {
                type_name = inner;
                nullable = true;
            } else {
                break;
            }
        }

        let kind = match type_name {
            "String" | "UUID" | "IPv4" | "IPv6" => Kind::Text,
            t if t.starts_with("FixedString") || t.starts_with("Enum") => Kind::Text,
            // Wider than 64 bits: kept as text.
            "Int128" | "Int256" | "UInt128" | "UInt256" => Kind::Text,
            t if t.starts_with("UInt") => Kind::UInt,
            t if t.starts_with("Int") => Kind::Int,
            t if t.starts_with("Float") || t.starts_with("Decimal") => Kind::Float,
            "Bool" => Kind::Bool,
            "Date" | "Date32" => Kind::Date,
            t if t.starts_with("DateTime") => Kind::DateTime,
            _ => Kind::Raw,
        };

        Self {
            name: column.name.clone(),
            kind,
            nullable,
        }
    }

    fn decode(&self, cell: Cell) -> Result<Value, GatewayError> {
        if cell.is_null() {
            // Non-finite floats are written as null even in non-nullable columns.
            return if self.nullable || matches!(self.kind, Kind::Raw | Kind::Float) {
                Ok(Value::Null)
            } else {
                Err(self.mismatch("unexpected null", &cell))
            };
        }

        match self.kind {
            Kind::Text => match cell {
                Cell::String(s) => Ok(Value::String(s)),
                other => Err(self.mismatch("expected a string", &other)),
            },
            Kind::Int => match &cell {
                Cell::Number(n) => n.as_i64().map(Value::Int),
                Cell::String(s) => s.parse().ok().map(Value::Int),
                _ => None,
            }
            .ok_or_else(|| self.mismatch("expected a signed integer", &cell)),
            Kind::UInt => match &cell {
                Cell::Number(n) => n.as_u64().map(Value::UInt),
                Cell::String(s) => s.parse().ok().map(Value::UInt),
                _ => None,
            }
            .ok_or_else(|| self.mismatch("expected an unsigned integer", &cell)),
            Kind::Float => match &cell {
                Cell::Number(n) => n.as_f64().map(Value::Float),
                Cell::String(s) => s.parse().ok().map(Value::Float),
                _ => None,
            }
            .ok_or_else(|| self.mismatch("expected a number", &cell)),
            Kind::Bool => match cell {
                Cell::Bool(b) => Ok(Value::Bool(b)),
                other => Err(self.mismatch("expected a boolean", &other)),
            },
            Kind::Date => cell
                .as_str()
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| Value::Time(dt.and_utc()))
                .ok_or_else(|| self.mismatch("expected a date", &cell)),
            Kind::DateTime => parse_datetime(&cell)
                .map(Value::Time)
                .ok_or_else(|| self.mismatch("expected a timestamp", &cell)),
            Kind::Raw => Ok(match cell {
                Cell::String(s) => Value::String(s),
                other => Value::String(other.to_string()),
            }),
        }
    }

    fn mismatch(&self, expected: &str, cell: &Cell) -> GatewayError {
        GatewayError::decode(&self.name, format!("{expected}, got {cell}"))
    }
}

/// Parses an ISO 8601, `YYYY-MM-DD hh:mm:ss[.fff]` or unix-seconds timestamp.
fn parse_datetime(cell: &Cell) -> Option<DateTime<Utc>> {
    match cell {
        Cell::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
                    .ok()
                    .map(|dt| dt.and_utc())
            }),
        Cell::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0)),
        _ => None,
    }
}

/// Reads every row of `cursor` into records.
///
/// The cursor is consumed and released on every return path.
///
/// # Errors
///
/// - [`GatewayError::Decode`] if a cell does not match its column type, a
///   row's width differs from the column count, or the cursor cannot decode a
///   row; reading stops immediately.
/// - [`GatewayError::Incomplete`] if the cursor fails before the end of the
///   result set.
pub fn materialize(mut cursor: Box<dyn RowCursor>) -> Result<Vec<Record>, GatewayError> {
    let decoders: Vec<ColumnDecoder> = cursor
        .columns()
        .iter()
        .map(ColumnDecoder::for_column)
        .collect();

    let mut records = Vec::new();
    loop {
        let row = match cursor.next_row() {
            Ok(Some(row)) => row,
            Ok(None) => break,
            Err(e @ GatewayError::Decode { .. }) => return Err(e),
            Err(e) => {
                return Err(GatewayError::Incomplete {
                    rows_read: records.len(),
                    message: e.to_string(),
                })
            }
        };

        if row.len() != decoders.len() {
            return Err(GatewayError::decode(
                format!("<row {}>", records.len()),
                format!("expected {} cells, got {}", decoders.len(), row.len()),
            ));
        }

        let mut record = Record::with_capacity(decoders.len());
        for (decoder, cell) in decoders.iter().zip(row) {
            record.insert(decoder.name.clone(), decoder.decode(cell)?);
        }
        records.push(record);
    }

    tracing::debug!(rows = records.len(), columns = decoders.len(), "Materialized result set");
    Ok(records)
}
