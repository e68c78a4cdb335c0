//! Store capabilities and implementations.
//!
//! This module provides the abstractions the gateway needs from its
//! collaborators: a [`QueryExecutor`] that runs query text, an
//! [`InstanceRegistry`] that resolves instances, and a [`FieldCatalog`] that
//! lists declared fields. Each comes with an in-memory implementation; the
//! executor also has a `ClickHouse` implementation.

pub mod clickhouse;
pub mod executor;
pub mod fields;
pub mod memory;
pub mod registry;

pub use self::clickhouse::ClickHouseExecutor;
pub use executor::{ColumnMeta, ConnectionHandle, QueryExecutor, RowCursor};
pub use fields::{FieldCatalog, InMemoryFieldCatalog};
pub use memory::{InMemoryExecutor, ResultSet};
pub use registry::{InMemoryInstanceRegistry, InstanceRegistry};
