//! Loggate Shared Library
//!
//! This crate contains the log-query core used by the Loggate API server and
//! CLI: it turns structured search requests into SQL for a columnar store,
//! materializes dynamically-typed result rows, and discovers log tables.
//!
//! # Modules
//!
//! - [`models`] - Requests, results, records and discovery descriptors
//! - [`query`] - SQL generation for list, count and group-by queries
//! - [`materializer`] - Conversion of result cursors into records
//! - [`catalog`] - Database and log table discovery
//! - [`gateway`] - Request normalization and search orchestration
//! - [`storage`] - Store, registry and field metadata capabilities
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use shared::gateway::Gateway;
//! use shared::models::QueryRequest;
//! use shared::query::{build_count_query, build_list_query};
//! use shared::storage::{
//!     ConnectionHandle, InMemoryExecutor, InMemoryFieldCatalog, InMemoryInstanceRegistry,
//!     ResultSet,
//! };
//! use std::sync::Arc;
//!
//! let executor = Arc::new(InMemoryExecutor::new());
//! let conn = ConnectionHandle::new(1, "primary", "ch", executor.clone());
//! let registry = Arc::new(InMemoryInstanceRegistry::new());
//! registry.register(conn.clone()).unwrap();
//! let gateway = Gateway::new(registry, Arc::new(InMemoryFieldCatalog::new()));
//!
//! let req = gateway.prepare(QueryRequest::new("logs", "app").with_instance("ch", "primary"));
//! executor.script(
//!     build_list_query(&req),
//!     ResultSet::new(&[("level", "String")]).with_row(vec![json!("error")]),
//! );
//! executor.script(
//!     build_count_query(&req),
//!     ResultSet::new(&[("count", "UInt64")]).with_row(vec![json!("1")]),
//! );
//!
//! let result = gateway.search(&conn, &req).unwrap();
//! assert_eq!(result.rows.len(), 1);
//! assert_eq!(result.total_count, 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod catalog;
pub mod config;
pub mod error;
pub mod gateway;
pub mod materializer;
pub mod models;
pub mod query;
pub mod storage;

pub use error::GatewayError;

/// Re-export common dependencies for convenience.
pub use chrono;
pub use serde;
pub use serde_json;
pub use validator;
