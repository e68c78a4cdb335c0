//! SQL generation for Loggate.
//!
//! This module turns normalized search requests into query text for the three
//! read patterns the gateway supports (row listing, count, group-by) and for
//! catalog discovery.
//!
//! # Example
//!
//! ```
//! use shared::query::{build_schema_probe_query, build_table_list_query, TIME_COLUMN};
//!
//! assert_eq!(build_table_list_query("logs"), "show tables in logs");
//! assert!(build_schema_probe_query("app", TIME_COLUMN).contains("name = '_time_'"));
//! ```

mod builder;

pub use builder::*;
