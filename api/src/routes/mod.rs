//! API route definitions.
//!
//! This module organizes all HTTP routes for the Loggate API server.

mod catalog;
mod health;
mod logs;

pub use catalog::catalog_routes;
pub use health::health_routes;
pub use logs::logs_routes;
