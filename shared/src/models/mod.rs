//! Data models for Loggate.
//!
//! This module contains the request, result and discovery structures shared
//! by the gateway, the HTTP API and the CLI.

pub mod catalog;
pub mod record;
pub mod request;
pub mod result;

pub use catalog::{
    DatabaseDescriptor, FieldDeclaration, FieldDeclarationError, InstanceDescriptor,
    TableDescriptor,
};
pub use record::{Record, Value};
pub use request::QueryRequest;
pub use result::{Degradation, QueryResult};
