//! Schema discovery results.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

/// A store instance known to the instance registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceDescriptor {
    /// Numeric identity of the instance.
    pub id: u64,
    /// Instance name, unique per datasource type.
    pub name: String,
    /// Datasource type tag (e.g. `ch`).
    pub datasource_type: String,
}

/// A database visible to a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseDescriptor {
    /// Database name.
    pub name: String,
    /// Identity of the owning instance.
    pub instance_id: u64,
    /// Name of the owning instance.
    pub instance_name: String,
    /// Datasource type of the owning instance.
    pub datasource_type: String,
}

/// A table visible to a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    /// Table name.
    pub name: String,
    /// Database holding the table.
    pub database: String,
    /// Identity of the owning instance.
    pub instance_id: u64,
    /// Datasource type of the owning instance.
    pub datasource_type: String,
    /// Whether the table carries the time-partition marker column.
    pub is_log_table: bool,
}

/// Fields declared for one table of one instance.
///
/// # Example
///
/// ```
/// use shared::models::FieldDeclaration;
///
/// let decl: FieldDeclaration = serde_json::from_str(
///     r#"{"instance_id": 1, "database": "logs", "table": "app", "fields": ["level"]}"#,
/// ).unwrap();
///
/// assert!(decl.validate_declaration().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct FieldDeclaration {
    /// Identity of the owning instance.
    pub instance_id: u64,

    /// Database holding the table.
    #[validate(length(min = 1, message = "Database cannot be empty"))]
    pub database: String,

    /// Table the fields belong to.
    #[validate(length(min = 1, message = "Table cannot be empty"))]
    pub table: String,

    /// Declared field names, in display order.
    #[serde(default)]
    pub fields: Vec<String>,
}

/// Errors that can occur during field declaration validation.
#[derive(Debug, Error)]
pub enum FieldDeclarationError {
    /// A declared field name is empty.
    #[error("Field name cannot be empty (table {0})")]
    EmptyField(String),

    /// Validation failed with details.
    #[error("Validation failed: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    /// The catalog holding the declaration could not be locked.
    #[error("Failed to acquire lock on {0}")]
    Lock(&'static str),
}

impl FieldDeclaration {
    /// Validates the declaration.
    ///
    /// # Errors
    ///
    /// Returns an error if the database, the table or any field name is empty.
    pub fn validate_declaration(&self) -> Result<(), FieldDeclarationError> {
        self.validate()?;
        if self.fields.iter().any(String::is_empty) {
            return Err(FieldDeclarationError::EmptyField(format!(
                "{}.{}",
                self.database, self.table
            )));
        }
        Ok(())
    }
}
