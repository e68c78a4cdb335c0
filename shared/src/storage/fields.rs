//! Declared field metadata capability.

use crate::error::GatewayError;
use crate::models::{FieldDeclaration, FieldDeclarationError};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Trait for field metadata stores.
///
/// Implementations must be thread-safe (Send + Sync).
pub trait FieldCatalog: Send + Sync {
    /// Lists the fields declared for a table of an instance.
    ///
    /// Tables without declarations yield an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata store cannot be read.
    fn list_declared_fields(
        &self,
        instance_id: u64,
        database: &str,
        table: &str,
    ) -> Result<Vec<String>, GatewayError>;
}

type TableKey = (u64, String, String);

/// In-memory field catalog.
///
/// # Example
///
/// ```
/// use shared::models::FieldDeclaration;
/// use shared::storage::{FieldCatalog, InMemoryFieldCatalog};
///
/// let catalog = InMemoryFieldCatalog::new();
/// catalog.declare(FieldDeclaration {
///     instance_id: 1,
///     database: "logs".to_string(),
///     table: "app".to_string(),
///     fields: vec!["level".to_string()],
/// }).unwrap();
///
/// assert_eq!(catalog.list_declared_fields(1, "logs", "app").unwrap(), vec!["level"]);
/// assert!(catalog.list_declared_fields(1, "logs", "other").unwrap().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct InMemoryFieldCatalog {
    fields: RwLock<HashMap<TableKey, Vec<String>>>,
}

impl InMemoryFieldCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new catalog wrapped in an Arc.
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Loads declarations from a JSON file holding an array of [`FieldDeclaration`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or a declaration is invalid.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read field declarations from {}", path.display()))?;
        let declarations: Vec<FieldDeclaration> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse field declarations in {}", path.display()))?;

        let catalog = Self::new();
        for declaration in declarations {
            catalog.declare(declaration)?;
        }
        Ok(catalog)
    }

    /// Declares the fields of a table, replacing any previous declaration.
    ///
    /// # Errors
    ///
    /// Returns an error if the declaration is invalid or the catalog lock is poisoned.
    pub fn declare(&self, declaration: FieldDeclaration) -> Result<(), FieldDeclarationError> {
        declaration.validate_declaration()?;
        let mut fields = self
            .fields
            .write()
            .map_err(|_| FieldDeclarationError::Lock("field catalog"))?;
        fields.insert(
            (
                declaration.instance_id,
                declaration.database,
                declaration.table,
            ),
            declaration.fields,
        );
        Ok(())
    }
}

impl FieldCatalog for InMemoryFieldCatalog {
    fn list_declared_fields(
        &self,
        instance_id: u64,
        database: &str,
        table: &str,
    ) -> Result<Vec<String>, GatewayError> {
        let fields = self
            .fields
            .read()
            .map_err(|_| GatewayError::Lock("field catalog"))?;
        Ok(fields
            .get(&(instance_id, database.to_string(), table.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}
