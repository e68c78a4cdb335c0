//! Application state module.
//!
//! Defines the shared application state that is passed to route handlers.

use crate::db::InstanceConfig;
use shared::catalog::Catalog;
use shared::config::QueryDefaults;
use shared::gateway::Gateway;
use shared::storage::{
    ConnectionHandle, FieldCatalog, InMemoryExecutor, InMemoryFieldCatalog,
    InMemoryInstanceRegistry, InstanceRegistry, QueryExecutor,
};
use shared::GatewayError;
use std::sync::Arc;

/// Application state shared across all request handlers.
///
/// This struct contains all the shared resources needed by the API: the
/// gateway, the catalog and the instance requests fall back to.
#[derive(Clone)]
pub struct AppState {
    gateway: Gateway,
    catalog: Catalog,
    default_instance: InstanceConfig,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        registry: Arc<dyn InstanceRegistry>,
        fields: Arc<dyn FieldCatalog>,
        default_instance: InstanceConfig,
    ) -> Self {
        Self {
            gateway: Gateway::new(registry, fields),
            catalog: Catalog::new(),
            default_instance,
        }
    }

    /// Creates a state with a single instance backed by `executor`.
    ///
    /// # Panics
    ///
    /// Panics if the freshly created registry rejects the instance.
    pub fn with_executor(executor: Arc<dyn QueryExecutor>, fields: Arc<dyn FieldCatalog>) -> Self {
        let instance = InstanceConfig::default();
        let registry = InMemoryInstanceRegistry::new_shared();
        registry
            .register(ConnectionHandle::new(
                instance.id,
                instance.name.clone(),
                instance.datasource_type.clone(),
                executor,
            ))
            .expect("Failed to register instance in a new registry");
        Self::new(registry, fields, instance)
    }

    /// Creates a new application state with an in-memory store.
    ///
    /// The store answers no queries until scripted. This is useful for development and testing.
    #[must_use]
    pub fn with_in_memory_store() -> Self {
        Self::with_executor(
            InMemoryExecutor::new_shared(),
            InMemoryFieldCatalog::new_shared(),
        )
    }

    /// Overrides the request normalization defaults.
    #[must_use]
    pub fn with_query_defaults(mut self, defaults: QueryDefaults) -> Self {
        self.gateway = self.gateway.with_defaults(defaults);
        self
    }

    /// Returns the query gateway.
    #[must_use]
    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Returns the catalog service.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Returns the instance requests use when they name none.
    #[must_use]
    pub fn default_instance(&self) -> &InstanceConfig {
        &self.default_instance
    }

    /// Resolves the connection of an instance by datasource type and name.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if the instance is not registered.
    pub fn resolve_connection(
        &self,
        datasource_type: &str,
        instance_name: &str,
    ) -> Result<ConnectionHandle, GatewayError> {
        let registry = self.gateway.registry();
        let instance = registry.resolve(datasource_type, instance_name)?;
        registry.connection(instance.id)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_in_memory_store()
    }
}
