//! Instance registry capability.
//!
//! Resolves store instances by datasource type and name, and hands out the
//! live [`ConnectionHandle`] for an instance identity.

use super::executor::ConnectionHandle;
use crate::error::GatewayError;
use crate::models::InstanceDescriptor;
use std::sync::{Arc, RwLock};

/// Trait for instance registries.
///
/// Implementations must be thread-safe (Send + Sync).
pub trait InstanceRegistry: Send + Sync {
    /// Resolves an instance by datasource type and name.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if no such instance is registered.
    fn resolve(
        &self,
        datasource_type: &str,
        instance_name: &str,
    ) -> Result<InstanceDescriptor, GatewayError>;

    /// Returns the connection of the instance with the given identity.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if no such instance is registered.
    fn connection(&self, instance_id: u64) -> Result<ConnectionHandle, GatewayError>;

    /// Lists every registered instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be read.
    fn instances(&self) -> Result<Vec<InstanceDescriptor>, GatewayError>;
}

/// In-memory instance registry.
///
/// Connections are kept in registration order. Data is not persisted.
#[derive(Debug, Default)]
pub struct InMemoryInstanceRegistry {
    connections: RwLock<Vec<ConnectionHandle>>,
}

impl InMemoryInstanceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new registry wrapped in an Arc.
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Registers a connection, replacing any connection with the same identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry lock is poisoned.
    pub fn register(&self, connection: ConnectionHandle) -> Result<(), GatewayError> {
        let mut connections = self
            .connections
            .write()
            .map_err(|_| GatewayError::Lock("instance registry"))?;
        connections.retain(|c| c.id() != connection.id());
        connections.push(connection);
        Ok(())
    }
}

fn descriptor(connection: &ConnectionHandle) -> InstanceDescriptor {
    InstanceDescriptor {
        id: connection.id(),
        name: connection.instance_name().to_string(),
        datasource_type: connection.datasource_type().to_string(),
    }
}

impl InstanceRegistry for InMemoryInstanceRegistry {
    fn resolve(
        &self,
        datasource_type: &str,
        instance_name: &str,
    ) -> Result<InstanceDescriptor, GatewayError> {
        let connections = self
            .connections
            .read()
            .map_err(|_| GatewayError::Lock("instance registry"))?;
        connections
            .iter()
            .find(|c| c.datasource_type() == datasource_type && c.instance_name() == instance_name)
            .map(descriptor)
            .ok_or_else(|| {
                GatewayError::NotFound(format!("instance {datasource_type}/{instance_name}"))
            })
    }

    fn connection(&self, instance_id: u64) -> Result<ConnectionHandle, GatewayError> {
        let connections = self
            .connections
            .read()
            .map_err(|_| GatewayError::Lock("instance registry"))?;
        connections
            .iter()
            .find(|c| c.id() == instance_id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("instance {instance_id}")))
    }

    fn instances(&self) -> Result<Vec<InstanceDescriptor>, GatewayError> {
        let connections = self
            .connections
            .read()
            .map_err(|_| GatewayError::Lock("instance registry"))?;
        Ok(connections.iter().map(descriptor).collect())
    }
}
