//! Database connection module for `ClickHouse`.
//!
//! This module builds the `ClickHouse` client from environment variables and
//! wraps it into the [`ConnectionHandle`] the gateway queries through.

use anyhow::{Context, Result};
use clickhouse::Client;
use shared::storage::{ClickHouseExecutor, ConnectionHandle};
use std::sync::Arc;

/// Database configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// `ClickHouse` HTTP URL (e.g., <http://localhost:8123>)
    pub url: String,
    /// Username for authentication
    pub user: String,
    /// Password for authentication
    pub password: String,
}

impl DatabaseConfig {
    /// Load database configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `LOGGATE_DB_URL`: Database URL (default: <http://localhost:8123>)
    /// - `LOGGATE_DB_USER`: Database user (default: "default")
    /// - `LOGGATE_DB_PASSWORD`: Database password (default: empty)
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables cannot be read.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            url: std::env::var("LOGGATE_DB_URL")
                .unwrap_or_else(|_| "http://localhost:8123".to_string()),
            user: std::env::var("LOGGATE_DB_USER").unwrap_or_else(|_| "default".to_string()),
            password: std::env::var("LOGGATE_DB_PASSWORD").unwrap_or_default(),
        })
    }
}

/// Identity under which the configured store is registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceConfig {
    /// Numeric identity of the instance.
    pub id: u64,
    /// Instance name.
    pub name: String,
    /// Datasource type tag.
    pub datasource_type: String,
}

impl InstanceConfig {
    /// Load instance identity from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `LOGGATE_INSTANCE_ID`: Numeric identity (default: 1)
    /// - `LOGGATE_INSTANCE_NAME`: Instance name (default: "default")
    /// - `LOGGATE_DATASOURCE_TYPE`: Datasource type (default: "ch")
    ///
    /// # Errors
    ///
    /// Returns an error if `LOGGATE_INSTANCE_ID` is set but is not a number.
    pub fn from_env() -> Result<Self> {
        let id = std::env::var("LOGGATE_INSTANCE_ID")
            .ok()
            .map(|v| v.parse::<u64>())
            .transpose()
            .context("Invalid value for LOGGATE_INSTANCE_ID")?
            .unwrap_or(1);

        Ok(Self {
            id,
            name: std::env::var("LOGGATE_INSTANCE_NAME").unwrap_or_else(|_| "default".to_string()),
            datasource_type: std::env::var("LOGGATE_DATASOURCE_TYPE")
                .unwrap_or_else(|_| "ch".to_string()),
        })
    }
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            id: 1,
            name: "default".to_string(),
            datasource_type: "ch".to_string(),
        }
    }
}

/// Database client wrapper.
#[derive(Clone)]
pub struct Database {
    client: Arc<Client>,
}

impl Database {
    /// Create a new database client from configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// # use api::db::{Database, DatabaseConfig};
    /// # fn example() -> anyhow::Result<()> {
    /// let config = DatabaseConfig::from_env()?;
    /// let db = Database::new(&config);
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn new(config: &DatabaseConfig) -> Self {
        let client = Client::default()
            .with_url(&config.url)
            .with_user(&config.user)
            .with_password(&config.password);

        Self {
            client: Arc::new(client),
        }
    }

    /// Get a reference to the underlying `ClickHouse` client.
    #[must_use]
    pub fn client(&self) -> Arc<Client> {
        Arc::clone(&self.client)
    }

    /// Wraps the client into a connection registered under `instance`.
    #[must_use]
    pub fn connection(&self, instance: &InstanceConfig) -> ConnectionHandle {
        ConnectionHandle::new(
            instance.id,
            instance.name.clone(),
            instance.datasource_type.clone(),
            ClickHouseExecutor::new_shared(self.client()),
        )
    }

    /// Test database connectivity by executing a simple query.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be reached or the query fails.
    pub async fn ping(&self) -> Result<()> {
        self.client
            .query("SELECT 1")
            .fetch_one::<u8>()
            .await
            .context("Failed to ping database")?;
        Ok(())
    }
}
