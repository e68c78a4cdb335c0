//! Loggate API Server
//!
//! This crate provides the HTTP server of the Loggate log query gateway.
//! It exposes paginated log search, per-value group counts and schema
//! discovery over a `ClickHouse` instance.
//!
//! # Architecture
//!
//! The API server is built on Axum and Tokio, providing:
//! - Schema discovery routes (instances, databases, log tables)
//! - Search and group count routes backed by [`shared::gateway::Gateway`]
//!
//! # Example
//!
//! ```no_run
//! use api::run_server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     run_server().await
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod config;
pub mod db;
mod error;
mod routes;
mod state;

pub use config::Config;
pub use error::{ApiError, ErrorResponse};
pub use state::AppState;

use anyhow::{Context, Result};
use axum::Router;
use db::{Database, DatabaseConfig, InstanceConfig};
use shared::storage::{FieldCatalog, InMemoryFieldCatalog, InMemoryInstanceRegistry};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Runs the Loggate API server.
///
/// This function initializes the server with configuration from environment variables
/// and starts listening for incoming connections. It handles graceful shutdown on
/// SIGTERM/SIGINT signals.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration cannot be loaded from environment
/// - The server fails to bind to the configured address
/// - A fatal error occurs during operation
pub async fn run_server() -> Result<()> {
    let config = Config::from_env()?;
    run_server_with_config(config).await
}

/// Runs the Loggate API server with the provided configuration.
///
/// The store connection is still read from the `LOGGATE_DB_*` and
/// `LOGGATE_INSTANCE_*` environment variables.
///
/// # Errors
///
/// Returns an error if:
/// - The store or instance configuration is invalid
/// - The declared fields file cannot be loaded
/// - The server fails to bind to the configured address
/// - A fatal error occurs during operation
pub async fn run_server_with_config(config: Config) -> Result<()> {
    let addr = config.socket_addr();

    tracing::info!(
        host = %config.host,
        port = %config.port,
        "Loggate API server starting"
    );

    let state = build_state(&config).await?;
    let app = create_router(state);
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(%addr, "Listening for connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Connects to the configured store and assembles the application state.
async fn build_state(config: &Config) -> Result<AppState> {
    let db_config = DatabaseConfig::from_env()?;
    let instance = InstanceConfig::from_env()?;
    let database = Database::new(&db_config);

    // The gateway reports store failures per request.
    match database.ping().await {
        Ok(()) => tracing::info!(url = %db_config.url, "Connected to ClickHouse"),
        Err(e) => tracing::warn!(url = %db_config.url, error = %e, "ClickHouse is not reachable"),
    }

    let registry = InMemoryInstanceRegistry::new_shared();
    registry
        .register(database.connection(&instance))
        .context("Failed to register instance")?;

    let fields: Arc<dyn FieldCatalog> = match &config.fields_file {
        Some(path) => {
            let catalog = InMemoryFieldCatalog::from_json_file(path)?;
            tracing::info!(path = %path.display(), "Loaded declared fields");
            Arc::new(catalog)
        }
        None => InMemoryFieldCatalog::new_shared(),
    };

    Ok(AppState::new(registry, fields, instance).with_query_defaults(config.query_defaults))
}

/// Creates the main application router with all routes and middleware.
///
/// This function is public to allow testing the router without starting a full server.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health_routes())
        .merge(routes::catalog_routes(state.clone()))
        .merge(routes::logs_routes(state))
        .layer(TraceLayer::new_for_http())
}

/// Waits for a shutdown signal (SIGTERM or SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
