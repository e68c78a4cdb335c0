//! Server configuration module.
//!
//! Handles loading configuration from environment variables with sensible defaults.

use anyhow::{Context, Result};
use shared::config::QueryDefaults;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Server configuration.
///
/// Configuration values can be set via environment variables:
/// - `LOGGATE_HOST`: The host address to bind to (default: "0.0.0.0")
/// - `LOGGATE_PORT`: The port to listen on (default: 8080)
/// - `LOGGATE_DEFAULT_PAGE_SIZE`: Page size for requests without one (default: 20)
/// - `LOGGATE_DEFAULT_WINDOW_SECS`: Search window for requests without bounds (default: 3600)
/// - `LOGGATE_FIELDS_FILE`: JSON file of declared table fields (optional)
#[derive(Debug, Clone)]
pub struct Config {
    /// The host address to bind to.
    pub host: String,
    /// The port to listen on.
    pub port: u16,
    /// Defaults applied to incoming search requests.
    pub query_defaults: QueryDefaults,
    /// Path of the declared fields file, if any.
    pub fields_file: Option<PathBuf>,
}

/// Reads and parses an optional environment variable.
fn parse_env<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    std::env::var(name)
        .ok()
        .map(|v| v.parse::<T>())
        .transpose()
        .with_context(|| format!("Invalid value for {name}"))
}

impl Config {
    /// Creates a new configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `LOGGATE_PORT` is set but cannot be parsed as a valid port number
    /// - A query default is set but cannot be parsed or is not positive
    pub fn from_env() -> Result<Self> {
        let host = std::env::var("LOGGATE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = parse_env("LOGGATE_PORT")?.unwrap_or(8080);

        let defaults = QueryDefaults::default();
        let query_defaults = QueryDefaults::new(
            parse_env("LOGGATE_DEFAULT_PAGE_SIZE")?.unwrap_or(defaults.page_size),
            parse_env("LOGGATE_DEFAULT_WINDOW_SECS")?.unwrap_or(defaults.window_secs),
        );
        query_defaults
            .validate()
            .map_err(anyhow::Error::msg)
            .context("Invalid query defaults")?;

        let fields_file = std::env::var("LOGGATE_FIELDS_FILE").ok().map(PathBuf::from);

        Ok(Self {
            host,
            port,
            query_defaults,
            fields_file,
        })
    }

    /// Returns the socket address for binding.
    ///
    /// # Panics
    ///
    /// Panics if the host and port combination cannot be parsed as a valid socket address.
    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("Invalid socket address from config")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            query_defaults: QueryDefaults::default(),
            fields_file: None,
        }
    }
}
