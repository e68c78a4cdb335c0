//! Loggate CLI
//!
//! Command-line interface running log searches and schema discovery directly
//! against a `ClickHouse` instance. Results are printed as JSON.
//!
//! # Usage
//!
//! ```bash
//! loggate --help
//! loggate databases
//! loggate tables logs
//! loggate search logs app --query "level = 'error'" --page-size 50
//! loggate groups logs app --field level
//! ```

#![deny(unsafe_code)]

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use shared::catalog::Catalog;
use shared::gateway::Gateway;
use shared::models::QueryRequest;
use shared::storage::{
    ClickHouseExecutor, ConnectionHandle, FieldCatalog, InMemoryFieldCatalog,
    InMemoryInstanceRegistry, QueryExecutor,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Loggate CLI - log search over `ClickHouse`
#[derive(Parser)]
#[command(name = "loggate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// `ClickHouse` HTTP URL
    #[arg(long, env = "LOGGATE_DB_URL", default_value = "http://localhost:8123")]
    db_url: String,

    /// `ClickHouse` user
    #[arg(long, env = "LOGGATE_DB_USER", default_value = "default")]
    user: String,

    /// `ClickHouse` password
    #[arg(long, env = "LOGGATE_DB_PASSWORD", default_value = "", hide_env_values = true)]
    password: String,

    /// JSON file of declared table fields
    #[arg(long, env = "LOGGATE_FIELDS_FILE")]
    fields_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List databases
    Databases,
    /// List the log tables of a database
    Tables {
        /// Database name
        database: String,
    },
    /// Search a log table
    Search(SearchArgs),
    /// Count matching rows per value of a field
    Groups {
        #[command(flatten)]
        search: SearchArgs,
        /// Field to group by
        #[arg(long)]
        field: String,
    },
}

#[derive(Args)]
struct SearchArgs {
    /// Database name
    database: String,
    /// Table name
    table: String,
    /// Filter expression, embedded verbatim into the WHERE clause
    #[arg(long, default_value = "")]
    query: String,
    /// Window start, unix seconds (default: one hour before now)
    #[arg(long, default_value_t = 0)]
    st: i64,
    /// Window end, unix seconds (default: now)
    #[arg(long, default_value_t = 0)]
    et: i64,
    /// One-based page number
    #[arg(long, default_value_t = 1)]
    page: u32,
    /// Rows per page
    #[arg(long, default_value_t = 0)]
    page_size: u32,
}

#[derive(Serialize)]
struct GroupsOutput {
    field: String,
    groups: BTreeMap<String, u64>,
}

/// A connection plus the services running on it.
struct Session {
    conn: ConnectionHandle,
    gateway: Gateway,
    catalog: Catalog,
}

impl Session {
    fn new(executor: Arc<dyn QueryExecutor>, fields: Arc<dyn FieldCatalog>) -> Result<Self> {
        let conn = ConnectionHandle::new(1, "default", "ch", executor);
        let registry = InMemoryInstanceRegistry::new_shared();
        registry
            .register(conn.clone())
            .context("Failed to register instance")?;

        Ok(Self {
            conn,
            gateway: Gateway::new(registry, fields),
            catalog: Catalog::new(),
        })
    }

    fn request(&self, args: SearchArgs) -> QueryRequest {
        let raw = QueryRequest::new(args.database, args.table)
            .with_instance(self.conn.datasource_type(), self.conn.instance_name())
            .with_query(args.query)
            .with_time_range(args.st, args.et)
            .with_page(args.page, args.page_size);
        self.gateway.prepare(raw)
    }

    fn run(&self, command: Commands) -> Result<serde_json::Value> {
        let output = match command {
            Commands::Databases => serde_json::to_value(self.catalog.list_databases(&self.conn)?)?,
            Commands::Tables { database } => {
                serde_json::to_value(self.catalog.list_tables(&self.conn, &database)?)?
            }
            Commands::Search(args) => {
                let req = self.request(args);
                let result = self.gateway.search(&self.conn, &req)?;
                for degradation in &result.degraded {
                    tracing::warn!(?degradation, "Partial result");
                }
                serde_json::to_value(result)?
            }
            Commands::Groups { search, field } => {
                let req = self.request(search).with_group_field(field.clone());
                let groups = self.gateway.group_counts(&self.conn, &req)?;
                serde_json::to_value(GroupsOutput { field, groups })?
            }
        };
        Ok(output)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let client = clickhouse::Client::default()
        .with_url(&cli.db_url)
        .with_user(&cli.user)
        .with_password(&cli.password);
    let fields: Arc<dyn FieldCatalog> = match &cli.fields_file {
        Some(path) => Arc::new(InMemoryFieldCatalog::from_json_file(path)?),
        None => InMemoryFieldCatalog::new_shared(),
    };

    let session = Session::new(ClickHouseExecutor::new_shared(Arc::new(client)), fields)?;
    let output = session.run(cli.command)?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
