//! pgops CLI Entry Point
//!
//! Starts the MCP server on stdio. All protocol traffic uses stdout;
//! logs go to stderr only.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use pgops::{mcp, ConnectionSettings, Operations, PgConnector, Pool};

/// pgops - PostgreSQL Operations MCP Server
#[derive(Parser)]
#[command(name = "pgops")]
#[command(about = "PostgreSQL server introspection tools over MCP")]
#[command(version)]
struct Cli {
    /// Log level (error, warn, info, debug, trace); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP server on stdio
    Serve {
        /// Maximum number of pooled connections
        #[arg(long, default_value_t = 5)]
        pool_size: usize,

        /// How long to wait for a free pool slot, in milliseconds
        #[arg(long, default_value_t = 30_000)]
        acquire_timeout_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let Commands::Serve { pool_size, acquire_timeout_ms } =
        cli.command.unwrap_or(Commands::Serve { pool_size: 5, acquire_timeout_ms: 30_000 });

    let settings = ConnectionSettings::from_env()?;
    let sanitized = settings.sanitized();
    info!(
        host = %sanitized.host,
        port = sanitized.port,
        database = %sanitized.database,
        pool_size,
        "starting pgops MCP server"
    );

    let default_database = settings.database.clone();
    let pool = Pool::new(
        PgConnector::new(settings),
        default_database,
        pool_size,
        Duration::from_millis(acquire_timeout_ms),
    );
    let ops = Arc::new(Operations::new(pool, sanitized));

    mcp::serve(ops).await
}

/// Log level precedence: `--log-level` flag, then `RUST_LOG`, then info
fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(format!("pgops={level}")),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pgops=info")),
    };
    // stdout carries the protocol; logs must stay on stderr
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
