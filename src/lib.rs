//! pgops - PostgreSQL Operations MCP Server
//!
//! pgops exposes a fixed catalog of PostgreSQL server introspection tools
//! (databases, tables, users, sessions, query statistics, sizes, settings)
//! over the Model Context Protocol, for use by AI agents monitoring and
//! operating a PostgreSQL server.
//!
//! # Core Principles
//! - Read-only by construction (the statement catalog is fixed and reviewed)
//! - Parameters are always bound natively, never spliced into SQL text
//! - The password never appears in any output, log line, or error message
//! - No fault crosses a tool boundary: every failure becomes an
//!   `Error: `-prefixed text block
//!
//! # Module Organization
//! - [`error`] - Error taxonomy and handling
//! - [`config`] - Environment-derived connection settings
//! - [`pool`] - Bounded, database-keyed connection pool
//! - [`executor`] - Parameterized query execution and extension probing
//! - [`format`] - Table rendering and scalar humanizers
//! - [`catalog`] - The fixed statement catalog
//! - [`ops`] - Tool operations and the error-to-text boundary
//! - [`mcp`] - MCP server (manual JSON-RPC 2.0 over stdio)

pub mod catalog;
pub mod config;
pub mod error;
pub mod executor;
pub mod format;
pub mod mcp;
pub mod ops;
pub mod pool;

// Re-export commonly used types for convenience
pub use catalog::{clamp_limit, ToolSpec, MAX_LIMIT, TOOLS};
pub use config::{ConnectionSettings, SanitizedSettings};
pub use error::{OpsError, Result};
pub use executor::{CellValue, ResultSet, SqlParam};
pub use format::{format_bytes, format_duration, render_table};
pub use ops::{Operations, ToolArgs};
pub use pool::{Connect, PgConnector, PgPool, Pool, PoolGuard, PooledConnection};
