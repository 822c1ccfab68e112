//! Tool Operations
//!
//! One generic execute-and-render pipeline for the data-driven catalog tools,
//! plus the composite tools that combine several probes or post-process their
//! result set. Every public entry point converts errors into a text block
//! prefixed with `Error: ` so no fault ever escapes to the caller.

use serde::Deserialize;
use tracing::warn;

use crate::catalog::{self, ToolParam, ToolSpec};
use crate::config::SanitizedSettings;
use crate::error::{OpsError, Result};
use crate::executor::{self, ResultSet, SqlParam};
use crate::format::{format_bytes, render_table};
use crate::pool::PgPool;

/// Arguments a caller may pass to any tool; unused fields are ignored
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ToolArgs {
    /// Target database override for tools that support one
    #[serde(rename = "database_name")]
    pub database: Option<String>,

    /// Row limit for limit-taking tools, clamped server-side of the caller
    pub limit: Option<i64>,

    /// Schema for table size analysis
    #[serde(rename = "schema_name")]
    pub schema: Option<String>,

    /// Configuration parameter name
    #[serde(rename = "config_name")]
    pub setting: Option<String>,
}

/// The operation layer shared by all in-flight tool calls
pub struct Operations {
    pool: PgPool,
    sanitized: SanitizedSettings,
}

impl Operations {
    pub fn new(pool: PgPool, sanitized: SanitizedSettings) -> Self {
        Self { pool, sanitized }
    }

    /// Run a tool by name, always returning displayable text
    ///
    /// This is the single error boundary: structured errors from the layers
    /// below are converted here and nowhere else.
    pub async fn run_tool(&self, name: &str, args: &ToolArgs) -> String {
        let outcome = self.dispatch(name, args).await;
        if let Err(e) = &outcome {
            warn!(tool = name, code = e.error_code(), "tool failed: {e}");
        }
        render_outcome(outcome)
    }

    async fn dispatch(&self, name: &str, args: &ToolArgs) -> Result<String> {
        if let Some(spec) = catalog::find_tool(name) {
            return self.run_catalog_tool(spec, args).await;
        }
        match name {
            "get_server_info" => self.server_info().await,
            "get_database_size_info" => self.database_size_info().await,
            "get_table_size_info" => {
                self.table_size_info(args.schema.as_deref().unwrap_or("public")).await
            }
            "get_postgresql_config" => self.postgresql_config(args.setting.as_deref()).await,
            _ => Err(OpsError::invalid_input(format!("unknown tool: {name}"))),
        }
    }

    /// Shared pipeline: gate, bind, execute, render
    async fn run_catalog_tool(&self, spec: &ToolSpec, args: &ToolArgs) -> Result<String> {
        let database = match spec.param {
            Some(ToolParam::Database) => args.database.as_deref(),
            _ => None,
        };
        let conn = self.pool.acquire(database).await?;

        if let Some(extension) = spec.requires_extension {
            if !executor::has_extension(&conn, extension).await {
                return Err(OpsError::not_installed(extension));
            }
        }

        let (params, title) = match spec.param {
            Some(ToolParam::Limit { default }) => {
                let limit = catalog::clamp_limit(args.limit.unwrap_or(default));
                (vec![SqlParam::Int(limit)], spec.title.replace("{limit}", &limit.to_string()))
            }
            Some(ToolParam::Database) => {
                let title = match database {
                    Some(db) => format!("{} (Database: {db})", spec.title),
                    None => spec.title.to_string(),
                };
                (Vec::new(), title)
            }
            None => (Vec::new(), spec.title.to_string()),
        };

        let result = executor::execute(&conn, spec.sql, &params).await?;
        Ok(render_table(&result, &title))
    }

    /// Server version, sanitized connection settings, and extension status
    async fn server_info(&self) -> Result<String> {
        let conn = self.pool.acquire(None).await?;
        let version = executor::server_version(&conn).await?;
        let stat_statements = executor::has_extension(&conn, "pg_stat_statements").await;
        let stat_monitor = executor::has_extension(&conn, "pg_stat_monitor").await;

        let mark = |installed: bool| if installed { "✓ Installed" } else { "✗ Not installed" };
        let info = &self.sanitized;
        Ok(format!(
            "=== PostgreSQL Server Information ===\n\n\
             Version: {version}\n\
             Host: {}\n\
             Port: {}\n\
             Database: {}\n\
             User: {}\n\n\
             === Extension Status ===\n\
             pg_stat_statements: {}\n\
             pg_stat_monitor: {}",
            info.host,
            info.port,
            info.database,
            info.user,
            mark(stat_statements),
            mark(stat_monitor),
        ))
    }

    /// All database sizes plus a humanized grand total
    async fn database_size_info(&self) -> Result<String> {
        let conn = self.pool.acquire(None).await?;
        let result = executor::execute(&conn, catalog::DATABASE_SIZES_SQL, &[]).await?;
        let (display, total) = split_byte_total(result, "size_bytes")?;
        Ok(format!(
            "Total size of all databases: {}\n\n{}",
            format_bytes(total),
            render_table(&display, "Database Sizes")
        ))
    }

    /// Table, index, and total sizes for one schema plus a grand total
    async fn table_size_info(&self, schema: &str) -> Result<String> {
        let conn = self.pool.acquire(None).await?;
        let result = executor::execute(
            &conn,
            catalog::TABLE_SIZES_SQL,
            &[SqlParam::Text(schema.to_string())],
        )
        .await?;
        if result.is_empty() {
            return Ok(format!("No tables found in schema '{schema}'"));
        }
        let (display, total) = split_byte_total(result, "total_size_bytes")?;
        Ok(format!(
            "Total size of tables in schema '{schema}': {}\n\n{}",
            format_bytes(total),
            render_table(&display, &format!("Table Sizes in Schema '{schema}'"))
        ))
    }

    /// One named setting in full detail, or the key-parameter overview
    async fn postgresql_config(&self, setting: Option<&str>) -> Result<String> {
        let conn = self.pool.acquire(None).await?;
        match setting {
            Some(name) => {
                let result = executor::execute(
                    &conn,
                    catalog::SETTING_DETAIL_SQL,
                    &[SqlParam::Text(name.to_string())],
                )
                .await?;
                if result.is_empty() {
                    return Ok(format!("Configuration parameter '{name}' not found"));
                }
                Ok(render_table(&result, &format!("Configuration: {name}")))
            }
            None => {
                let result = executor::execute(&conn, catalog::SETTING_OVERVIEW_SQL, &[]).await?;
                Ok(render_table(&result, "Key PostgreSQL Configuration Parameters"))
            }
        }
    }
}

/// Names of the composite tools not covered by the catalog records
pub const COMPOSITE_TOOLS: &[&str] = &[
    "get_server_info",
    "get_database_size_info",
    "get_table_size_info",
    "get_postgresql_config",
];

/// Convert an operation outcome into displayable text
///
/// Failures become `Error: ` prefixed messages; this is the only place the
/// prefix is applied.
#[must_use]
pub fn render_outcome(outcome: Result<String>) -> String {
    match outcome {
        Ok(text) => text,
        Err(e) => format!("Error: {e}"),
    }
}

/// Remove a raw byte-count column and return its sum alongside the rest
fn split_byte_total(mut result: ResultSet, column: &str) -> Result<(ResultSet, i64)> {
    let idx = result
        .columns
        .iter()
        .position(|c| c == column)
        .ok_or_else(|| OpsError::query(format!("result is missing column '{column}'")))?;
    result.columns.remove(idx);
    let mut total: i64 = 0;
    for row in &mut result.rows {
        let cell = row.remove(idx);
        total += cell.as_i64().unwrap_or(0);
    }
    Ok((result, total))
}
