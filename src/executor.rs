//! Query Executor
//!
//! Runs parameterized read queries on a pooled connection and materializes
//! the complete result set into owned Rust values. Parameters are always
//! bound natively by the driver, never interpolated into SQL text.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use tokio_postgres::types::{ToSql, Type};
use tokio_postgres::Row;
use tracing::{debug, warn};

use crate::error::{OpsError, Result};
use crate::pool::PgConn;

/// A fully materialized query result
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    /// Column names in query order
    pub columns: Vec<String>,
    /// Row-major cell values
    pub rows: Vec<Vec<CellValue>>,
}

impl ResultSet {
    /// Whether the query returned zero rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One cell of a result set
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl CellValue {
    /// Render the cell for tabular output
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            CellValue::Null => "NULL".to_string(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Int(i) => i.to_string(),
            CellValue::Float(f) => f.to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Timestamp(ts) => ts.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
        }
    }

    /// Interpret the cell as a byte count, for size aggregation
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Int(i) => Some(*i),
            _ => None,
        }
    }
}

/// A query parameter bound natively by the driver
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Int(i64),
    Bool(bool),
}

impl SqlParam {
    fn as_to_sql(&self) -> &(dyn ToSql + Sync) {
        match self {
            SqlParam::Text(s) => s,
            SqlParam::Int(i) => i,
            SqlParam::Bool(b) => b,
        }
    }
}

/// Execute a read query and materialize every row
///
/// An empty result is `Ok` with zero rows, never an error.
///
/// # Errors
///
/// Returns `Query` when preparation or execution fails.
pub async fn execute(conn: &PgConn, sql: &str, params: &[SqlParam]) -> Result<ResultSet> {
    debug!(database = %conn.database(), sql, ?params, "executing query");

    let refs: Vec<&(dyn ToSql + Sync)> = params.iter().map(SqlParam::as_to_sql).collect();
    let statement = conn
        .client()
        .prepare(sql)
        .await
        .map_err(|e| OpsError::query(format!("failed to prepare statement: {e}")))?;
    let rows = conn
        .client()
        .query(&statement, &refs)
        .await
        .map_err(|e| OpsError::query(e.to_string()))?;

    let columns: Vec<String> =
        statement.columns().iter().map(|c| c.name().to_string()).collect();
    let rows = rows.iter().map(convert_row).collect::<Result<Vec<_>>>()?;

    Ok(ResultSet { columns, rows })
}

/// Execute a query and return its first row, or `None` for an empty result
///
/// `None` is distinct from a row whose cells are all `CellValue::Null`.
///
/// # Errors
///
/// Returns `Query` when preparation or execution fails.
pub async fn execute_single(
    conn: &PgConn,
    sql: &str,
    params: &[SqlParam],
) -> Result<Option<Vec<CellValue>>> {
    let mut result = execute(conn, sql, params).await?;
    if result.rows.is_empty() {
        return Ok(None);
    }
    Ok(Some(result.rows.swap_remove(0)))
}

/// Check whether a named extension is installed in the connected database
///
/// Absence and probe failure both report `false`; this function never
/// surfaces an error to the caller.
pub async fn has_extension(conn: &PgConn, name: &str) -> bool {
    let probe = execute(
        conn,
        "SELECT 1 FROM pg_extension WHERE extname = $1",
        &[SqlParam::Text(name.to_string())],
    )
    .await;
    match probe {
        Ok(result) => !result.is_empty(),
        Err(e) => {
            warn!(extension = name, "extension probe failed: {e}");
            false
        }
    }
}

/// Fetch the server version string
///
/// # Errors
///
/// Returns `Query` when the version query fails.
pub async fn server_version(conn: &PgConn) -> Result<String> {
    let row = execute_single(conn, "SELECT version()", &[]).await?;
    match row.and_then(|cells| cells.into_iter().next()) {
        Some(CellValue::Text(v)) => Ok(v),
        _ => Err(OpsError::query("version() returned an unexpected result")),
    }
}

fn convert_row(row: &Row) -> Result<Vec<CellValue>> {
    (0..row.len()).map(|idx| convert_cell(row, idx)).collect()
}

/// Convert one driver cell into an owned value by its PostgreSQL type
fn convert_cell(row: &Row, idx: usize) -> Result<CellValue> {
    let column = &row.columns()[idx];
    let name = column.name();
    let map_err = |e: tokio_postgres::Error| {
        OpsError::query(format!("failed to read column '{name}': {e}"))
    };

    let value = match *column.type_() {
        Type::BOOL => row
            .try_get::<_, Option<bool>>(idx)
            .map_err(map_err)?
            .map_or(CellValue::Null, CellValue::Bool),
        Type::INT2 => row
            .try_get::<_, Option<i16>>(idx)
            .map_err(map_err)?
            .map_or(CellValue::Null, |v| CellValue::Int(i64::from(v))),
        Type::INT4 => row
            .try_get::<_, Option<i32>>(idx)
            .map_err(map_err)?
            .map_or(CellValue::Null, |v| CellValue::Int(i64::from(v))),
        Type::INT8 => row
            .try_get::<_, Option<i64>>(idx)
            .map_err(map_err)?
            .map_or(CellValue::Null, CellValue::Int),
        Type::FLOAT4 => row
            .try_get::<_, Option<f32>>(idx)
            .map_err(map_err)?
            .map_or(CellValue::Null, |v| CellValue::Float(f64::from(v))),
        Type::FLOAT8 => row
            .try_get::<_, Option<f64>>(idx)
            .map_err(map_err)?
            .map_or(CellValue::Null, CellValue::Float),
        Type::VARCHAR | Type::TEXT | Type::BPCHAR | Type::NAME | Type::UNKNOWN => row
            .try_get::<_, Option<String>>(idx)
            .map_err(map_err)?
            .map_or(CellValue::Null, CellValue::Text),
        Type::JSON | Type::JSONB => row
            .try_get::<_, Option<serde_json::Value>>(idx)
            .map_err(map_err)?
            .map_or(CellValue::Null, |v| CellValue::Text(v.to_string())),
        // Binary cells are Base64-encoded so the table stays printable.
        Type::BYTEA => row
            .try_get::<_, Option<Vec<u8>>>(idx)
            .map_err(map_err)?
            .map_or(CellValue::Null, |v| CellValue::Text(BASE64.encode(v))),
        Type::UUID => row
            .try_get::<_, Option<uuid::Uuid>>(idx)
            .map_err(map_err)?
            .map_or(CellValue::Null, |v| CellValue::Text(v.to_string())),
        Type::TIMESTAMP => row
            .try_get::<_, Option<NaiveDateTime>>(idx)
            .map_err(map_err)?
            .map_or(CellValue::Null, |v| CellValue::Timestamp(v.and_utc())),
        Type::TIMESTAMPTZ => row
            .try_get::<_, Option<DateTime<Utc>>>(idx)
            .map_err(map_err)?
            .map_or(CellValue::Null, CellValue::Timestamp),
        Type::DATE => row
            .try_get::<_, Option<NaiveDate>>(idx)
            .map_err(map_err)?
            .map_or(CellValue::Null, |v| CellValue::Text(v.to_string())),
        Type::TIME => row
            .try_get::<_, Option<NaiveTime>>(idx)
            .map_err(map_err)?
            .map_or(CellValue::Null, |v| CellValue::Text(v.to_string())),
        Type::OID => row
            .try_get::<_, Option<u32>>(idx)
            .map_err(map_err)?
            .map_or(CellValue::Null, |v| CellValue::Int(i64::from(v))),
        // Numeric, interval, inet, arrays, and other exotic types arrive
        // here; catalog statements cast them to text server-side, so a
        // conversion failure means a statement is missing its cast.
        _ => row
            .try_get::<_, Option<String>>(idx)
            .map_err(|e| {
                OpsError::query(format!(
                    "cannot render column '{name}' of type '{}' as text: {e}",
                    column.type_().name()
                ))
            })?
            .map_or(CellValue::Null, CellValue::Text),
    };

    Ok(value)
}
