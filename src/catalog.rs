//! Tool Catalog
//!
//! The fixed, reviewed set of introspection statements exposed as tools.
//! Simple list-style tools are plain data records consumed by one generic
//! execute-and-render pipeline; the handful of composite tools (server info,
//! size summaries, configuration lookup) keep their statements here too so
//! every piece of SQL in the binary lives in this module.
//!
//! Statements are read-only catalog queries. Values without a native Rust
//! mapping (inet, numeric, interval) are cast to text server-side.

/// Upper bound callers may request for row-limited tools
pub const MAX_LIMIT: i64 = 100;

/// Clamp a caller-supplied row limit into the supported range
#[must_use]
pub fn clamp_limit(limit: i64) -> i64 {
    limit.clamp(1, MAX_LIMIT)
}

/// How a catalog tool consumes its single optional input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolParam {
    /// Optional target database; keys the pool, never bound into SQL
    Database,
    /// Row limit bound as `$1`, clamped to `1..=MAX_LIMIT`
    Limit { default: i64 },
}

/// One data-driven tool: a statement plus its render title
#[derive(Debug, Clone, Copy)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    /// Table title; `{limit}` is substituted for limit-taking tools
    pub title: &'static str,
    pub sql: &'static str,
    pub param: Option<ToolParam>,
    /// Extension that must be installed before the statement can run
    pub requires_extension: Option<&'static str>,
}

/// Every data-driven tool, in the order they are listed to callers
pub const TOOLS: &[ToolSpec] = &[
    ToolSpec {
        name: "get_database_list",
        description: "List all databases with owner, encoding, size, and connection limit",
        title: "Database List",
        sql: "\
SELECT
    d.datname AS database_name,
    u.usename AS owner,
    d.encoding,
    pg_encoding_to_char(d.encoding) AS encoding_name,
    CASE WHEN d.datconnlimit = -1 THEN 'unlimited'
         ELSE d.datconnlimit::text END AS connection_limit,
    pg_size_pretty(pg_database_size(d.datname)) AS size
FROM pg_database d
JOIN pg_user u ON d.datdba = u.usesysid
ORDER BY d.datname",
        param: None,
        requires_extension: None,
    },
    ToolSpec {
        name: "get_table_list",
        description: "List user tables with schema, owner, and total size",
        title: "Table List",
        sql: "\
SELECT
    schemaname AS schema_name,
    tablename AS table_name,
    tableowner AS owner,
    pg_size_pretty(pg_total_relation_size(schemaname||'.'||tablename)) AS size
FROM pg_tables
WHERE schemaname NOT IN ('information_schema', 'pg_catalog')
ORDER BY schemaname, tablename",
        param: Some(ToolParam::Database),
        requires_extension: None,
    },
    ToolSpec {
        name: "get_user_list",
        description: "List database user accounts and their privileges",
        title: "Database Users",
        sql: "\
SELECT
    usename AS username,
    usesysid AS user_id,
    CASE WHEN usesuper THEN 'Yes' ELSE 'No' END AS is_superuser,
    CASE WHEN usecreatedb THEN 'Yes' ELSE 'No' END AS can_create_db,
    CASE WHEN usecatupd THEN 'Yes' ELSE 'No' END AS can_update_catalog,
    valuntil AS valid_until
FROM pg_user
ORDER BY usename",
        param: None,
        requires_extension: None,
    },
    ToolSpec {
        name: "get_active_connections",
        description: "Show active sessions with user, database, client, state, and current query",
        title: "Active Connections",
        sql: "\
SELECT
    pid,
    usename AS username,
    datname AS database_name,
    client_addr::text AS client_addr,
    client_port,
    state,
    query_start,
    LEFT(query, 100) AS current_query
FROM pg_stat_activity
WHERE pid <> pg_backend_pid()
ORDER BY query_start DESC",
        param: None,
        requires_extension: None,
    },
    ToolSpec {
        name: "get_pg_stat_statements_top_queries",
        description: "Top queries by total execution time (requires pg_stat_statements)",
        title: "Top {limit} Queries by Total Execution Time (pg_stat_statements)",
        sql: "\
SELECT
    LEFT(query, 100) AS query,
    calls,
    ROUND(total_exec_time::numeric, 2)::text AS total_time_ms,
    ROUND(mean_exec_time::numeric, 2)::text AS mean_time_ms,
    rows,
    ROUND(100.0 * shared_blks_hit /
          NULLIF(shared_blks_hit + shared_blks_read, 0), 2)::text AS hit_percent
FROM pg_stat_statements
ORDER BY total_exec_time DESC
LIMIT $1",
        param: Some(ToolParam::Limit { default: 20 }),
        requires_extension: Some("pg_stat_statements"),
    },
    ToolSpec {
        name: "get_pg_stat_monitor_recent_queries",
        description: "Recently executed queries with client detail (requires pg_stat_monitor)",
        title: "Recent {limit} Queries (pg_stat_monitor)",
        sql: "\
SELECT
    bucket_start_time::text AS bucket_start,
    LEFT(query, 100) AS query,
    calls,
    ROUND(total_exec_time::numeric, 2)::text AS total_time_ms,
    ROUND(mean_exec_time::numeric, 2)::text AS mean_time_ms,
    client_ip::text AS client_ip
FROM pg_stat_monitor
ORDER BY bucket_start_time DESC
LIMIT $1",
        param: Some(ToolParam::Limit { default: 20 }),
        requires_extension: Some("pg_stat_monitor"),
    },
    ToolSpec {
        name: "get_index_usage_stats",
        description: "Index scan statistics with a usage-level classification",
        title: "Index Usage Statistics",
        sql: "\
SELECT
    schemaname AS schema_name,
    relname AS table_name,
    indexrelname AS index_name,
    idx_scan AS scans,
    idx_tup_read AS tuples_read,
    idx_tup_fetch AS tuples_fetched,
    CASE
        WHEN idx_scan = 0 THEN 'Never used'
        WHEN idx_scan < 100 THEN 'Low usage'
        WHEN idx_scan < 1000 THEN 'Medium usage'
        ELSE 'High usage'
    END AS usage_level
FROM pg_stat_user_indexes
ORDER BY idx_scan DESC, schemaname, relname, indexrelname",
        param: None,
        requires_extension: None,
    },
    ToolSpec {
        name: "get_vacuum_analyze_stats",
        description: "Per-table VACUUM/ANALYZE history and tuple activity",
        title: "VACUUM/ANALYZE Statistics",
        sql: "\
SELECT
    schemaname AS schema_name,
    relname AS table_name,
    last_vacuum,
    last_autovacuum,
    last_analyze,
    last_autoanalyze,
    vacuum_count,
    autovacuum_count,
    analyze_count,
    autoanalyze_count,
    n_tup_ins AS inserts,
    n_tup_upd AS updates,
    n_tup_del AS deletes
FROM pg_stat_user_tables
ORDER BY schemaname, relname",
        param: None,
        requires_extension: None,
    },
];

/// Look up a data-driven tool by name
#[must_use]
pub fn find_tool(name: &str) -> Option<&'static ToolSpec> {
    TOOLS.iter().find(|t| t.name == name)
}

// ----------------------------------------------------------------------------
// Statements used by the composite tools
// ----------------------------------------------------------------------------

/// Per-database sizes, largest first, with raw bytes for the total line
pub const DATABASE_SIZES_SQL: &str = "\
SELECT
    datname AS database_name,
    pg_size_pretty(pg_database_size(datname)) AS size,
    pg_database_size(datname) AS size_bytes
FROM pg_database
WHERE datistemplate = false
ORDER BY pg_database_size(datname) DESC";

/// Per-table sizes within one schema, largest first
pub const TABLE_SIZES_SQL: &str = "\
SELECT
    schemaname AS schema_name,
    tablename AS table_name,
    pg_size_pretty(pg_relation_size(schemaname||'.'||tablename)) AS table_size,
    pg_size_pretty(pg_indexes_size(schemaname||'.'||tablename)) AS index_size,
    pg_size_pretty(pg_total_relation_size(schemaname||'.'||tablename)) AS total_size,
    pg_total_relation_size(schemaname||'.'||tablename) AS total_size_bytes
FROM pg_tables
WHERE schemaname = $1
ORDER BY pg_total_relation_size(schemaname||'.'||tablename) DESC";

/// Full detail for one named configuration parameter
pub const SETTING_DETAIL_SQL: &str = "\
SELECT
    name,
    setting,
    unit,
    category,
    short_desc,
    context,
    vartype,
    source,
    min_val,
    max_val,
    boot_val,
    reset_val
FROM pg_settings
WHERE name = $1";

/// The key tuning parameters shown when no name is given
pub const SETTING_OVERVIEW_SQL: &str = "\
SELECT
    name,
    setting,
    unit,
    short_desc
FROM pg_settings
WHERE name IN (
    'max_connections',
    'shared_buffers',
    'effective_cache_size',
    'maintenance_work_mem',
    'checkpoint_completion_target',
    'wal_buffers',
    'default_statistics_target',
    'random_page_cost',
    'effective_io_concurrency',
    'work_mem',
    'max_worker_processes',
    'max_parallel_workers_per_gather'
)
ORDER BY name";
