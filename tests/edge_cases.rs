//! Edge Case Testing
//!
//! Boundary conditions across the tool surface:
//! - Sanitized settings under adversarial credential values
//! - The error-to-text boundary and its fixed messages
//! - Empty results vs failed queries producing distinct text
//! - Catalog integrity (names, limits, read-only statements)

use pgops::error::OpsError;
use pgops::format::{render_table, NO_DATA};
use pgops::ops::render_outcome;
use pgops::{clamp_limit, CellValue, ConnectionSettings, ResultSet, ToolArgs, TOOLS};

// ============================================================================
// Sanitized settings
// ============================================================================

fn settings(user: &str, password: &str) -> ConnectionSettings {
    ConnectionSettings {
        host: "db.internal".to_string(),
        port: 5433,
        user: user.to_string(),
        password: password.to_string(),
        database: "appdb".to_string(),
    }
}

#[test]
fn test_sanitized_output_never_contains_password() {
    let settings = settings("monitor", "s3cr3t-hunter2");
    let json = serde_json::to_string(&settings.sanitized()).unwrap();
    assert!(!json.contains("s3cr3t-hunter2"));
    assert!(!json.contains("password"));
}

#[test]
fn test_sanitized_output_with_password_equal_to_username() {
    // The adversarial case: the password string legitimately appears as the
    // user field; only the password *field* must be absent.
    let settings = settings("monitor", "monitor");
    let value = serde_json::to_value(settings.sanitized()).unwrap();
    let object = value.as_object().unwrap();
    assert!(!object.contains_key("password"));
    assert_eq!(object.len(), 4, "host, port, user, database only");
    assert_eq!(value["user"], "monitor");
}

#[test]
fn test_debug_output_masks_password() {
    let settings = settings("monitor", "hunter2");
    let debugged = format!("{settings:?}");
    assert!(!debugged.contains("hunter2"));
    assert!(debugged.contains("***"));
}

// ============================================================================
// Error boundary
// ============================================================================

#[test]
fn test_every_error_variant_renders_with_prefix() {
    let errors = vec![
        OpsError::connectivity("refused"),
        OpsError::pool_exhausted("timed out"),
        OpsError::query("syntax error"),
        OpsError::not_installed("pg_stat_monitor"),
        OpsError::invalid_input("unknown tool"),
        OpsError::config("bad port"),
    ];
    for err in errors {
        let text = render_outcome(Err(err));
        assert!(text.starts_with("Error: "), "boundary must prefix: {text}");
    }
}

#[test]
fn test_not_installed_message_is_verbatim() {
    assert_eq!(
        render_outcome(Err(OpsError::not_installed("pg_stat_statements"))),
        "Error: pg_stat_statements extension is not installed or enabled"
    );
}

#[test]
fn test_empty_result_text_differs_from_failure_text() {
    let empty = ResultSet { columns: vec!["pid".to_string()], rows: vec![] };
    let no_rows = render_outcome(Ok(render_table(&empty, "Active Connections")));
    let failed = render_outcome(Err(OpsError::query("relation does not exist")));

    assert!(no_rows.contains(NO_DATA));
    assert!(!no_rows.starts_with("Error:"));
    assert!(failed.starts_with("Error: "));
    assert!(!failed.contains(NO_DATA));
}

// ============================================================================
// Catalog and argument handling
// ============================================================================

#[test]
fn test_limit_clamp_extremes() {
    assert_eq!(clamp_limit(i64::MIN), 1);
    assert_eq!(clamp_limit(0), 1);
    assert_eq!(clamp_limit(1), 1);
    assert_eq!(clamp_limit(100), 100);
    assert_eq!(clamp_limit(i64::MAX), 100);
}

#[test]
fn test_tool_args_ignore_unknown_fields() {
    let args: ToolArgs = serde_json::from_value(serde_json::json!({
        "limit": 5,
        "verbose": true,
        "nested": {"x": 1},
    }))
    .unwrap();
    assert_eq!(args.limit, Some(5));
}

#[test]
fn test_catalog_statements_never_interpolate() {
    // Bound parameters only; no formatting placeholders in SQL text.
    for tool in TOOLS {
        assert!(!tool.sql.contains("{}"), "{} must not format-interpolate", tool.name);
        assert!(!tool.sql.contains("%s"), "{} must not format-interpolate", tool.name);
    }
}

#[test]
fn test_wide_unicode_values_render_without_panic() {
    let result = ResultSet {
        columns: vec!["query".to_string()],
        rows: vec![vec![CellValue::Text("SELECT '데이터베이스' || '🚀'".repeat(20))]],
    };
    let table = render_table(&result, "Queries");
    assert!(table.lines().nth(3).unwrap().ends_with("..."));
}
