//! Output Validation Tests
//!
//! Validates the rendered text surface of the tool layer:
//! - Table shape (title, header, separator, one line per row)
//! - The "no data" line for empty results
//! - NULL placeholder and column truncation behavior
//! - Byte and duration humanizers

use pgops::format::{format_bytes, format_duration, render_table, MAX_COLUMN_WIDTH, NO_DATA};
use pgops::{CellValue, ResultSet};
use pretty_assertions::assert_eq;

fn result_set(columns: &[&str], rows: Vec<Vec<CellValue>>) -> ResultSet {
    ResultSet { columns: columns.iter().map(|c| (*c).to_string()).collect(), rows }
}

fn text(value: &str) -> CellValue {
    CellValue::Text(value.to_string())
}

// ============================================================================
// Table shape
// ============================================================================

#[test]
fn test_table_has_header_separator_and_row_lines() {
    let table = render_table(
        &result_set(
            &["database_name", "owner"],
            vec![
                vec![text("postgres"), text("postgres")],
                vec![text("appdb"), text("app")],
            ],
        ),
        "Database List",
    );

    let lines: Vec<&str> = table.lines().collect();
    assert_eq!(lines.len(), 5, "title + header + separator + 2 rows");
    assert_eq!(lines[0], "Database List");
    assert!(lines[1].starts_with("database_name"));
    assert!(lines[2].chars().all(|c| c == '-'));
    assert!(lines[3].starts_with("postgres"));
    assert!(lines[4].starts_with("appdb"));
}

#[test]
fn test_row_count_property_holds_for_varied_sizes() {
    for n in [1usize, 7, 50] {
        let rows = (0..n).map(|i| vec![CellValue::Int(i as i64)]).collect();
        let table = render_table(&result_set(&["pid"], rows), "Active Connections");
        assert_eq!(
            table.lines().count(),
            n + 3,
            "N rows must render exactly N+2 lines beyond the title"
        );
    }
}

#[test]
fn test_empty_result_renders_single_no_data_line() {
    let table = render_table(&result_set(&["pid", "state"], vec![]), "Active Connections");
    assert_eq!(table, format!("Active Connections\n{NO_DATA}"));
}

#[test]
fn test_null_placeholder_distinct_from_empty_string() {
    let table = render_table(
        &result_set(&["valid_until"], vec![vec![CellValue::Null], vec![text("")]]),
        "Database Users",
    );
    let lines: Vec<&str> = table.split('\n').collect();
    assert_eq!(lines[3], "NULL");
    assert_eq!(lines[4], "");
}

#[test]
fn test_header_participates_in_column_width() {
    let table = render_table(
        &result_set(&["connection_limit", "x"], vec![vec![text("10"), text("y")]]),
        "Limits",
    );
    let lines: Vec<&str> = table.lines().collect();
    // Narrow values pad out to the header width.
    assert_eq!(lines[1], "connection_limit | x");
    assert_eq!(lines[3], "10               | y");
}

// ============================================================================
// Truncation
// ============================================================================

#[test]
fn test_truncation_boundaries_around_the_cap() {
    let cases = [
        (MAX_COLUMN_WIDTH - 1, false),
        (MAX_COLUMN_WIDTH, false),
        (MAX_COLUMN_WIDTH + 1, true),
        (MAX_COLUMN_WIDTH * 3, true),
    ];
    for (len, truncated) in cases {
        let table = render_table(
            &result_set(&["query"], vec![vec![text(&"x".repeat(len))]]),
            "Queries",
        );
        let cell = table.lines().nth(3).expect("row line").trim_end();
        if truncated {
            assert_eq!(cell.len(), MAX_COLUMN_WIDTH, "input of {len} must render at the cap");
            assert!(cell.ends_with("..."), "truncated value must carry the marker");
        } else {
            assert_eq!(cell.len(), len);
            assert!(!cell.ends_with("..."));
        }
    }
}

// ============================================================================
// Humanizers
// ============================================================================

#[test]
fn test_format_bytes_reference_values() {
    assert_eq!(format_bytes(0), "0 B");
    assert_eq!(format_bytes(1023), "1023 B");
    assert_eq!(format_bytes(1024), "1.0 KB");
    assert_eq!(format_bytes(1536), "1.5 KB");
    assert_eq!(format_bytes(10 * 1024 * 1024), "10.0 MB");
    assert_eq!(format_bytes(1_073_741_824), "1.0 GB");
}

#[test]
fn test_format_duration_unit_selection() {
    assert_eq!(format_duration(0.5), "500 ms");
    assert_eq!(format_duration(42.0), "42.0 s");
    assert_eq!(format_duration(61.0), "1m 1s");
    assert_eq!(format_duration(7200.0), "2h 0m");
    assert_eq!(format_duration(172_800.0), "2d 0h");
}
