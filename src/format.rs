//! Output Formatting
//!
//! Renders materialized result sets as aligned text tables for display in a
//! tool transcript, plus the scalar humanizers used when reporting totals
//! outside a table body.

use crate::executor::ResultSet;

/// Widest a rendered column may be, including the truncation marker
pub const MAX_COLUMN_WIDTH: usize = 80;

const TRUNCATION_MARKER: &str = "...";

/// Text emitted in place of a table when a query returns zero rows
pub const NO_DATA: &str = "No data available";

/// Render a result set as a fixed-width text table under a title line
///
/// Column widths are the larger of the header and the widest rendered value,
/// capped at [`MAX_COLUMN_WIDTH`]. Values over the cap are truncated to
/// exactly the cap with a trailing marker. An empty result renders the
/// title followed by a single "no data" line instead of an empty table.
#[must_use]
pub fn render_table(result: &ResultSet, title: &str) -> String {
    let mut out = String::new();
    out.push_str(title);
    out.push('\n');

    if result.rows.is_empty() {
        out.push_str(NO_DATA);
        return out;
    }

    let headers: Vec<String> = result.columns.iter().map(|c| truncate(c)).collect();
    let rendered: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| row.iter().map(|cell| truncate(&cell.render())).collect())
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rendered {
        for (i, cell) in row.iter().enumerate() {
            let len = cell.chars().count();
            if len > widths[i] {
                widths[i] = len;
            }
        }
    }

    let header_line = pad_row(&headers, &widths);
    let separator = "-".repeat(header_line.chars().count());
    out.push_str(&header_line);
    out.push('\n');
    out.push_str(&separator);
    for row in &rendered {
        out.push('\n');
        out.push_str(&pad_row(row, &widths));
    }
    out
}

fn pad_row(cells: &[String], widths: &[usize]) -> String {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join(" | ");
    line.trim_end().to_string()
}

fn truncate(value: &str) -> String {
    if value.chars().count() <= MAX_COLUMN_WIDTH {
        return value.to_string();
    }
    let kept: String = value.chars().take(MAX_COLUMN_WIDTH - TRUNCATION_MARKER.len()).collect();
    format!("{kept}{TRUNCATION_MARKER}")
}

/// Humanize a byte count using 1024-based units
///
/// One decimal of precision above bytes: `1536` renders as `"1.5 KB"`.
#[must_use]
pub fn format_bytes(bytes: i64) -> String {
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

/// Humanize a duration given in seconds
///
/// Sub-second precision is dropped above one minute.
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    if seconds < 1.0 {
        return format!("{:.0} ms", seconds * 1000.0);
    }
    if seconds < 60.0 {
        return format!("{seconds:.1} s");
    }
    // Round to whole seconds before splitting units so a sub-unit never
    // displays as 60.
    let total = seconds.round() as u64;
    if total < 3600 {
        format!("{}m {}s", total / 60, total % 60)
    } else if total < 86_400 {
        format!("{}h {}m", total / 3600, (total % 3600) / 60)
    } else {
        format!("{}d {}h", total / 86_400, (total % 86_400) / 3600)
    }
}
