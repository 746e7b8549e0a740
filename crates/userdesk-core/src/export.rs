//! CSV export of user listings
//!
//! Renders the rows a reports view is showing into a CSV document with the
//! same columns and lenient timestamp formatting as the original console.
//! Pure string building; writing to disk is a thin helper on top.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::path::Path;

use crate::error::Result;
use crate::models::User;

const HEADERS: [&str; 5] = ["ID", "Name", "Email", "Created At", "Updated At"];

/// Render users as a CSV document, header row included
pub fn render_csv(users: &[User]) -> String {
    let mut lines = vec![HEADERS.join(",")];

    for user in users {
        let id = user.id.map(|id| id.to_string()).unwrap_or_default();
        lines.push(
            [
                id,
                quote(&user.name),
                quote(&user.email),
                quote(&format_timestamp(user.created_at.as_deref())),
                quote(&format_timestamp(user.updated_at.as_deref())),
            ]
            .join(","),
        );
    }

    lines.join("\n")
}

/// Render and write the document to the given path
pub fn write_csv(users: &[User], path: &Path) -> Result<()> {
    std::fs::write(path, render_csv(users))?;
    Ok(())
}

/// Default export file name for the given date, e.g.
/// `user-report-2026-08-30.csv`
pub fn default_file_name(date: NaiveDate) -> String {
    format!("user-report-{}.csv", date.format("%Y-%m-%d"))
}

/// Format a backend timestamp for humans. Accepts ISO-8601 with or
/// without an offset; absent values become "N/A" and undecodable ones
/// are passed through untouched rather than dropped.
pub fn format_timestamp(raw: Option<&str>) -> String {
    let raw = match raw {
        Some(raw) if !raw.is_empty() => raw,
        _ => return "N/A".to_string(),
    };

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return ts.format("%b %d, %Y %H:%M:%S").to_string();
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return ts.format("%b %d, %Y %H:%M:%S").to_string();
    }

    raw.to_string()
}

/// Quote a CSV field, doubling embedded quotes
fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
