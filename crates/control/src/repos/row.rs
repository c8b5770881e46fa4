//! Row reading helpers
//!
//! Nullable columns are stored as empty strings (matching how the writers
//! bind them), so readers translate empty back to `None`.

use chrono::{DateTime, Utc};

use crate::error::{ControlError, Result};

/// Parse a required RFC 3339 timestamp column
pub fn parse_utc(field: &'static str, s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ControlError::invalid(field, e.to_string()))
}

/// Parse an optional RFC 3339 timestamp column
pub fn parse_opt_utc(field: &'static str, s: &str) -> Result<Option<DateTime<Utc>>> {
    if s.is_empty() {
        Ok(None)
    } else {
        parse_utc(field, s).map(Some)
    }
}

/// Empty string → None
pub fn opt_string(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Parse an optional numeric column stored as text
pub fn opt_f64(s: &str) -> Option<f64> {
    if s.is_empty() {
        None
    } else {
        s.parse().ok()
    }
}

/// Format an optional float for binding; None → empty string
pub fn bind_f64(v: Option<f64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

/// Read an optional integer cell (absent or non-integer → None)
pub fn cell_opt_i64(row: &turso::Row, index: usize) -> Result<Option<i64>> {
    Ok(row.get_value(index)?.as_integer().copied())
}

/// Read a required integer cell, defaulting to 0 for non-integer values
pub fn cell_i64(row: &turso::Row, index: usize) -> Result<i64> {
    Ok(row.get_value(index)?.as_integer().copied().unwrap_or(0))
}

/// Read a nullable text cell, mapping SQL NULL (and non-text) to an empty
/// string so the empty-string → None helpers above apply uniformly.
pub fn cell_text(row: &turso::Row, index: usize) -> Result<String> {
    Ok(row.get_value(index)?.as_text().cloned().unwrap_or_default())
}
