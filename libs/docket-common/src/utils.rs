//! Parsing and formatting helpers shared by the core library and the CLI

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

use crate::constants::{DATETIME_FORMATS, DATE_FORMATS};

/// Parse a loosely formatted boolean flag
///
/// Accepts `true/false`, `1/0`, `yes/no` and `on/off`, case-insensitively.
#[must_use]
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse an ISO 8601 date or datetime into a UTC instant
///
/// RFC 3339 strings keep their offset; naive datetimes are taken as UTC and
/// plain dates resolve to midnight UTC.
///
/// # Errors
/// Returns the last `chrono::ParseError` if no accepted format matches
pub fn parse_iso_datetime(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let value = value.trim();
    let mut last_error = match DateTime::parse_from_rfc3339(value) {
        Ok(dt) => return Ok(dt.with_timezone(&Utc)),
        Err(e) => e,
    };

    for format in DATETIME_FORMATS {
        match NaiveDateTime::parse_from_str(value, format) {
            Ok(naive) => return Ok(naive.and_utc()),
            Err(e) => last_error = e,
        }
    }

    for format in DATE_FORMATS {
        match NaiveDate::parse_from_str(value, format) {
            Ok(date) => {
                if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
                    return Ok(midnight.and_utc());
                }
            }
            Err(e) => last_error = e,
        }
    }

    Err(last_error)
}

/// Format an instant as RFC 3339 with millisecond precision and a `Z` suffix
#[must_use]
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Split a comma-separated list, trimming entries and dropping empty ones
#[must_use]
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Escape `%`, `_` and `\` for a SQL `LIKE ... ESCAPE '\'` pattern
#[must_use]
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
