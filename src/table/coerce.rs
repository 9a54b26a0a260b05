// src/table/coerce.rs

//! Lenient cell coercion. Every function here returns `None` instead of
//! failing, so an unparsable cell becomes a gap rather than an error.

use chrono::{NaiveDate, NaiveDateTime};

const MISSING_TOKENS: &[&str] = &["", "na", "n/a", "nan", "null", "none", "-", "—", "--"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
];

pub fn is_missing(raw: &str) -> bool {
    let trimmed = raw.trim();
    MISSING_TOKENS
        .iter()
        .any(|token| trimmed.eq_ignore_ascii_case(token))
}

/// Parses a financial figure: `$1,234.50`, `(300)`, `12.5%`, ` 42 `.
pub fn parse_number(raw: &str) -> Option<f64> {
    if is_missing(raw) {
        return None;
    }
    let mut s = raw.trim();
    let mut negative = false;
    if let Some(inner) = s.strip_prefix('(').and_then(|rest| rest.strip_suffix(')')) {
        negative = true;
        s = inner.trim();
    }
    let s = s.strip_suffix('%').unwrap_or(s);
    let cleaned: String = s.chars().filter(|c| *c != '$' && *c != ',').collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }

    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(if negative { -value } else { value })
}

pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    if is_missing(raw) {
        return None;
    }
    let s = raw.trim();

    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return Some(dt);
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }

    let date = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d").ok())?;
    date.and_hms_opt(0, 0, 0)
}
