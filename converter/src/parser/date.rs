//! Header date canonicalization.
//!
//! Source tables label their value columns with dates in whatever layout
//! the publisher chose (`1/22/20`, `2020-01-22`, `22 Jan 2020`, ...).
//! [`normalize_date`] turns each label into an 8-digit `YYYYMMDD` token.
//!
//! Ambiguous numeric dates are read month-first unless the first part
//! cannot be a month.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{DateError, DateResult};

static NUMERIC_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,4})([/.\-])(\d{1,2})([/.\-])(\d{1,4})$").expect("numeric date pattern")
});

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const TEXTUAL_FORMATS: &[&str] = &[
    "%d %B %Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d-%b-%Y",
    "%d-%b-%y",
    "%a, %d %b %Y",
    "%A, %B %d, %Y",
];

/// Convert a header date label into a `YYYYMMDD` token.
///
/// # Example
/// ```
/// use gapminder::normalize_date;
///
/// assert_eq!(normalize_date("1/22/20").unwrap(), "20200122");
/// assert_eq!(normalize_date("2020-03-05").unwrap(), "20200305");
/// ```
pub fn normalize_date(raw: &str) -> DateResult<String> {
    parse_date(raw)
        .map(|date| date.format("%Y%m%d").to_string())
        .ok_or_else(|| DateError::Unrecognized(raw.to_string()))
}

/// Parse a date label, ignoring surrounding whitespace and any time of day.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    parse_numeric(value)
        .or_else(|| parse_compact(value))
        .or_else(|| parse_datetime(value))
        .or_else(|| parse_textual(value))
}

/// `M/D/YY`, `M/D/YYYY`, `D/M/YYYY` (first part > 12), `YYYY-MM-DD`.
fn parse_numeric(value: &str) -> Option<NaiveDate> {
    let caps = NUMERIC_DATE.captures(value)?;
    if caps[2] != caps[4] {
        return None;
    }
    let (first, second, third) = (&caps[1], &caps[3], &caps[5]);

    if first.len() == 4 {
        if third.len() > 2 {
            return None;
        }
        return NaiveDate::from_ymd_opt(first.parse().ok()?, second.parse().ok()?, third.parse().ok()?);
    }
    if first.len() > 2 {
        return None;
    }

    let year = expand_year(third)?;
    let a: u32 = first.parse().ok()?;
    let b: u32 = second.parse().ok()?;
    if a > 12 {
        NaiveDate::from_ymd_opt(year, b, a)
    } else {
        NaiveDate::from_ymd_opt(year, a, b)
    }
}

/// Two-digit years pivot at 69: `69`-`99` are 19xx, `00`-`68` are 20xx.
fn expand_year(digits: &str) -> Option<i32> {
    let year: i32 = digits.parse().ok()?;
    match digits.len() {
        2 if year >= 69 => Some(1900 + year),
        2 => Some(2000 + year),
        4 => Some(year),
        _ => None,
    }
}

fn parse_compact(value: &str) -> Option<NaiveDate> {
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y%m%d").ok()
}

fn parse_datetime(value: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.date_naive());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|dt| dt.date())
}

fn parse_textual(value: &str) -> Option<NaiveDate> {
    TEXTUAL_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}
