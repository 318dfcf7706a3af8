//! Date coercion for band labels and user-supplied date bounds
//!
//! Band labels in real stacks rarely hold a bare ISO date. Names such as
//! `X2010.01.01`, `NDVI_2010-01-01` or `MOD13Q1_A2010001` are common, so
//! parsing searches the label for a calendar date or a year/day-of-year
//! pair instead of requiring an exact format.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

use crate::errors::{ExtractError, ExtractResult};

lazy_static! {
    static ref SEPARATED_YMD: Regex =
        Regex::new(r"(?:^|[^0-9])(\d{4})[-./_](\d{1,2})[-./_](\d{1,2})(?:[^0-9]|$)").unwrap();
    static ref COMPACT_YMD: Regex =
        Regex::new(r"(?:^|[^0-9])(\d{4})(\d{2})(\d{2})(?:[^0-9]|$)").unwrap();
    static ref YEAR_DOY: Regex =
        Regex::new(r"(?:^|[^0-9])(\d{4})[-._]?(\d{3})(?:[^0-9]|$)").unwrap();
}

/// Find a date inside a label
///
/// Patterns are tried in order: separated year-month-day, compact
/// `YYYYMMDD`, then year plus day-of-year. A match that is not a real
/// calendar date falls through to the next pattern.
pub fn parse_date(label: &str) -> Option<NaiveDate> {
    let label = label.trim();
    if label.is_empty() {
        return None;
    }

    for pattern in [&*SEPARATED_YMD, &*COMPACT_YMD] {
        if let Some(caps) = pattern.captures(label) {
            let year = caps[1].parse::<i32>().ok();
            let month = caps[2].parse::<u32>().ok();
            let day = caps[3].parse::<u32>().ok();
            if let (Some(y), Some(m), Some(d)) = (year, month, day) {
                if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
                    return Some(date);
                }
            }
        }
    }

    let caps = YEAR_DOY.captures(label)?;
    let year = caps[1].parse::<i32>().ok()?;
    let doy = caps[2].parse::<u32>().ok()?;
    NaiveDate::from_yo_opt(year, doy)
}

/// Coerce a user-supplied date string, failing with a format error
pub fn coerce_date(value: &str) -> ExtractResult<NaiveDate> {
    parse_date(value).ok_or_else(|| ExtractError::InvalidDate(value.to_string()))
}
