//! Calendar-date handling.
//!
//! Everything in the tracker works at day granularity. Inputs that carry a
//! time of day are truncated to their calendar date before any arithmetic,
//! so interval math never sees hours, DST shifts or millisecond rounding.

use crate::{Field, ValidationError};
use chrono::{DateTime, Days, Local, NaiveDate, NaiveDateTime};

/// Parse a calendar date.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps and naive `YYYY-MM-DDTHH:MM:SS`
/// values. Timestamps keep the calendar date they were written with.
pub fn parse_date(input: &str) -> Result<NaiveDate, ValidationError> {
    let s = input.trim();

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt.date());
    }

    Err(ValidationError::new(
        Field::Date,
        format!("'{}' is not a YYYY-MM-DD date", s),
    ))
}

/// Today's date on the local calendar
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Whole days from `from` to `to` (negative when `to` is earlier)
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    to.signed_duration_since(from).num_days()
}

/// `date + days`, or `None` past the end of the representable calendar
pub fn checked_add_days(date: NaiveDate, days: u32) -> Option<NaiveDate> {
    date.checked_add_days(Days::new(u64::from(days)))
}

/// `date + days`, saturating at the end of the representable calendar.
/// Refills are validated with `checked_add_days`, so stored ones never saturate.
pub fn add_days(date: NaiveDate, days: u32) -> NaiveDate {
    checked_add_days(date, days).unwrap_or(NaiveDate::MAX)
}
