//! Fixed-width date forms shared by the ICS and calendar-link outputs.
//!
//! - [`format_utc_instant`] — `YYYYMMDDTHHMMSSZ`
//! - [`format_local_yyyymmdd`] — `YYYYMMDD`
//! - [`next_day_yyyymmdd`] — `YYYYMMDD` plus one calendar day
//!
//! The formatters only fail for years outside `0000..=9999`, which these
//! fixed-width forms cannot represent.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// RFC 5545 UTC date-time form (`FORM #2`).
pub const UTC_INSTANT_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// RFC 5545 DATE form.
pub const DATE_FORMAT: &str = "%Y%m%d";

/// Format an instant as `YYYYMMDDTHHMMSSZ` using its UTC fields.
///
/// # Examples
///
/// ```
/// use calendar_engine::format::format_utc_instant;
/// use chrono::DateTime;
///
/// let dt = DateTime::parse_from_rfc3339("2025-12-16T10:00:00+09:00").unwrap();
/// assert_eq!(format_utc_instant(&dt).as_deref(), Some("20251216T010000Z"));
/// ```
pub fn format_utc_instant<T: TimeZone>(instant: &DateTime<T>) -> Option<String> {
    let utc = instant.with_timezone(&Utc);
    representable_year(utc.year())?;
    Some(utc.format(UTC_INSTANT_FORMAT).to_string())
}

/// Format a civil date as `YYYYMMDD`.
pub fn format_local_yyyymmdd(date: NaiveDate) -> Option<String> {
    representable_year(date.year())?;
    Some(date.format(DATE_FORMAT).to_string())
}

/// Add one calendar day to a `YYYYMMDD` string.
///
/// Input that is not a valid 8-digit date is returned unchanged, as is a
/// date whose successor cannot be written in eight digits.
///
/// # Examples
///
/// ```
/// use calendar_engine::format::next_day_yyyymmdd;
///
/// assert_eq!(next_day_yyyymmdd("20250131"), "20250201");
/// assert_eq!(next_day_yyyymmdd("20241231"), "20250101");
/// assert_eq!(next_day_yyyymmdd("2025-01-31"), "2025-01-31");
/// ```
pub fn next_day_yyyymmdd(yyyymmdd: &str) -> String {
    parse_yyyymmdd(yyyymmdd)
        .and_then(|date| date.succ_opt())
        .and_then(format_local_yyyymmdd)
        .unwrap_or_else(|| yyyymmdd.to_string())
}

/// Parse a strict 8-digit `YYYYMMDD` string.
pub fn parse_yyyymmdd(s: &str) -> Option<NaiveDate> {
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

/// Parse a `YYYYMMDDTHHMMSSZ` string back into an instant.
pub fn parse_utc_instant(s: &str) -> Option<DateTime<Utc>> {
    if s.len() != 16 {
        return None;
    }
    NaiveDateTime::parse_from_str(s, UTC_INSTANT_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

fn representable_year(year: i32) -> Option<()> {
    (0..=9999).contains(&year).then_some(())
}

// ── Tests ───────────────────────────────────────────────────────────────────
