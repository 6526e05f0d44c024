//! Loose date and datetime parsing.
//!
//! Both entry points normalize their input (see [`crate::normalize`]) and then
//! walk a ranked table of patterns. The first pattern that matches the whole
//! string *and* yields a valid calendar date (and clock time) wins; a pattern
//! that matches the shape but names an impossible date (`2025-02-30`) is
//! skipped, and parsing continues with the next entry. When nothing validates
//! the result is `None`, never a guess.
//!
//! Numeric fields accept both zero-padded and unpadded forms (`2025/1/5` and
//! `2025/01/05` match the same pattern).
//!
//! All functions take a [`ParseContext`] instead of reading the system clock:
//! it supplies the year for year-omitted patterns and the zone for datetimes
//! that carry no offset.

use chrono::format::{self, Parsed, StrftimeItems};
use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};
use chrono_tz::Tz;

use crate::normalize::normalize_input;

/// The clock and zone a parse is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParseContext {
    /// The reference "now" instant.
    pub now: DateTime<Utc>,
    /// Zone for datetimes without an explicit offset and for "current year".
    pub timezone: Tz,
}

impl ParseContext {
    pub fn new(now: DateTime<Utc>, timezone: Tz) -> Self {
        Self { now, timezone }
    }

    /// A context that interprets offset-less datetimes as UTC.
    pub fn utc(now: DateTime<Utc>) -> Self {
        Self::new(now, Tz::UTC)
    }

    /// Today's civil date in the context zone.
    pub fn today(&self) -> NaiveDate {
        self.now.with_timezone(&self.timezone).date_naive()
    }

    /// The year used when a pattern omits it.
    pub fn current_year(&self) -> i32 {
        self.today().year()
    }

    /// Place a wall-clock datetime in the context zone.
    ///
    /// Nonexistent local times (inside a DST gap) yield `None`; ambiguous ones
    /// (inside a DST overlap) resolve to the earlier instant.
    pub fn localize(&self, naive: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        self.timezone
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.fixed_offset())
    }
}

/// Whether a pattern carries its own year or borrows the context's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Year {
    Explicit,
    Omitted,
}

/// One entry of a ranked pattern table.
#[derive(Debug, Clone, Copy)]
struct Pattern {
    format: &'static str,
    year: Year,
}

impl Pattern {
    const fn dated(format: &'static str) -> Self {
        Self {
            format,
            year: Year::Explicit,
        }
    }

    const fn yearless(format: &'static str) -> Self {
        Self {
            format,
            year: Year::Omitted,
        }
    }

    /// Match `text` in full and return the populated fields.
    fn apply(&self, text: &str, ctx: &ParseContext) -> Option<Parsed> {
        if self.year == Year::Explicit && !starts_with_four_digit_year(text) {
            return None;
        }
        let mut parsed = Parsed::new();
        format::parse(&mut parsed, text, StrftimeItems::new(self.format)).ok()?;
        if self.year == Year::Omitted {
            parsed.set_year(i64::from(ctx.current_year())).ok()?;
        }
        Some(parsed)
    }
}

/// Date-only shapes, most specific first.
const DATE_PATTERNS: &[Pattern] = &[
    Pattern::dated("%Y-%m-%d"),
    Pattern::dated("%Y/%m/%d"),
    Pattern::dated("%Y年%m月%d日"),
    Pattern::yearless("%m/%d"),
    Pattern::yearless("%m月%d日"),
];

/// Offset-less ISO 8601 shapes tried after RFC 3339.
const ISO_LOCAL_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Explicit date + time shapes tried after the ISO forms.
const DATETIME_PATTERNS: &[Pattern] = &[
    Pattern::dated("%Y-%m-%dT%H:%M:%S"),
    Pattern::dated("%Y-%m-%dT%H:%M"),
    Pattern::dated("%Y-%m-%d %H:%M:%S"),
    Pattern::dated("%Y-%m-%d %H:%M"),
    Pattern::dated("%Y/%m/%d %H:%M:%S"),
    Pattern::dated("%Y/%m/%d %H:%M"),
    Pattern::dated("%Y年%m月%d日 %H:%M:%S"),
    Pattern::dated("%Y年%m月%d日 %H:%M"),
    Pattern::yearless("%m/%d %H:%M:%S"),
    Pattern::yearless("%m/%d %H:%M"),
    Pattern::yearless("%m月%d日 %H:%M:%S"),
    Pattern::yearless("%m月%d日 %H:%M"),
];

/// Parse a calendar date with no time-of-day.
///
/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD`, `YYYY年MM月DD日`, and the year-omitted
/// `MM/DD` and `MM月DD日` (year taken from `ctx`).
///
/// # Examples
///
/// ```
/// use calendar_engine::parser::{parse_date_only, ParseContext};
/// use chrono::{NaiveDate, TimeZone, Utc};
///
/// let ctx = ParseContext::utc(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap());
/// assert_eq!(parse_date_only("2025/1/31", &ctx), NaiveDate::from_ymd_opt(2025, 1, 31));
/// assert_eq!(parse_date_only("2025-02-30", &ctx), None);
/// ```
pub fn parse_date_only(text: &str, ctx: &ParseContext) -> Option<NaiveDate> {
    let normalized = normalize_input(text);
    if normalized.is_empty() {
        return None;
    }

    DATE_PATTERNS.iter().find_map(|pattern| {
        let date = pattern.apply(&normalized, ctx)?.to_naive_date().ok()?;
        tracing::trace!(pattern = pattern.format, %date, "date-only pattern matched");
        Some(date)
    })
}

/// Parse a date with a clock time into an instant with its offset.
///
/// Requires an `H:MM` clock somewhere in the text. RFC 3339 / ISO 8601 is
/// tried first, then the explicit pattern table. Past the ISO forms, an
/// offset is a space-separated trailing `±HH:MM`, or a `Z`/`UTC` suffix;
/// without one the wall time is placed in `ctx.timezone`. A `±HH:MM` glued to
/// the clock (`10:00-11:00`) reads as a time range, so it is not matched.
///
/// # Examples
///
/// ```
/// use calendar_engine::parser::{parse_datetime_loose, ParseContext};
/// use chrono::{TimeZone, Utc};
///
/// let ctx = ParseContext::utc(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap());
/// let dt = parse_datetime_loose("2025年12月16日 10時 JST", &ctx).unwrap();
/// assert_eq!(dt.to_rfc3339(), "2025-12-16T10:00:00+00:00");
/// ```
pub fn parse_datetime_loose(text: &str, ctx: &ParseContext) -> Option<DateTime<FixedOffset>> {
    let normalized = normalize_input(text);
    if !has_clock_time(&normalized) {
        return None;
    }

    parse_iso8601(&normalized, ctx).or_else(|| parse_explicit_datetime(&normalized, ctx))
}

/// The civil date of a full datetime, read in the context zone.
///
/// Used when the caller has declared an event all-day but supplied a
/// datetime: the time-of-day is discarded.
pub fn parse_date_portion(text: &str, ctx: &ParseContext) -> Option<NaiveDate> {
    parse_datetime_loose(text, ctx).map(|dt| dt.with_timezone(&ctx.timezone).date_naive())
}

// ── Internal helpers ────────────────────────────────────────────────────────

fn parse_iso8601(s: &str, ctx: &ParseContext) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        tracing::trace!("rfc3339 matched");
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M%:z") {
        tracing::trace!("iso8601 without seconds matched");
        return Some(dt);
    }

    let (local, utc) = match s.strip_suffix(['Z', 'z']) {
        Some(rest) => (rest, true),
        None => (s, false),
    };
    ISO_LOCAL_FORMATS.iter().find_map(|fmt| {
        let naive = NaiveDateTime::parse_from_str(local, fmt).ok()?;
        tracing::trace!(format = *fmt, utc, "iso8601 local matched");
        if utc {
            Some(naive.and_utc().fixed_offset())
        } else {
            ctx.localize(naive)
        }
    })
}

fn parse_explicit_datetime(s: &str, ctx: &ParseContext) -> Option<DateTime<FixedOffset>> {
    let (body, offset) = split_trailing_offset(s);

    DATETIME_PATTERNS.iter().find_map(|pattern| {
        let parsed = pattern.apply(body, ctx)?;
        let date = parsed.to_naive_date().ok()?;
        let time: NaiveTime = parsed.to_naive_time().ok()?;
        let naive = date.and_time(time);
        tracing::trace!(pattern = pattern.format, %naive, "datetime pattern matched");
        match offset {
            Some(offset) => offset.from_local_datetime(&naive).single(),
            None => ctx.localize(naive),
        }
    })
}

/// Split a trailing ` ±HH:MM`, `Z` or `UTC` off a datetime body.
///
/// A numeric offset must follow a space; one glued to the clock is left in
/// the body so no pattern matches it.
fn split_trailing_offset(s: &str) -> (&str, Option<FixedOffset>) {
    if let Some(body) = s.strip_suffix("UTC").or_else(|| s.strip_suffix("Z")) {
        if body.ends_with(|c: char| c.is_ascii_digit() || c == ' ') {
            return (body.trim_end(), FixedOffset::east_opt(0));
        }
    }

    let bytes = s.as_bytes();
    let n = bytes.len();
    if n < 7 {
        return (s, None);
    }
    let tail = &bytes[n - 6..];
    let well_formed = matches!(tail[0], b'+' | b'-')
        && tail[1].is_ascii_digit()
        && tail[2].is_ascii_digit()
        && tail[3] == b':'
        && tail[4].is_ascii_digit()
        && tail[5].is_ascii_digit();
    let preceded = bytes[n - 7] == b' ';
    if !well_formed || !preceded {
        return (s, None);
    }

    let hours = i32::from(tail[1] - b'0') * 10 + i32::from(tail[2] - b'0');
    let minutes = i32::from(tail[4] - b'0') * 10 + i32::from(tail[5] - b'0');
    let sign = if tail[0] == b'-' { -1 } else { 1 };
    match FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)) {
        Some(offset) => (s[..n - 6].trim_end(), Some(offset)),
        None => (s, None),
    }
}

/// `true` if `s` contains a `H:MM` clock.
fn has_clock_time(s: &str) -> bool {
    s.as_bytes().windows(4).any(|w| {
        w[0].is_ascii_digit() && w[1] == b':' && w[2].is_ascii_digit() && w[3].is_ascii_digit()
    })
}

/// `true` if `s` opens with exactly four ASCII digits.
fn starts_with_four_digit_year(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 4
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes.get(4).is_none_or(|b| !b.is_ascii_digit())
}

// ── Tests ───────────────────────────────────────────────────────────────────
