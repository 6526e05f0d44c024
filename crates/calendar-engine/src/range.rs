//! Event range resolution.
//!
//! [`resolve`] turns a raw start/end pair plus an optional all-day hint into a
//! [`ResolvedEventRange`]: the one value both the ICS serializer and the
//! calendar-link builder render from, so the two exports can never disagree.
//!
//! # Rules
//!
//! - A blank start fails resolution.
//! - The event is all-day when the caller says so **or** when the start is a
//!   bare date (see [`decide_all_day`]).
//! - All-day ends are exclusive. A missing, unparseable, or non-later end
//!   becomes start + 1 day.
//! - Timed events need a parseable start. A missing, unparseable, or
//!   non-later end becomes start + 1 hour.
//!
//! Resolution either produces a complete range or an error; there is no
//! partially filled result.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use serde::Serialize;

use crate::error::{EngineError, Result};
use crate::format::{format_local_yyyymmdd, format_utc_instant, next_day_yyyymmdd, parse_yyyymmdd};
use crate::parser::{parse_date_only, parse_date_portion, parse_datetime_loose, ParseContext};

/// Length of a timed event whose source gives no usable end.
pub const DEFAULT_EVENT_DURATION_SECONDS: i64 = 3600;

/// A fully resolved event time range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolvedEventRange {
    /// Whole days: `start_yyyymmdd` inclusive, `end_yyyymmdd_exclusive` exclusive.
    AllDay {
        start_yyyymmdd: String,
        end_yyyymmdd_exclusive: String,
    },
    /// UTC instants in `YYYYMMDDTHHMMSSZ` form; `end_utc` is after `start_utc`.
    DateTime { start_utc: String, end_utc: String },
}

impl ResolvedEventRange {
    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::AllDay { .. })
    }

    /// The start boundary in its export form.
    pub fn start(&self) -> &str {
        match self {
            Self::AllDay { start_yyyymmdd, .. } => start_yyyymmdd,
            Self::DateTime { start_utc, .. } => start_utc,
        }
    }

    /// The (exclusive, for all-day) end boundary in its export form.
    pub fn end(&self) -> &str {
        match self {
            Self::AllDay {
                end_yyyymmdd_exclusive,
                ..
            } => end_yyyymmdd_exclusive,
            Self::DateTime { end_utc, .. } => end_utc,
        }
    }

    /// `START/END`, as used by calendar template links.
    pub fn dates_param(&self) -> String {
        format!("{}/{}", self.start(), self.end())
    }
}

/// Why an event was (or was not) treated as all-day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AllDayDecision {
    /// The caller flagged the event all-day.
    Explicit,
    /// No flag, but the start is a bare date.
    Inferred,
    /// A timed event.
    Timed,
}

impl AllDayDecision {
    pub fn is_all_day(self) -> bool {
        !matches!(self, Self::Timed)
    }
}

/// Decide whether an event is all-day.
///
/// `Some(true)` always wins. Otherwise (including `Some(false)`) a start that
/// parses as a date-only value makes the event all-day.
pub fn decide_all_day(start: &str, all_day: Option<bool>, ctx: &ParseContext) -> AllDayDecision {
    if all_day == Some(true) {
        AllDayDecision::Explicit
    } else if parse_date_only(start, ctx).is_some() {
        AllDayDecision::Inferred
    } else {
        AllDayDecision::Timed
    }
}

/// Resolve a start/end pair into a [`ResolvedEventRange`].
///
/// # Errors
///
/// Returns [`EngineError::EmptyStart`] for a blank start,
/// [`EngineError::UnparseableStart`] when the start matches no known shape
/// (including impossible dates like `2025-02-30`), and
/// [`EngineError::UnformattableRange`] when a boundary cannot be written in
/// the fixed-width export forms.
///
/// # Examples
///
/// ```
/// use calendar_engine::parser::ParseContext;
/// use calendar_engine::range::{resolve, ResolvedEventRange};
/// use chrono::{TimeZone, Utc};
///
/// let ctx = ParseContext::utc(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
/// let range = resolve("2025-01-31", None, None, &ctx).unwrap();
/// assert_eq!(
///     range,
///     ResolvedEventRange::AllDay {
///         start_yyyymmdd: "20250131".into(),
///         end_yyyymmdd_exclusive: "20250201".into(),
///     }
/// );
/// ```
pub fn resolve(
    start: &str,
    end: Option<&str>,
    all_day: Option<bool>,
    ctx: &ParseContext,
) -> Result<ResolvedEventRange> {
    let start = start.trim();
    if start.is_empty() {
        tracing::debug!("cannot resolve event range: empty start");
        return Err(EngineError::EmptyStart);
    }
    let end = end.map(str::trim).filter(|e| !e.is_empty());

    let decision = decide_all_day(start, all_day, ctx);
    let resolved = if decision.is_all_day() {
        resolve_all_day(start, end, decision, ctx)
    } else {
        resolve_timed(start, end, ctx)
    };

    match &resolved {
        Ok(range) => tracing::debug!(?decision, ?range, "resolved event range"),
        Err(err) => tracing::debug!(?decision, start, ?end, %err, "cannot resolve event range"),
    }
    resolved
}

fn resolve_all_day(
    start: &str,
    end: Option<&str>,
    decision: AllDayDecision,
    ctx: &ParseContext,
) -> Result<ResolvedEventRange> {
    // Only an explicit all-day flag lets a datetime stand in for a date.
    let civil_date = |text: &str| -> Option<NaiveDate> {
        parse_date_only(text, ctx).or_else(|| {
            (decision == AllDayDecision::Explicit)
                .then(|| parse_date_portion(text, ctx))
                .flatten()
        })
    };

    let start_date = civil_date(start).ok_or_else(|| {
        EngineError::UnparseableStart(format!("'{start}' is not a recognizable date"))
    })?;
    let start_yyyymmdd = format_local_yyyymmdd(start_date).ok_or_else(|| {
        EngineError::UnformattableRange(format!("start date {start_date} out of range"))
    })?;

    let end_date = end.and_then(civil_date);
    let end_yyyymmdd = match end_date {
        Some(end_date) if end_date > start_date => format_local_yyyymmdd(end_date),
        Some(end_date) => {
            tracing::debug!(%start_date, %end_date, "all-day end not after start, using one day");
            Some(next_day_yyyymmdd(&start_yyyymmdd))
        }
        None => Some(next_day_yyyymmdd(&start_yyyymmdd)),
    };

    let end_yyyymmdd_exclusive = end_yyyymmdd
        .filter(|e| parse_yyyymmdd(e).is_some() && *e > start_yyyymmdd)
        .ok_or_else(|| {
            EngineError::UnformattableRange(format!("no valid end date after {start_yyyymmdd}"))
        })?;

    Ok(ResolvedEventRange::AllDay {
        start_yyyymmdd,
        end_yyyymmdd_exclusive,
    })
}

fn resolve_timed(start: &str, end: Option<&str>, ctx: &ParseContext) -> Result<ResolvedEventRange> {
    let start_at = parse_datetime_loose(start, ctx).ok_or_else(|| {
        EngineError::UnparseableStart(format!("'{start}' is not a recognizable date or time"))
    })?;

    let end_at = match end.and_then(|e| parse_datetime_loose(e, ctx)) {
        Some(end_at) if end_at > start_at => Some(end_at),
        Some(end_at) => {
            tracing::debug!(%start_at, %end_at, "end not after start, using default duration");
            default_end(start_at)
        }
        None => default_end(start_at),
    }
    .ok_or_else(|| EngineError::UnformattableRange(format!("no valid end after {start_at}")))?;

    let start_utc = format_utc_instant(&start_at)
        .ok_or_else(|| EngineError::UnformattableRange(format!("start {start_at} out of range")))?;
    let end_utc = format_utc_instant(&end_at)
        .ok_or_else(|| EngineError::UnformattableRange(format!("end {end_at} out of range")))?;

    Ok(ResolvedEventRange::DateTime { start_utc, end_utc })
}

fn default_end(start_at: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
    start_at.checked_add_signed(Duration::seconds(DEFAULT_EVENT_DURATION_SECONDS))
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::parse_utc_instant;
    use chrono::{Datelike, TimeZone, Utc};
    use proptest::prelude::*;

    fn anchor() -> DateTime<Utc> {
        // Monday, June 2, 2025, 03:00:00 UTC
        Utc.with_ymd_and_hms(2025, 6, 2, 3, 0, 0).unwrap()
    }

    fn ctx() -> ParseContext {
        ParseContext::utc(anchor())
    }

    fn all_day(start: &str, end: &str) -> ResolvedEventRange {
        ResolvedEventRange::AllDay {
            start_yyyymmdd: start.to_string(),
            end_yyyymmdd_exclusive: end.to_string(),
        }
    }

    fn timed(start: &str, end: &str) -> ResolvedEventRange {
        ResolvedEventRange::DateTime {
            start_utc: start.to_string(),
            end_utc: end.to_string(),
        }
    }

    // ── decide_all_day tests ────────────────────────────────────────────

    #[test]
    fn test_decide_explicit_flag_wins() {
        assert_eq!(
            decide_all_day("2025-01-31 10:00", Some(true), &ctx()),
            AllDayDecision::Explicit
        );
    }

    #[test]
    fn test_decide_inferred_from_bare_date() {
        assert_eq!(decide_all_day("2025-01-31", None, &ctx()), AllDayDecision::Inferred);
        assert_eq!(
            decide_all_day("2025-01-31", Some(false), &ctx()),
            AllDayDecision::Inferred
        );
    }

    #[test]
    fn test_decide_timed() {
        assert_eq!(
            decide_all_day("2025-01-31 10:00", None, &ctx()),
            AllDayDecision::Timed
        );
    }

    // ── all-day resolution tests ────────────────────────────────────────

    #[test]
    fn test_bare_date_defaults_to_one_day() {
        let range = resolve("2025-01-31", None, None, &ctx()).unwrap();
        assert_eq!(range, all_day("20250131", "20250201"));
    }

    #[test]
    fn test_all_day_with_later_end() {
        let range = resolve("2025-01-31", Some("2025-02-03"), None, &ctx()).unwrap();
        assert_eq!(range, all_day("20250131", "20250203"));
    }

    #[test]
    fn test_all_day_end_equal_to_start_forced_forward() {
        let range = resolve("2025-01-31", Some("2025-01-31"), None, &ctx()).unwrap();
        assert_eq!(range, all_day("20250131", "20250201"));
    }

    #[test]
    fn test_all_day_end_before_start_forced_forward() {
        let range = resolve("2025-01-31", Some("2025-01-20"), None, &ctx()).unwrap();
        assert_eq!(range, all_day("20250131", "20250201"));
    }

    #[test]
    fn test_all_day_unparseable_end_ignored() {
        let range = resolve("2025-12-31", Some("sometime"), None, &ctx()).unwrap();
        assert_eq!(range, all_day("20251231", "20260101"));
    }

    #[test]
    fn test_explicit_all_day_discards_time() {
        let range = resolve("2025-12-16T10:00:00+09:00", None, Some(true), &ctx()).unwrap();
        assert_eq!(range, all_day("20251216", "20251217"));
    }

    #[test]
    fn test_explicit_all_day_date_portion_in_context_zone() {
        let tokyo = ParseContext::new(anchor(), chrono_tz::Asia::Tokyo);
        let range = resolve("2025-12-16T20:00:00Z", None, Some(true), &tokyo).unwrap();
        assert_eq!(range, all_day("20251217", "20251218"));
    }

    #[test]
    fn test_inferred_all_day_ignores_datetime_end() {
        // Without an explicit flag a datetime end is not a date.
        let range = resolve("2025-01-31", Some("2025-02-02 10:00"), None, &ctx()).unwrap();
        assert_eq!(range, all_day("20250131", "20250201"));
    }

    #[test]
    fn test_explicit_all_day_accepts_datetime_end() {
        let range =
            resolve("2025-01-31", Some("2025-02-02 10:00"), Some(true), &ctx()).unwrap();
        assert_eq!(range, all_day("20250131", "20250202"));
    }

    #[test]
    fn test_all_day_year_omitted() {
        let range = resolve("12/16", None, None, &ctx()).unwrap();
        assert_eq!(range, all_day("20251216", "20251217"));
    }

    #[test]
    fn test_all_day_at_year_limit_fails() {
        let err = resolve("9999-12-31", None, None, &ctx()).unwrap_err();
        assert!(matches!(err, EngineError::UnformattableRange(_)), "got: {err}");
    }

    #[test]
    fn test_explicit_all_day_unparseable_start_fails() {
        let err = resolve("next week", None, Some(true), &ctx()).unwrap_err();
        assert!(matches!(err, EngineError::UnparseableStart(_)), "got: {err}");
    }

    // ── timed resolution tests ──────────────────────────────────────────

    #[test]
    fn test_timed_defaults_to_one_hour_in_utc() {
        let range = resolve("2025-12-16T10:00:00+09:00", None, None, &ctx()).unwrap();
        assert_eq!(range, timed("20251216T010000Z", "20251216T020000Z"));
    }

    #[test]
    fn test_timed_with_later_end() {
        let range = resolve(
            "2025-12-16T10:00:00+09:00",
            Some("2025-12-16T12:30:00+09:00"),
            None,
            &ctx(),
        )
        .unwrap();
        assert_eq!(range, timed("20251216T010000Z", "20251216T033000Z"));
    }

    #[test]
    fn test_timed_end_before_start_uses_default() {
        let range = resolve("2025-12-16 10:00", Some("2025-12-16 09:00"), None, &ctx()).unwrap();
        assert_eq!(range, timed("20251216T100000Z", "20251216T110000Z"));
    }

    #[test]
    fn test_timed_end_equal_start_uses_default() {
        let range = resolve("2025-12-16 10:00", Some("2025-12-16 10:00"), None, &ctx()).unwrap();
        assert_eq!(range, timed("20251216T100000Z", "20251216T110000Z"));
    }

    #[test]
    fn test_timed_date_only_end_uses_default() {
        let range = resolve("2025-12-16 10:00", Some("2025-12-17"), None, &ctx()).unwrap();
        assert_eq!(range, timed("20251216T100000Z", "20251216T110000Z"));
    }

    #[test]
    fn test_timed_default_crosses_midnight() {
        let range = resolve("2025-12-31 23:30", None, None, &ctx()).unwrap();
        assert_eq!(range, timed("20251231T233000Z", "20260101T003000Z"));
    }

    #[test]
    fn test_timed_year_omitted_in_current_year() {
        let range = resolve("12/16 10:00", None, None, &ctx()).unwrap();
        let start = parse_utc_instant(range.start()).unwrap();
        assert_eq!(start.year(), anchor().year());
        assert_eq!(range, timed("20251216T100000Z", "20251216T110000Z"));
    }

    #[test]
    fn test_timed_blank_end_treated_as_missing() {
        let range = resolve("2025-12-16 10:00", Some("   "), None, &ctx()).unwrap();
        assert_eq!(range, timed("20251216T100000Z", "20251216T110000Z"));
    }

    // ── failure tests ───────────────────────────────────────────────────

    #[test]
    fn test_empty_start_fails() {
        assert!(matches!(
            resolve("   ", None, None, &ctx()),
            Err(EngineError::EmptyStart)
        ));
    }

    #[test]
    fn test_invalid_calendar_date_fails() {
        let err = resolve("2025-02-30", None, None, &ctx()).unwrap_err();
        assert!(matches!(err, EngineError::UnparseableStart(_)), "got: {err}");
    }

    #[test]
    fn test_clock_range_in_start_fails() {
        for start in ["12/16 10:00-11:00", "2025/12/16 10:00-11:00", "2025/12/16 10:00-1100"] {
            let err = resolve(start, None, None, &ctx()).unwrap_err();
            assert!(matches!(err, EngineError::UnparseableStart(_)), "{start}: {err}");
        }
    }

    #[test]
    fn test_iso_start_with_spaced_offset() {
        let range = resolve("2025-12-16T10:00:00 +09:00", None, None, &ctx()).unwrap();
        assert_eq!(range, timed("20251216T010000Z", "20251216T020000Z"));
    }

    #[test]
    fn test_bracketed_zone_label_start() {
        let tokyo = ParseContext::new(anchor(), chrono_tz::Asia::Tokyo);
        let range = resolve("2025/12/16 10:00 (JST)", None, None, &tokyo).unwrap();
        assert_eq!(range, timed("20251216T010000Z", "20251216T020000Z"));
    }

    #[test]
    fn test_unparseable_start_fails() {
        let err = resolve("sometime next week", Some("2025-12-16 10:00"), None, &ctx()).unwrap_err();
        assert!(err.to_string().contains("Unparseable start"), "got: {err}");
    }

    #[test]
    fn test_dates_param() {
        let range = resolve("2025-01-31", None, None, &ctx()).unwrap();
        assert_eq!(range.dates_param(), "20250131/20250201");
        assert!(range.is_all_day());
    }

    #[test]
    fn test_range_serializes_with_kind_tag() {
        let range = resolve("2025-01-31", None, None, &ctx()).unwrap();
        let json = serde_json::to_value(&range).unwrap();
        assert_eq!(json["kind"], "all_day");
        assert_eq!(json["start_yyyymmdd"], "20250131");
    }

    // ── properties ──────────────────────────────────────────────────────

    proptest! {
        #[test]
        fn prop_all_day_end_after_start(
            y in 1970i32..2100, m in 1u32..=12, d in 1u32..=28,
            ey in 1970i32..2100, em in 1u32..=12, ed in 1u32..=31,
        ) {
            let start = format!("{y:04}-{m:02}-{d:02}");
            let end = format!("{ey:04}/{em}/{ed}");
            let range = resolve(&start, Some(&end), None, &ctx()).unwrap();
            match range {
                ResolvedEventRange::AllDay { start_yyyymmdd, end_yyyymmdd_exclusive } => {
                    prop_assert!(end_yyyymmdd_exclusive > start_yyyymmdd);
                }
                other => prop_assert!(false, "expected all-day, got {:?}", other),
            }
        }

        #[test]
        fn prop_timed_end_after_start(
            day in 1u32..=28, hour in 0u32..24, minute in 0u32..60,
            end_day in 1u32..=28, end_hour in 0u32..24, end_minute in 0u32..60,
        ) {
            let start = format!("2025/3/{day} {hour}:{minute:02}");
            let end = format!("2025-03-{end_day:02} {end_hour:02}:{end_minute:02}");
            let range = resolve(&start, Some(&end), None, &ctx()).unwrap();
            match range {
                ResolvedEventRange::DateTime { start_utc, end_utc } => {
                    let start_at = parse_utc_instant(&start_utc).unwrap();
                    let end_at = parse_utc_instant(&end_utc).unwrap();
                    prop_assert!(end_at > start_at);
                }
                other => prop_assert!(false, "expected timed, got {:?}", other),
            }
        }
    }
}
