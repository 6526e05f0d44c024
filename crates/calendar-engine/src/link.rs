//! Google Calendar "add event" template links.
//!
//! The `dates` parameter uses the same boundary strings as the ICS output:
//! `YYYYMMDD/YYYYMMDD` (exclusive end) for all-day events and
//! `YYYYMMDDTHHMMSSZ/YYYYMMDDTHHMMSSZ` for timed ones.

use url::Url;

use crate::config::ExportOptions;
use crate::error::{EngineError, Result};
use crate::event::RawEventInput;
use crate::parser::ParseContext;
use crate::range::ResolvedEventRange;

pub const GOOGLE_CALENDAR_TEMPLATE_URL: &str = "https://calendar.google.com/calendar/render";

/// Resolve `input` and build its Google Calendar template link.
///
/// # Errors
///
/// Fails when the event's time range cannot be resolved.
///
/// # Examples
///
/// ```
/// use calendar_engine::config::ExportOptions;
/// use calendar_engine::event::RawEventInput;
/// use calendar_engine::link::build_google_calendar_url;
/// use calendar_engine::parser::ParseContext;
/// use chrono::{TimeZone, Utc};
///
/// let ctx = ParseContext::utc(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
/// let input = RawEventInput::new("Launch", "2025-01-31");
/// let url = build_google_calendar_url(&input, &ctx, &ExportOptions::default()).unwrap();
/// assert_eq!(
///     url.as_str(),
///     "https://calendar.google.com/calendar/render?action=TEMPLATE&text=Launch&dates=20250131%2F20250201"
/// );
/// ```
pub fn build_google_calendar_url(
    input: &RawEventInput,
    ctx: &ParseContext,
    opts: &ExportOptions,
) -> Result<Url> {
    let range = input.resolve(ctx)?;
    google_calendar_url(input, &range, opts)
}

/// Build the template link for an already-resolved range.
pub fn google_calendar_url(
    input: &RawEventInput,
    range: &ResolvedEventRange,
    opts: &ExportOptions,
) -> Result<Url> {
    let dates = range.dates_param();
    let mut params = vec![
        ("action", "TEMPLATE"),
        ("text", input.display_title(opts)),
        ("dates", dates.as_str()),
    ];
    if let Some(description) = input.description_text() {
        params.push(("details", description));
    }
    if let Some(location) = input.location_text() {
        params.push(("location", location));
    }

    Url::parse_with_params(GOOGLE_CALENDAR_TEMPLATE_URL, &params)
        .map_err(|e| EngineError::InvalidInput(format!("calendar link: {e}")))
}

// ── Tests ───────────────────────────────────────────────────────────────────
