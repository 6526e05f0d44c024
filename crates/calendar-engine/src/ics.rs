//! RFC 5545 serialization of a single event.
//!
//! Output is one `VCALENDAR` holding one `VEVENT`, CRLF-terminated, with
//! every content line folded at 75 octets (RFC 5545 §3.1) and text values
//! escaped per §3.3.11.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::ExportOptions;
use crate::error::{EngineError, Result};
use crate::event::RawEventInput;
use crate::format::format_utc_instant;
use crate::parser::ParseContext;
use crate::range::ResolvedEventRange;

/// RFC 5545 §3.1: content lines are folded at 75 octets.
pub const FOLD_LIMIT_OCTETS: usize = 75;

const CRLF: &str = "\r\n";

/// A rendered `.ics` document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct IcsDocument(String);

impl IcsDocument {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for IcsDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for IcsDocument {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Resolve `input` and render it as an ICS document.
///
/// The UID is a fresh UUIDv4 and `DTSTAMP` is `ctx.now`.
///
/// # Errors
///
/// Fails when the event's time range cannot be resolved (see
/// [`crate::range::resolve`]) or `DTSTAMP` cannot be formatted.
pub fn build_ics(
    input: &RawEventInput,
    ctx: &ParseContext,
    opts: &ExportOptions,
) -> Result<IcsDocument> {
    let range = input.resolve(ctx)?;
    let uid = uuid::Uuid::new_v4().to_string();
    render_ics(input, &range, &uid, ctx.now, opts)
}

/// Render an already-resolved range with a caller-chosen UID and `DTSTAMP`.
///
/// # Examples
///
/// ```
/// use calendar_engine::config::ExportOptions;
/// use calendar_engine::event::RawEventInput;
/// use calendar_engine::ics::render_ics;
/// use calendar_engine::range::ResolvedEventRange;
/// use chrono::{TimeZone, Utc};
///
/// let range = ResolvedEventRange::AllDay {
///     start_yyyymmdd: "20250131".into(),
///     end_yyyymmdd_exclusive: "20250201".into(),
/// };
/// let stamp = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
/// let input = RawEventInput::new("Launch", "2025-01-31");
/// let ics = render_ics(&input, &range, "uid-1", stamp, &ExportOptions::default()).unwrap();
/// assert!(ics.as_str().contains("DTSTART;VALUE=DATE:20250131\r\n"));
/// ```
pub fn render_ics(
    input: &RawEventInput,
    range: &ResolvedEventRange,
    uid: &str,
    dtstamp: DateTime<Utc>,
    opts: &ExportOptions,
) -> Result<IcsDocument> {
    let dtstamp = format_utc_instant(&dtstamp)
        .ok_or_else(|| EngineError::UnformattableRange(format!("DTSTAMP {dtstamp} out of range")))?;

    let (dtstart, dtend) = match range {
        ResolvedEventRange::AllDay {
            start_yyyymmdd,
            end_yyyymmdd_exclusive,
        } => (
            format!("DTSTART;VALUE=DATE:{start_yyyymmdd}"),
            format!("DTEND;VALUE=DATE:{end_yyyymmdd_exclusive}"),
        ),
        ResolvedEventRange::DateTime { start_utc, end_utc } => {
            (format!("DTSTART:{start_utc}"), format!("DTEND:{end_utc}"))
        }
    };

    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:{}", opts.product_id),
        "CALSCALE:GREGORIAN".to_string(),
        "BEGIN:VEVENT".to_string(),
        format!("UID:{uid}"),
        format!("DTSTAMP:{dtstamp}"),
        dtstart,
        dtend,
        format!("SUMMARY:{}", escape_text(input.display_title(opts))),
    ];
    if let Some(location) = input.location_text() {
        lines.push(format!("LOCATION:{}", escape_text(location)));
    }
    if let Some(description) = input.description_text() {
        lines.push(format!("DESCRIPTION:{}", escape_text(description)));
    }
    lines.push("END:VEVENT".to_string());
    lines.push("END:VCALENDAR".to_string());

    let mut out = String::new();
    for line in &lines {
        out.push_str(&fold_line(line));
        out.push_str(CRLF);
    }
    Ok(IcsDocument(out))
}

/// Escape a TEXT value (RFC 5545 §3.3.11).
///
/// Carriage returns are dropped; backslash, newline, `;` and `,` are escaped.
/// Backslashes go first so the escapes added afterwards stay single.
///
/// ```
/// use calendar_engine::ics::escape_text;
///
/// assert_eq!(escape_text("A;B,C\n"), "A\\;B\\,C\\n");
/// assert_eq!(escape_text("C:\\tmp\r\n"), "C:\\\\tmp\\n");
/// ```
pub fn escape_text(value: &str) -> String {
    value
        .replace('\r', "")
        .replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace(';', "\\;")
        .replace(',', "\\,")
}

/// Fold one content line so no physical line exceeds [`FOLD_LIMIT_OCTETS`].
///
/// Continuation lines start with a single space, which counts toward their
/// 75 octets. Splits never land inside a UTF-8 character.
pub fn fold_line(line: &str) -> String {
    if line.len() <= FOLD_LIMIT_OCTETS {
        return line.to_string();
    }

    let mut folded = String::with_capacity(line.len() + 3 * (line.len() / FOLD_LIMIT_OCTETS + 1));
    let mut rest = line;
    let mut limit = FOLD_LIMIT_OCTETS;
    while rest.len() > limit {
        let mut cut = limit;
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        let (chunk, tail) = rest.split_at(cut);
        folded.push_str(chunk);
        folded.push_str(CRLF);
        folded.push(' ');
        rest = tail;
        limit = FOLD_LIMIT_OCTETS - 1;
    }
    folded.push_str(rest);
    folded
}

// ── Tests ───────────────────────────────────────────────────────────────────
