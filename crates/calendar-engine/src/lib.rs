//! # calendar-engine
//!
//! Deterministic event time normalization and calendar export.
//!
//! Event times extracted from arbitrary web text (typically by an LLM) come in
//! every shape imaginable: `2025-12-16T10:00:00+0900`, `12/16 10:00`,
//! `２０２５年１２月１６日 10時半 JST`. This crate turns such strings into one
//! canonical time range and renders it as an RFC 5545 `.ics` document and a
//! Google Calendar template link. When a string cannot be read
//! unambiguously, resolution fails instead of guessing.
//!
//! ## Modules
//!
//! - [`normalize`] — Text cleanup applied before any pattern is tried
//! - [`parser`] — Ranked-pattern date and datetime parsing
//! - [`range`] — Start/end/all-day → [`ResolvedEventRange`]
//! - [`format`] — `YYYYMMDDTHHMMSSZ` / `YYYYMMDD` formatters
//! - [`ics`] — RFC 5545 document rendering (escaping, folding)
//! - [`link`] — Google Calendar template links
//! - [`event`] — Raw extracted input and the combined export
//! - [`config`] — Engine configuration
//! - [`error`] — Error types
//!
//! ## Example
//!
//! ```
//! use calendar_engine::{export_event, ExportOptions, ParseContext, RawEventInput};
//! use chrono::{TimeZone, Utc};
//!
//! let ctx = ParseContext::new(
//!     Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
//!     chrono_tz::Asia::Tokyo,
//! );
//! let input = RawEventInput::new("Team sync", "12月16日 10時");
//! let export = export_event(&input, &ctx, &ExportOptions::default()).unwrap();
//! assert_eq!(export.range.dates_param(), "20251216T010000Z/20251216T020000Z");
//! assert!(export.ics.as_str().contains("SUMMARY:Team sync\r\n"));
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod format;
pub mod ics;
pub mod link;
pub mod normalize;
pub mod parser;
pub mod range;

pub use config::{parse_timezone, EngineConfig, ExportOptions};
pub use error::EngineError;
pub use event::{export_event, EventExport, RawEventInput};
pub use format::{format_local_yyyymmdd, format_utc_instant, next_day_yyyymmdd};
pub use ics::{build_ics, render_ics, IcsDocument};
pub use link::{build_google_calendar_url, google_calendar_url};
pub use normalize::normalize_input;
pub use parser::{parse_date_only, parse_datetime_loose, ParseContext};
pub use range::{decide_all_day, resolve, AllDayDecision, ResolvedEventRange};
