//! Event input as extracted from page text, and the combined export.

use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

use crate::config::ExportOptions;
use crate::error::{EngineError, Result};
use crate::ics::{render_ics, IcsDocument};
use crate::link::google_calendar_url;
use crate::parser::ParseContext;
use crate::range::{resolve, ResolvedEventRange};

/// Untrusted event fields, typically straight from an LLM extraction.
///
/// Deserializes from the extraction payload's camelCase keys
/// (`{"title": ..., "start": ..., "allDay": true}`); `all_day` is accepted too.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawEventInput {
    #[serde(deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub start: String,
    pub end: Option<String>,
    #[serde(alias = "all_day")]
    pub all_day: Option<bool>,
    pub location: Option<String>,
    pub description: Option<String>,
}

impl RawEventInput {
    pub fn new(title: impl Into<String>, start: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            start: start.into(),
            ..Self::default()
        }
    }

    pub fn with_end(mut self, end: impl Into<String>) -> Self {
        self.end = Some(end.into());
        self
    }

    pub fn with_all_day(mut self, all_day: bool) -> Self {
        self.all_day = Some(all_day);
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Parse an extraction payload.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInput`] if the JSON does not describe an event.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| EngineError::InvalidInput(e.to_string()))
    }

    /// Resolve this event's time range.
    pub fn resolve(&self, ctx: &ParseContext) -> Result<ResolvedEventRange> {
        resolve(&self.start, self.end.as_deref(), self.all_day, ctx)
    }

    /// The title, or the configured placeholder when blank.
    pub fn display_title<'a>(&'a self, opts: &'a ExportOptions) -> &'a str {
        if self.title.trim().is_empty() {
            &opts.default_title
        } else {
            &self.title
        }
    }

    /// The location, if it has any non-whitespace content.
    pub fn location_text(&self) -> Option<&str> {
        non_blank(self.location.as_deref())
    }

    /// The description, if it has any non-whitespace content.
    pub fn description_text(&self) -> Option<&str> {
        non_blank(self.description.as_deref())
    }
}

/// Extractors emit `null` for fields they could not fill.
fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Both exported forms of one event, rendered from a single resolution.
#[derive(Debug, Clone, Serialize)]
pub struct EventExport {
    pub range: ResolvedEventRange,
    pub ics: IcsDocument,
    pub google_calendar_url: Url,
}

/// Resolve an event once and render both the ICS document and the
/// Google Calendar link from that range.
///
/// # Errors
///
/// Fails with the resolution error when the event's time cannot be resolved;
/// nothing is rendered in that case.
pub fn export_event(
    input: &RawEventInput,
    ctx: &ParseContext,
    opts: &ExportOptions,
) -> Result<EventExport> {
    let range = input.resolve(ctx)?;
    let uid = uuid::Uuid::new_v4().to_string();
    let ics = render_ics(input, &range, &uid, ctx.now, opts)?;
    let google_calendar_url = google_calendar_url(input, &range, opts)?;
    Ok(EventExport {
        range,
        ics,
        google_calendar_url,
    })
}

// ── Tests ───────────────────────────────────────────────────────────────────
