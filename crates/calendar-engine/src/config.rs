//! Engine configuration.
//!
//! [`EngineConfig`] is the serializable form (loaded from JSON by the CLI);
//! it splits into the two values the engine actually consumes: a
//! [`ParseContext`] (clock + zone) and [`ExportOptions`] (output text).

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::parser::ParseContext;

pub const DEFAULT_TIMEZONE: &str = "UTC";
pub const DEFAULT_PRODUCT_ID: &str = "-//calendar-engine//Event Export//EN";
pub const DEFAULT_TITLE: &str = "Untitled event";

/// Serializable engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// IANA zone for datetimes that carry no offset.
    pub timezone: String,
    /// `PRODID` written into every ICS document.
    pub product_id: String,
    /// Title used when the extracted one is blank.
    pub default_title: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE.to_string(),
            product_id: DEFAULT_PRODUCT_ID.to_string(),
            default_title: DEFAULT_TITLE.to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] for malformed JSON or invalid
    /// values, and [`EngineError::InvalidTimezone`] for an unknown zone.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        parse_timezone(&self.timezone)?;
        if self.product_id.trim().is_empty() {
            return Err(EngineError::InvalidConfig("product_id is blank".to_string()));
        }
        if self.product_id.contains(['\r', '\n']) {
            return Err(EngineError::InvalidConfig(
                "product_id contains a line break".to_string(),
            ));
        }
        if self.default_title.trim().is_empty() {
            return Err(EngineError::InvalidConfig(
                "default_title is blank".to_string(),
            ));
        }
        Ok(())
    }

    pub fn timezone(&self) -> Result<Tz> {
        parse_timezone(&self.timezone)
    }

    /// Build the parse context for a request evaluated at `now`.
    pub fn parse_context(&self, now: DateTime<Utc>) -> Result<ParseContext> {
        Ok(ParseContext::new(now, self.timezone()?))
    }

    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            product_id: self.product_id.clone(),
            default_title: self.default_title.clone(),
        }
    }
}

/// Text settings for the ICS and link outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub product_id: String,
    pub default_title: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        EngineConfig::default().export_options()
    }
}

/// Parse an IANA timezone string into `Tz`.
pub fn parse_timezone(s: &str) -> Result<Tz> {
    s.trim()
        .parse::<Tz>()
        .map_err(|_| EngineError::InvalidTimezone(format!("'{s}'")))
}

// ── Tests ───────────────────────────────────────────────────────────────────
