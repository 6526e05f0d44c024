//! Error types for calendar-engine operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Empty start: the event has no start date or time")]
    EmptyStart,

    #[error("Unparseable start: {0}")]
    UnparseableStart(String),

    #[error("Unformattable range: {0}")]
    UnformattableRange(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
