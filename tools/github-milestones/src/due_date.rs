//! Milestone due date validation
//!
//! Due dates are accepted in one fixed ISO 8601 layout with an explicit UTC
//! offset, e.g. `2019-07-31T23:59:59-04:00`. Checking happens in two stages:
//! a pattern match on the exact character layout, then a calendar parse.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset};
use regex::Regex;
use thiserror::Error;

/// `strftime` layout matching [`ISO_8601_PATTERN`]
pub const ISO_8601_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Example shown to operators in error and help messages
pub const ISO_8601_EXAMPLE: &str = "2019-07-31T23:59:59-04:00";

static ISO_8601_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}[+-][0-9]{2}:[0-9]{2}$")
        .expect("Invalid ISO 8601 regex")
});

/// Errors produced while validating a due date
#[derive(Error, Debug)]
pub enum DueDateError {
    /// The text does not have the expected character layout
    #[error("not a valid ISO 8601 date (e.g. {example}): {0}", example = ISO_8601_EXAMPLE)]
    InvalidFormat(String),

    /// The layout matched but the value is not a real point in time
    #[error("failed to parse ISO 8601 date {input}: {source}")]
    Unparseable {
        input: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Whether `text` has exactly the `YYYY-MM-DDTHH:MM:SS±HH:MM` layout
pub fn is_valid_format(text: &str) -> bool {
    ISO_8601_PATTERN.is_match(text)
}

/// Syntactic check that reports the offending input on failure
pub fn validate(text: &str) -> Result<(), DueDateError> {
    if is_valid_format(text) {
        Ok(())
    } else {
        Err(DueDateError::InvalidFormat(text.to_string()))
    }
}

/// Parse a due date into a timestamp carrying its UTC offset
pub fn parse(text: &str) -> Result<DateTime<FixedOffset>, DueDateError> {
    validate(text)?;

    DateTime::parse_from_str(text, ISO_8601_FORMAT).map_err(|source| DueDateError::Unparseable {
        input: text.to_string(),
        source,
    })
}
