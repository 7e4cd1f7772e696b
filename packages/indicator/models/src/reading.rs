//! Numeric cell values that remember their source text.
//!
//! A [`Reading`] pairs the parsed value with the exact text it came from.
//! Writing a dataset back out uses the text, so unmodified rows serialize
//! byte-for-byte as they were read (`"25.10"` stays `"25.10"`, `"1200"`
//! does not become `"1200.0"`).

/// Cell contents treated as a missing value (compared case-insensitively
/// after trimming).
pub const MISSING_TOKENS: &[&str] = &["", "na", "n/a", "nan", "null"];

/// Error returned when a cell is neither a number nor a missing token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid numeric value '{text}'")]
pub struct InvalidReadingError {
    /// The offending cell text.
    pub text: String,
}

/// A single numeric cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    value: Option<f64>,
    text: String,
}

impl Reading {
    /// Parses a cell, keeping its text verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidReadingError`] if the cell is not a finite number
    /// and not one of the [`MISSING_TOKENS`].
    pub fn parse(text: &str) -> Result<Self, InvalidReadingError> {
        let trimmed = text.trim();

        if MISSING_TOKENS
            .iter()
            .any(|token| trimmed.eq_ignore_ascii_case(token))
        {
            return Ok(Self {
                value: None,
                text: text.to_string(),
            });
        }

        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(Self {
                value: Some(value),
                text: text.to_string(),
            }),
            _ => Err(InvalidReadingError {
                text: text.to_string(),
            }),
        }
    }

    /// Builds a reading from a computed value, formatted with the shortest
    /// representation that parses back to the same `f64`. Non-finite values
    /// become missing.
    #[must_use]
    pub fn from_value(value: f64) -> Self {
        if value.is_finite() {
            Self {
                value: Some(value),
                text: format_value(value),
            }
        } else {
            Self::missing()
        }
    }

    /// An empty, missing reading.
    #[must_use]
    pub const fn missing() -> Self {
        Self {
            value: None,
            text: String::new(),
        }
    }

    /// The parsed value, `None` when missing.
    #[must_use]
    pub const fn value(&self) -> Option<f64> {
        self.value
    }

    /// The source text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns `true` if the cell holds no value.
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        self.value.is_none()
    }
}

/// Formats a finite value with the shortest round-trip representation.
#[must_use]
pub fn format_value(value: f64) -> String {
    format!("{value}")
}
