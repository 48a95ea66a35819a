//! Phone number value object for mobile-money subscribers.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// A Kenyan MSISDN in international format (`2547XXXXXXXX`).
///
/// Accepts `07...`, `+254...`, and `254...` input and normalizes to the
/// `254` form the Daraja API expects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Parses and normalizes a subscriber phone number.
    pub fn new(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_field("phone"));
        }

        let digits: String = match trimmed.strip_prefix('+') {
            Some(rest) => rest.to_string(),
            None => trimmed.to_string(),
        };

        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::invalid_format(
                "phone",
                "must contain only digits",
            ));
        }

        let normalized = if let Some(rest) = digits.strip_prefix('0') {
            format!("254{}", rest)
        } else {
            digits
        };

        if !normalized.starts_with("254") || normalized.len() != 12 {
            return Err(ValidationError::invalid_format(
                "phone",
                "expected a 12-digit 254XXXXXXXXX number",
            ));
        }

        Ok(Self(normalized))
    }

    /// Returns the normalized number as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
