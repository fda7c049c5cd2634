//! Payer phone numbers in the gateway's `2547XXXXXXXX` form.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::ValidationError;

/// A Kenyan mobile number normalized to international form without `+`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Normalizes `07XXXXXXXX`, `01XXXXXXXX`, `+2547XXXXXXXX` and
    /// `2547XXXXXXXX` (spaces and dashes ignored).
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let compact: String = raw
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect();
        if compact.is_empty() {
            return Err(ValidationError::empty_field("phone"));
        }

        let digits = compact.strip_prefix('+').unwrap_or(&compact);
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::invalid_format("phone", "must contain only digits"));
        }

        let subscriber = if let Some(rest) = digits.strip_prefix("254") {
            rest
        } else if let Some(rest) = digits.strip_prefix('0') {
            rest
        } else {
            return Err(ValidationError::invalid_format(
                "phone",
                "must start with 0, 254 or +254",
            ));
        };

        if subscriber.len() != 9 || !(subscriber.starts_with('7') || subscriber.starts_with('1')) {
            return Err(ValidationError::invalid_format(
                "phone",
                "expected a 9-digit mobile number after the country code",
            ));
        }

        Ok(Self(format!("254{}", subscriber)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PhoneNumber> for String {
    fn from(phone: PhoneNumber) -> Self {
        phone.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
