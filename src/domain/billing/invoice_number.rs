//! Human-readable invoice numbers: `INV-<year>-<4 digits>`.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Invoice number in the form `INV-2024-0427`.
///
/// The suffix is random, so uniqueness is checked by the caller against the
/// store and finally enforced by a unique constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InvoiceNumber(String);

impl InvoiceNumber {
    /// Generates a number for `year` with a random 4-digit suffix.
    pub fn generate(year: i32) -> Self {
        let suffix: u16 = rand::thread_rng().gen_range(0..10_000);
        Self::from_parts(year, suffix)
    }

    /// Builds a number from its parts. `suffix` is taken modulo 10 000.
    pub fn from_parts(year: i32, suffix: u16) -> Self {
        Self(format!("INV-{}-{:04}", year, suffix % 10_000))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Year component.
    pub fn year(&self) -> i32 {
        self.0[4..8].parse().unwrap_or_default()
    }
}

impl FromStr for InvoiceNumber {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::invalid_format("invoice_number", "expected INV-YYYY-NNNN");
        let rest = s.strip_prefix("INV-").ok_or_else(invalid)?;
        let (year, suffix) = rest.split_once('-').ok_or_else(invalid)?;
        let digits = |part: &str, len: usize| part.len() == len && part.bytes().all(|b| b.is_ascii_digit());
        if !digits(year, 4) || !digits(suffix, 4) {
            return Err(invalid());
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for InvoiceNumber {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<InvoiceNumber> for String {
    fn from(number: InvoiceNumber) -> Self {
        number.0
    }
}

impl fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
