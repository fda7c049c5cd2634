//! Billing cycle and renewal date arithmetic.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

/// Recurrence unit of a plan.
///
/// The catalog stores the cycle as free text. Anything that is not
/// `yearly` renews monthly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    Monthly,
    Yearly,
    #[serde(untagged)]
    Other(String),
}

impl BillingCycle {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "monthly" => BillingCycle::Monthly,
            "yearly" => BillingCycle::Yearly,
            other => BillingCycle::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            BillingCycle::Monthly => "monthly",
            BillingCycle::Yearly => "yearly",
            BillingCycle::Other(value) => value,
        }
    }

    /// Label shown on the invoice line item.
    pub fn label(&self) -> String {
        match self {
            BillingCycle::Monthly => "Monthly".to_string(),
            BillingCycle::Yearly => "Yearly".to_string(),
            BillingCycle::Other(value) => {
                let mut chars = value.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => "Monthly".to_string(),
                }
            }
        }
    }

    /// Number of calendar months one cycle spans.
    pub fn months(&self) -> u32 {
        match self {
            BillingCycle::Yearly => 12,
            _ => 1,
        }
    }

    /// Returns the billing date one cycle after `from`.
    ///
    /// Month-end dates clamp to the last day of the target month
    /// (Jan 31 + 1 month = Feb 28/29).
    pub fn advance(&self, from: NaiveDate) -> Result<NaiveDate, ValidationError> {
        from.checked_add_months(Months::new(self.months()))
            .ok_or_else(|| {
                ValidationError::invalid_format(
                    "next_billing_date",
                    format!("{} cannot be advanced by {} month(s)", from, self.months()),
                )
            })
    }
}

impl std::fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
