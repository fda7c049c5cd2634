//! Catalog plans and account holders as seen by the billing workflow.
//!
//! Both are read-only reference data owned elsewhere; billing never writes
//! them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{PlanId, Role, UserId};

use super::BillingCycle;

/// Currency used when a plan has none configured.
pub const DEFAULT_CURRENCY: &str = "KES";

/// A catalog plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub name: String,
    pub price: Decimal,
    pub billing_cycle: BillingCycle,
    pub currency: Option<String>,
}

impl Plan {
    /// Plan currency, falling back to [`DEFAULT_CURRENCY`] when unset or blank.
    pub fn currency_or_default(&self) -> String {
        self.currency
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_uppercase)
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string())
    }
}

/// The profile row of a portal user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountHolder {
    pub id: UserId,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub role: Role,
}

impl AccountHolder {
    /// Name printed on invoices and receipts.
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .or(self.email.as_deref())
            .unwrap_or("Customer")
    }

    /// Email address if one is on file and non-blank.
    pub fn contact_email(&self) -> Option<&str> {
        self.email.as_deref().filter(|e| e.contains('@'))
    }
}
