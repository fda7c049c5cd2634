//! Subscription entity and the due-subscription view used by the scheduler.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{PlanId, SubscriptionId, UserId};

use super::{AccountHolder, Plan};

/// Lifecycle status of a subscription. Only `active` ones are billed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    #[serde(untagged)]
    Inactive(String),
}

impl SubscriptionStatus {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "active" => SubscriptionStatus::Active,
            other => SubscriptionStatus::Inactive(other.to_string()),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, SubscriptionStatus::Active)
    }
}

/// A recurring billing agreement.
///
/// # Invariants
///
/// - `next_billing_date` is only moved forward after an invoice for the
///   current period has been recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub account_id: UserId,
    pub plan_id: PlanId,
    pub custom_price: Option<Decimal>,
    pub next_billing_date: NaiveDate,
    pub status: SubscriptionStatus,
}

impl Subscription {
    /// True when the subscription should be invoiced on `today`.
    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.status.is_active() && self.next_billing_date <= today
    }

    /// Price to invoice: the negotiated override when present, else the
    /// plan's list price.
    pub fn final_price(&self, plan: &Plan) -> Decimal {
        self.custom_price.unwrap_or(plan.price)
    }
}

/// A due subscription with its related rows resolved by the store.
///
/// Related rows are zero-or-one: the join layer normalizes whatever shape
/// the database returns into `Option`, so callers never unwrap collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueSubscription {
    pub subscription: Subscription,
    pub plan: Option<Plan>,
    pub account: Option<AccountHolder>,
}
