//! Subscription repository port.
//!
//! The scheduler only reads due subscriptions (with their plan and account
//! holder joined) and rolls their billing date forward.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::billing::DueSubscription;
use crate::domain::foundation::{DomainError, SubscriptionId};

/// Port for the subscription store.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Lists active subscriptions whose `next_billing_date <= today`.
    ///
    /// Related rows are resolved as zero-or-one; a missing plan or profile
    /// is reported as `None`, never as an error.
    async fn list_due(&self, today: NaiveDate) -> Result<Vec<DueSubscription>, DomainError>;

    /// Moves `next_billing_date` to `next`.
    ///
    /// # Errors
    ///
    /// - `SubscriptionNotFound` if the subscription does not exist
    /// - `DatabaseError` on persistence failure
    async fn advance_next_billing_date(
        &self,
        id: &SubscriptionId,
        next: NaiveDate,
    ) -> Result<(), DomainError>;
}
