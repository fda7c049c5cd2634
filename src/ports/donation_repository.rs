//! Donation repository port.

use async_trait::async_trait;

use crate::domain::billing::{PaymentCorrelation, PaymentReceipt};
use crate::domain::foundation::{DomainError, DonationId};
use crate::domain::payment::Donation;

/// Port for donation persistence.
///
/// Settle operations are conditional on the donation still being pending
/// and report whether a row changed.
#[async_trait]
pub trait DonationRepository: Send + Sync {
    async fn create(&self, donation: &Donation) -> Result<(), DomainError>;

    /// Fails with `DuplicateCheckoutRequest` if another record already
    /// holds the checkout request id.
    async fn attach_checkout(
        &self,
        id: &DonationId,
        correlation: &PaymentCorrelation,
    ) -> Result<(), DomainError>;

    async fn find_by_checkout_request_id(
        &self,
        checkout_request_id: &str,
    ) -> Result<Option<Donation>, DomainError>;

    async fn mark_success(
        &self,
        id: &DonationId,
        receipt: &PaymentReceipt,
    ) -> Result<bool, DomainError>;

    async fn mark_failed(&self, id: &DonationId) -> Result<bool, DomainError>;
}
