//! Invoice repository port.
//!
//! # Design
//!
//! - **Correlation first**: gateway ids are stored before any callback can
//!   be matched against them
//! - **Conditional settle**: `mark_paid` only updates rows that are still
//!   payable, so a replayed callback changes nothing

use async_trait::async_trait;

use crate::domain::billing::{
    AccountHolder, Invoice, InvoiceNumber, PaymentCorrelation, PaymentReceipt, Plan,
};
use crate::domain::foundation::{DomainError, InvoiceId};

/// An invoice with the plan and account holder it was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceDetail {
    pub invoice: Invoice,
    pub plan: Option<Plan>,
    pub account: Option<AccountHolder>,
}

/// Port for invoice persistence.
#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    /// Inserts a new invoice.
    ///
    /// # Errors
    ///
    /// - `DuplicateInvoiceNumber` if the number is already taken
    /// - `DatabaseError` on persistence failure
    async fn create(&self, invoice: &Invoice) -> Result<(), DomainError>;

    /// Returns true if an invoice with this number exists.
    async fn number_exists(&self, number: &InvoiceNumber) -> Result<bool, DomainError>;

    async fn find_by_id(&self, id: &InvoiceId) -> Result<Option<Invoice>, DomainError>;

    /// Loads an invoice with its subscription's plan and its account holder.
    async fn find_detail(&self, id: &InvoiceId) -> Result<Option<InvoiceDetail>, DomainError>;

    /// Exact-match lookup by the gateway's checkout request id.
    async fn find_by_checkout_request_id(
        &self,
        checkout_request_id: &str,
    ) -> Result<Option<Invoice>, DomainError>;

    /// Stores the correlation ids returned by an accepted push.
    ///
    /// # Errors
    ///
    /// - `DuplicateCheckoutRequest` if another record already holds the id
    async fn attach_checkout(
        &self,
        id: &InvoiceId,
        correlation: &PaymentCorrelation,
    ) -> Result<(), DomainError>;

    /// Marks the invoice paid if it is still pending or overdue.
    ///
    /// Returns `false` when the row was already settled or cancelled.
    async fn mark_paid(&self, id: &InvoiceId, receipt: &PaymentReceipt) -> Result<bool, DomainError>;
}
