//! Application handlers.
//!
//! Command and query handlers that orchestrate the billing and payment
//! workflows over the ports.

mod access;
pub mod billing;
pub mod payments;

#[cfg(test)]
pub(crate) mod test_support;

pub use billing::{
    BillingRunSettings, BillingRunSummary, DownloadInvoiceHandler, DownloadInvoiceQuery,
    InvoiceFile, RunBillingCycleCommand, RunBillingCycleHandler,
};
pub use payments::{
    CreateDonationCommand, CreateDonationHandler, CreateDonationResult,
    InitiateInvoicePaymentCommand, InitiateInvoicePaymentHandler, PushInitiated,
    ReconcileCallbackCommand, ReconcileDonationCallbackHandler, ReconcileInvoiceCallbackHandler,
    ReconcileOutcome,
};
