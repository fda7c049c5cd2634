//! Billing handlers.
//!
//! ## Commands
//! - Running the periodic billing pass
//!
//! ## Queries
//! - Downloading an invoice document

mod download_invoice;
mod notifications;
mod run_billing_cycle;

pub use download_invoice::{DownloadInvoiceHandler, DownloadInvoiceQuery, InvoiceFile};
pub use notifications::{invoice_email, invoice_filename, receipt_email};
pub use run_billing_cycle::{
    BillingRunSettings, BillingRunSummary, RunBillingCycleCommand, RunBillingCycleHandler,
};
