//! Payment handlers.
//!
//! ## Commands
//! - Pushing a pay-bill prompt for an invoice
//! - Recording a donation and pushing a buy-goods prompt
//! - Reconciling gateway callbacks for both flows

mod create_donation;
mod initiate_invoice_payment;
mod outcome;
mod push;
mod reconcile_donation_callback;
mod reconcile_invoice_callback;

pub use create_donation::{CreateDonationCommand, CreateDonationHandler, CreateDonationResult};
pub use initiate_invoice_payment::{InitiateInvoicePaymentCommand, InitiateInvoicePaymentHandler};
pub use outcome::ReconcileOutcome;
pub use push::PushInitiated;
pub use reconcile_donation_callback::ReconcileDonationCallbackHandler;
pub use reconcile_invoice_callback::{ReconcileCallbackCommand, ReconcileInvoiceCallbackHandler};
