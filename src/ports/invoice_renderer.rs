//! Invoice document rendering port.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::billing::{BillingCycle, InvoiceNumber};

/// Everything printed on an invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceDocument {
    pub invoice_number: InvoiceNumber,
    pub date: NaiveDate,
    /// Status label as shown on the badge (`paid`, `pending`, ...).
    pub status: String,
    pub recipient_name: String,
    pub recipient_email: String,
    pub plan_name: String,
    pub amount: Decimal,
    pub currency: String,
    pub billing_cycle: BillingCycle,
}

/// Image bytes for the document header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoImage {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Pure transform from invoice data to document bytes.
///
/// Implementations must be deterministic: identical inputs produce
/// identical output, with no clock, randomness or I/O.
pub trait InvoiceRenderer: Send + Sync {
    fn render(&self, document: &InvoiceDocument, logo: Option<&LogoImage>) -> Vec<u8>;

    /// MIME type of the produced bytes.
    fn content_type(&self) -> &'static str {
        "application/pdf"
    }
}
