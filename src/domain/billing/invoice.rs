//! Invoice entity and its status lifecycle.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{
    InvoiceId, StateMachine, SubscriptionId, UserId, ValidationError,
};

use super::InvoiceNumber;

/// Invoice payment status.
///
/// ```text
/// pending ──► paid
///    │  └───► cancelled
///    ▼            ▲
/// overdue ────────┘
///    └──► paid
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    #[default]
    Pending,
    Paid,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }

    /// Statuses from which a successful payment may still be applied.
    pub fn payable() -> [InvoiceStatus; 2] {
        [InvoiceStatus::Pending, InvoiceStatus::Overdue]
    }

    pub fn is_payable(&self) -> bool {
        self.can_transition_to(&InvoiceStatus::Paid)
    }
}

impl StateMachine for InvoiceStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use InvoiceStatus::*;
        matches!(
            (self, target),
            (Pending, Paid)
                | (Pending, Overdue)
                | (Pending, Cancelled)
                | (Overdue, Paid)
                | (Overdue, Cancelled)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use InvoiceStatus::*;
        match self {
            Pending => vec![Paid, Overdue, Cancelled],
            Overdue => vec![Paid, Cancelled],
            Paid | Cancelled => vec![],
        }
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(InvoiceStatus::Pending),
            "paid" => Ok(InvoiceStatus::Paid),
            "overdue" => Ok(InvoiceStatus::Overdue),
            "cancelled" => Ok(InvoiceStatus::Cancelled),
            other => Err(ValidationError::invalid_format(
                "invoice_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Correlation ids returned by the gateway when a push is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCorrelation {
    pub merchant_request_id: String,
    pub checkout_request_id: String,
}

/// Receipt details applied when a payment settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReceipt {
    pub receipt_number: String,
    pub paid_at: DateTime<Utc>,
}

/// A bill for one subscription period.
///
/// # Invariants
///
/// - `amount` is fixed at creation; there is no mutator.
/// - `paid_at` and `mpesa_receipt_number` are set together, exactly when the
///   status becomes `paid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub subscription_id: Option<SubscriptionId>,
    pub account_id: UserId,
    pub invoice_number: InvoiceNumber,
    amount: Decimal,
    pub currency: String,
    pub status: InvoiceStatus,
    pub due_date: NaiveDate,
    pub mpesa_receipt_number: Option<String>,
    pub merchant_request_id: Option<String>,
    pub checkout_request_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    /// Creates a pending invoice.
    pub fn new(
        subscription_id: Option<SubscriptionId>,
        account_id: UserId,
        invoice_number: InvoiceNumber,
        amount: Decimal,
        currency: impl Into<String>,
        due_date: NaiveDate,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if amount <= Decimal::ZERO {
            return Err(ValidationError::too_small("amount", "0.01", amount));
        }
        let currency = currency.into();
        if currency.trim().is_empty() {
            return Err(ValidationError::empty_field("currency"));
        }
        Ok(Self {
            id: InvoiceId::new(),
            subscription_id,
            account_id,
            invoice_number,
            amount,
            currency,
            status: InvoiceStatus::Pending,
            due_date,
            mpesa_receipt_number: None,
            merchant_request_id: None,
            checkout_request_id: None,
            paid_at: None,
            created_at,
        })
    }

    /// Rebuilds an invoice from storage without re-validating.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: InvoiceId,
        subscription_id: Option<SubscriptionId>,
        account_id: UserId,
        invoice_number: InvoiceNumber,
        amount: Decimal,
        currency: String,
        status: InvoiceStatus,
        due_date: NaiveDate,
        mpesa_receipt_number: Option<String>,
        correlation: Option<PaymentCorrelation>,
        paid_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let (merchant_request_id, checkout_request_id) = match correlation {
            Some(c) => (Some(c.merchant_request_id), Some(c.checkout_request_id)),
            None => (None, None),
        };
        Self {
            id,
            subscription_id,
            account_id,
            invoice_number,
            amount,
            currency,
            status,
            due_date,
            mpesa_receipt_number,
            merchant_request_id,
            checkout_request_id,
            paid_at,
            created_at,
        }
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn is_paid(&self) -> bool {
        self.status == InvoiceStatus::Paid
    }

    /// Records the gateway correlation ids of a push for this invoice.
    pub fn attach_checkout(&mut self, correlation: PaymentCorrelation) -> Result<(), ValidationError> {
        if !self.status.is_payable() {
            return Err(ValidationError::invalid_format(
                "status",
                format!("invoice is {}", self.status),
            ));
        }
        self.merchant_request_id = Some(correlation.merchant_request_id);
        self.checkout_request_id = Some(correlation.checkout_request_id);
        Ok(())
    }

    /// Applies a settled payment.
    pub fn mark_paid(&mut self, receipt: PaymentReceipt) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(InvoiceStatus::Paid)?;
        self.mpesa_receipt_number = Some(receipt.receipt_number);
        self.paid_at = Some(receipt.paid_at);
        Ok(())
    }
}
