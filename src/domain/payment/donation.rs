//! Donations: one-off push payments started by a visitor.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::billing::{PaymentCorrelation, PaymentReceipt};
use crate::domain::foundation::{DonationId, StateMachine, ValidationError};

use super::PhoneNumber;

/// Donation settlement status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DonationStatus {
    #[default]
    Pending,
    Success,
    Failed,
}

impl DonationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DonationStatus::Pending => "pending",
            DonationStatus::Success => "success",
            DonationStatus::Failed => "failed",
        }
    }
}

impl StateMachine for DonationStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        matches!(
            (self, target),
            (DonationStatus::Pending, DonationStatus::Success)
                | (DonationStatus::Pending, DonationStatus::Failed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            DonationStatus::Pending => vec![DonationStatus::Success, DonationStatus::Failed],
            DonationStatus::Success | DonationStatus::Failed => vec![],
        }
    }
}

impl std::str::FromStr for DonationStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(DonationStatus::Pending),
            "success" => Ok(DonationStatus::Success),
            "failed" => Ok(DonationStatus::Failed),
            other => Err(ValidationError::invalid_format(
                "donation_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

impl fmt::Display for DonationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A visitor donation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Donation {
    pub id: DonationId,
    pub donor_name: String,
    pub phone: PhoneNumber,
    pub amount: Decimal,
    pub account_reference: String,
    pub merchant_request_id: Option<String>,
    pub checkout_request_id: Option<String>,
    pub status: DonationStatus,
    pub mpesa_receipt_number: Option<String>,
    pub transaction_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Donation {
    /// Creates a pending donation referenced `DON-<unix millis>`.
    pub fn new(
        donor_name: impl Into<String>,
        phone: PhoneNumber,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let donor_name = donor_name.into().trim().to_string();
        if donor_name.is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        if amount < Decimal::ONE {
            return Err(ValidationError::too_small("amount", 1, amount));
        }
        Ok(Self {
            id: DonationId::new(),
            donor_name,
            phone,
            amount,
            account_reference: format!("DON-{}", now.timestamp_millis()),
            merchant_request_id: None,
            checkout_request_id: None,
            status: DonationStatus::Pending,
            mpesa_receipt_number: None,
            transaction_date: None,
            created_at: now,
        })
    }

    pub fn attach_checkout(&mut self, correlation: PaymentCorrelation) {
        self.merchant_request_id = Some(correlation.merchant_request_id);
        self.checkout_request_id = Some(correlation.checkout_request_id);
    }

    pub fn mark_success(&mut self, receipt: PaymentReceipt) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(DonationStatus::Success)?;
        self.mpesa_receipt_number = Some(receipt.receipt_number);
        self.transaction_date = Some(receipt.paid_at);
        Ok(())
    }

    pub fn mark_failed(&mut self) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(DonationStatus::Failed)?;
        Ok(())
    }
}
