//! ReconcileDonationCallbackHandler - Settles or fails donations from callbacks.

use std::sync::Arc;

use crate::domain::billing::BillingError;
use crate::domain::payment::{CallbackOutcome, StkCallback};
use crate::ports::DonationRepository;

use super::outcome::ReconcileOutcome;
use super::reconcile_invoice_callback::ReconcileCallbackCommand;

pub struct ReconcileDonationCallbackHandler {
    donations: Arc<dyn DonationRepository>,
}

impl ReconcileDonationCallbackHandler {
    pub fn new(donations: Arc<dyn DonationRepository>) -> Self {
        Self { donations }
    }

    pub async fn handle(&self, cmd: ReconcileCallbackCommand) -> Result<ReconcileOutcome, BillingError> {
        let callback = match StkCallback::parse(&cmd.payload) {
            Ok(callback) => callback,
            Err(e) => {
                tracing::warn!(error = %e, "Donation callback without stkCallback envelope");
                return Ok(ReconcileOutcome::InvalidPayload);
            }
        };
        let checkout_request_id = callback.checkout_request_id.as_str();
        let outcome = callback.outcome();

        if outcome == CallbackOutcome::MissingReceipt {
            tracing::warn!(checkout_request_id, "Successful donation callback without receipt number");
            return Ok(ReconcileOutcome::MissingReceipt);
        }

        let Some(mut donation) = self
            .donations
            .find_by_checkout_request_id(checkout_request_id)
            .await?
        else {
            tracing::warn!(checkout_request_id, "No donation for callback");
            return Ok(ReconcileOutcome::NotFound);
        };

        match outcome {
            CallbackOutcome::Succeeded(payment) => {
                let receipt = payment.receipt(cmd.received_at);
                if donation.mark_success(receipt.clone()).is_err()
                    || !self.donations.mark_success(&donation.id, &receipt).await?
                {
                    tracing::info!(donation_id = %donation.id, "Donation already settled");
                    return Ok(ReconcileOutcome::AlreadyProcessed);
                }
                tracing::info!(
                    donation_id = %donation.id,
                    receipt_number = %receipt.receipt_number,
                    "Donation received"
                );
                Ok(ReconcileOutcome::Paid)
            }
            CallbackOutcome::Failed {
                result_code,
                result_desc,
            } => {
                if donation.mark_failed().is_err() || !self.donations.mark_failed(&donation.id).await? {
                    tracing::info!(donation_id = %donation.id, "Donation already settled");
                    return Ok(ReconcileOutcome::AlreadyProcessed);
                }
                tracing::info!(
                    donation_id = %donation.id,
                    result_code,
                    result_desc = %result_desc,
                    "Donation payment failed"
                );
                Ok(ReconcileOutcome::Failed)
            }
            CallbackOutcome::MissingReceipt => Ok(ReconcileOutcome::MissingReceipt),
        }
    }
}
