//! CreateDonationHandler - Records a donation and sends a buy-goods push.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::billing::{to_gateway_amount, BillingError, PaymentCorrelation};
use crate::domain::foundation::DonationId;
use crate::domain::payment::{Donation, PaymentFlow, PhoneNumber};
use crate::ports::{DonationRepository, PaymentGateway, StkPushRequest};

use super::push::{gateway_failure, PushInitiated};

#[derive(Debug, Clone)]
pub struct CreateDonationCommand {
    pub name: String,
    pub phone: String,
    pub amount: Decimal,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateDonationResult {
    pub donation_id: DonationId,
    pub account_reference: String,
    pub push: PushInitiated,
}

pub struct CreateDonationHandler {
    donations: Arc<dyn DonationRepository>,
    gateway: Arc<dyn PaymentGateway>,
}

impl CreateDonationHandler {
    pub fn new(donations: Arc<dyn DonationRepository>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { donations, gateway }
    }

    pub async fn handle(&self, cmd: CreateDonationCommand) -> Result<CreateDonationResult, BillingError> {
        let phone = PhoneNumber::parse(&cmd.phone)?;
        let mut donation = Donation::new(cmd.name, phone, cmd.amount, cmd.now)?;
        let amount = to_gateway_amount(donation.amount)?;

        self.donations.create(&donation).await?;

        let request = StkPushRequest {
            phone: donation.phone.clone(),
            amount,
            account_reference: donation.account_reference.clone(),
            description: "Donation".to_string(),
            flow: PaymentFlow::Donation,
        };

        let response = match self.gateway.initiate_push(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(donation_id = %donation.id, error = %e, "Donation push failed");
                self.fail(&donation.id).await;
                return Err(gateway_failure(e));
            }
        };

        if !response.is_accepted() {
            tracing::warn!(
                donation_id = %donation.id,
                response_code = %response.response_code,
                description = %response.response_description,
                "Gateway declined donation push"
            );
            self.fail(&donation.id).await;
            return Ok(CreateDonationResult {
                donation_id: donation.id,
                account_reference: donation.account_reference,
                push: response.into(),
            });
        }

        let correlation = PaymentCorrelation {
            merchant_request_id: response.merchant_request_id.clone(),
            checkout_request_id: response.checkout_request_id.clone(),
        };
        donation.attach_checkout(correlation.clone());
        self.donations
            .attach_checkout(&donation.id, &correlation)
            .await
            .map_err(|e| {
                tracing::error!(
                    donation_id = %donation.id,
                    checkout_request_id = %correlation.checkout_request_id,
                    error = %e,
                    "Failed to store checkout correlation"
                );
                BillingError::from(e)
            })?;

        tracing::info!(
            donation_id = %donation.id,
            checkout_request_id = %correlation.checkout_request_id,
            "Donation push sent"
        );
        Ok(CreateDonationResult {
            donation_id: donation.id,
            account_reference: donation.account_reference,
            push: response.into(),
        })
    }

    async fn fail(&self, id: &DonationId) {
        if let Err(e) = self.donations.mark_failed(id).await {
            tracing::error!(donation_id = %id, error = %e, "Failed to mark donation failed");
        }
    }
}
