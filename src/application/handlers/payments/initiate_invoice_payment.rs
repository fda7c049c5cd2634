//! InitiateInvoicePaymentHandler - Sends a pay-bill push for an open invoice.

use std::sync::Arc;

use crate::application::handlers::access::authorize_invoice_access;
use crate::domain::billing::{to_gateway_amount, BillingError, PaymentCorrelation};
use crate::domain::foundation::{AuthenticatedUser, InvoiceId};
use crate::domain::payment::{PaymentFlow, PhoneNumber};
use crate::ports::{InvoiceRepository, PaymentGateway, ProfileReader, StkPushRequest};

use super::push::{gateway_failure, PushInitiated};

#[derive(Debug, Clone)]
pub struct InitiateInvoicePaymentCommand {
    pub invoice_id: InvoiceId,
    pub phone: String,
    pub user: AuthenticatedUser,
}

pub struct InitiateInvoicePaymentHandler {
    invoices: Arc<dyn InvoiceRepository>,
    profiles: Arc<dyn ProfileReader>,
    gateway: Arc<dyn PaymentGateway>,
}

impl InitiateInvoicePaymentHandler {
    pub fn new(
        invoices: Arc<dyn InvoiceRepository>,
        profiles: Arc<dyn ProfileReader>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            invoices,
            profiles,
            gateway,
        }
    }

    pub async fn handle(
        &self,
        cmd: InitiateInvoicePaymentCommand,
    ) -> Result<PushInitiated, BillingError> {
        let phone = PhoneNumber::parse(&cmd.phone)?;

        let mut invoice = self
            .invoices
            .find_by_id(&cmd.invoice_id)
            .await?
            .ok_or_else(|| BillingError::not_found("invoice", cmd.invoice_id))?;

        authorize_invoice_access(self.profiles.as_ref(), &cmd.user, &invoice).await?;

        if !invoice.status.is_payable() {
            return Err(BillingError::invalid_state(invoice.status.as_str(), "pay"));
        }

        let request = StkPushRequest {
            phone,
            amount: to_gateway_amount(invoice.amount())?,
            account_reference: invoice.invoice_number.to_string(),
            description: format!("Invoice {}", invoice.invoice_number),
            flow: PaymentFlow::Invoice,
        };

        let response = self.gateway.initiate_push(request).await.map_err(|e| {
            tracing::error!(invoice_id = %invoice.id, error = %e, "Invoice push failed");
            gateway_failure(e)
        })?;

        if !response.is_accepted() {
            tracing::warn!(
                invoice_id = %invoice.id,
                response_code = %response.response_code,
                description = %response.response_description,
                "Gateway declined invoice push"
            );
            return Ok(response.into());
        }

        let correlation = PaymentCorrelation {
            merchant_request_id: response.merchant_request_id.clone(),
            checkout_request_id: response.checkout_request_id.clone(),
        };
        // Only the latest push is matched; a late callback for the older one
        // is acknowledged as not found.
        if let Some(replaced) = invoice.checkout_request_id.as_deref() {
            tracing::warn!(
                invoice_id = %invoice.id,
                replaced_checkout_request_id = %replaced,
                checkout_request_id = %correlation.checkout_request_id,
                "Replacing checkout correlation of an earlier push"
            );
        }
        invoice.attach_checkout(correlation.clone())?;
        self.invoices
            .attach_checkout(&invoice.id, &correlation)
            .await
            .map_err(|e| {
                // The callback for this push can no longer be matched.
                tracing::error!(
                    invoice_id = %invoice.id,
                    checkout_request_id = %correlation.checkout_request_id,
                    error = %e,
                    "Failed to store checkout correlation"
                );
                BillingError::from(e)
            })?;

        tracing::info!(
            invoice_id = %invoice.id,
            checkout_request_id = %correlation.checkout_request_id,
            "Invoice push sent"
        );
        Ok(response.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::{pending_invoice, profile, Harness};
    use crate::domain::billing::{InvoiceStatus, PaymentReceipt};
    use crate::domain::foundation::{Role, UserId};
    use crate::domain::payment::TransactionType;
    use crate::ports::GatewayError;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn handler(h: &Harness) -> InitiateInvoicePaymentHandler {
        InitiateInvoicePaymentHandler::new(h.store.clone(), h.store.clone(), h.gateway.clone())
    }

    fn command(invoice_id: InvoiceId, user: UserId) -> InitiateInvoicePaymentCommand {
        InitiateInvoicePaymentCommand {
            invoice_id,
            phone: "0712345678".to_string(),
            user: AuthenticatedUser::new(user, None),
        }
    }

    #[tokio::test]
    async fn owner_push_uses_pay_bill_and_stores_correlation() {
        let h = Harness::new();
        let owner = profile(Role::Client);
        h.store.insert_profile(owner.clone());
        let invoice = pending_invoice(&owner.id, 5000);
        h.store.insert_invoice(invoice.clone());

        let result = handler(&h).handle(command(invoice.id, owner.id)).await.unwrap();

        assert!(result.accepted);
        let calls = h.gateway.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].flow.transaction_type(), TransactionType::PayBill);
        assert_eq!(calls[0].phone.as_str(), "254712345678");
        assert_eq!(calls[0].amount, 5000);
        assert_eq!(calls[0].account_reference, "INV-2024-0042");

        let stored = h.store.invoice(&invoice.id).unwrap();
        assert_eq!(stored.checkout_request_id.as_deref(), Some(result.checkout_request_id.as_str()));
        assert_eq!(stored.merchant_request_id.as_deref(), Some(result.merchant_request_id.as_str()));
    }

    #[tokio::test]
    async fn second_push_replaces_correlation() {
        let h = Harness::new();
        let owner = profile(Role::Client);
        h.store.insert_profile(owner.clone());
        let invoice = pending_invoice(&owner.id, 5000);
        h.store.insert_invoice(invoice.clone());

        let first = handler(&h).handle(command(invoice.id, owner.id)).await.unwrap();
        let second = handler(&h).handle(command(invoice.id, owner.id)).await.unwrap();

        assert_ne!(first.checkout_request_id, second.checkout_request_id);
        assert_eq!(h.gateway.call_count(), 2);
        let stored = h.store.invoice(&invoice.id).unwrap();
        assert_eq!(stored.checkout_request_id.as_deref(), Some(second.checkout_request_id.as_str()));
    }

    #[tokio::test]
    async fn fractional_amount_is_rounded_up() {
        let h = Harness::new();
        let owner = profile(Role::Client);
        h.store.insert_profile(owner.clone());
        let mut invoice = pending_invoice(&owner.id, 1);
        invoice = crate::domain::billing::Invoice::reconstitute(
            invoice.id,
            None,
            owner.id,
            invoice.invoice_number.clone(),
            Decimal::new(100050, 2),
            "KES".to_string(),
            InvoiceStatus::Pending,
            invoice.due_date,
            None,
            None,
            None,
            invoice.created_at,
        );
        h.store.insert_invoice(invoice.clone());

        handler(&h).handle(command(invoice.id, owner.id)).await.unwrap();

        assert_eq!(h.gateway.calls()[0].amount, 1001);
    }

    #[tokio::test]
    async fn stranger_is_forbidden_and_no_push_is_sent() {
        let h = Harness::new();
        let owner = profile(Role::Client);
        h.store.insert_profile(owner.clone());
        let invoice = pending_invoice(&owner.id, 5000);
        h.store.insert_invoice(invoice.clone());

        let err = handler(&h)
            .handle(command(invoice.id, UserId::new()))
            .await
            .unwrap_err();

        assert_eq!(err, BillingError::Forbidden);
        assert_eq!(h.gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn paid_invoice_cannot_be_pushed() {
        let h = Harness::new();
        let owner = profile(Role::Client);
        let mut invoice = pending_invoice(&owner.id, 5000);
        invoice
            .mark_paid(PaymentReceipt {
                receipt_number: "QAX1".to_string(),
                paid_at: Utc::now(),
            })
            .unwrap();
        h.store.insert_invoice(invoice.clone());

        let err = handler(&h).handle(command(invoice.id, owner.id)).await.unwrap_err();

        assert!(matches!(err, BillingError::InvalidState { .. }));
        assert_eq!(h.gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn invalid_phone_is_rejected_before_lookup() {
        let h = Harness::new();
        let mut cmd = command(InvoiceId::new(), UserId::new());
        cmd.phone = "12345".to_string();

        let err = handler(&h).handle(cmd).await.unwrap_err();

        assert!(matches!(err, BillingError::ValidationFailed { .. }));
    }

    #[tokio::test]
    async fn declined_push_is_returned_without_correlation() {
        let h = Harness::new();
        let owner = profile(Role::Client);
        let invoice = pending_invoice(&owner.id, 5000);
        h.store.insert_invoice(invoice.clone());
        h.gateway.reject_next("1", "Insufficient balance");

        let result = handler(&h).handle(command(invoice.id, owner.id)).await.unwrap();

        assert!(!result.accepted);
        assert_eq!(result.response_code, "1");
        assert!(h.store.invoice(&invoice.id).unwrap().checkout_request_id.is_none());
    }

    #[tokio::test]
    async fn transport_failure_surfaces_as_gateway_error() {
        let h = Harness::new();
        let owner = profile(Role::Client);
        let invoice = pending_invoice(&owner.id, 5000);
        h.store.insert_invoice(invoice.clone());
        h.gateway.fail_next(GatewayError::Rejected {
            status: 500,
            body: "upstream".to_string(),
        });

        let err = handler(&h).handle(command(invoice.id, owner.id)).await.unwrap_err();

        assert!(matches!(err, BillingError::Gateway(_)));
    }

    #[tokio::test]
    async fn missing_credentials_surface_as_configuration_error() {
        let h = Harness::new();
        let owner = profile(Role::Client);
        let invoice = pending_invoice(&owner.id, 5000);
        h.store.insert_invoice(invoice.clone());
        h.gateway
            .fail_next(GatewayError::Configuration("passkey not set".to_string()));

        let err = handler(&h).handle(command(invoice.id, owner.id)).await.unwrap_err();

        assert!(matches!(err, BillingError::Configuration(_)));
    }

    #[tokio::test]
    async fn correlation_write_failure_is_an_error() {
        let h = Harness::new();
        let owner = profile(Role::Client);
        let invoice = pending_invoice(&owner.id, 5000);
        h.store.insert_invoice(invoice.clone());
        h.store.fail_attach_checkout();

        let err = handler(&h).handle(command(invoice.id, owner.id)).await.unwrap_err();

        assert!(matches!(err, BillingError::Infrastructure(_)));
    }
}
