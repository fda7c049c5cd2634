//! ReconcileInvoiceCallbackHandler - Settles invoices from gateway callbacks.
//!
//! The status update always lands before the receipt email is attempted,
//! and a failed email never undoes or repeats the update.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::application::handlers::billing::receipt_email;
use crate::domain::billing::{BillingError, Invoice, PaymentReceipt};
use crate::domain::payment::{CallbackOutcome, StkCallback};
use crate::ports::{InvoiceRepository, Mailer, ProfileReader};

use super::outcome::ReconcileOutcome;

#[derive(Debug, Clone)]
pub struct ReconcileCallbackCommand {
    pub payload: Value,
    pub received_at: DateTime<Utc>,
}

pub struct ReconcileInvoiceCallbackHandler {
    invoices: Arc<dyn InvoiceRepository>,
    profiles: Arc<dyn ProfileReader>,
    mailer: Arc<dyn Mailer>,
    company_name: String,
}

impl ReconcileInvoiceCallbackHandler {
    pub fn new(
        invoices: Arc<dyn InvoiceRepository>,
        profiles: Arc<dyn ProfileReader>,
        mailer: Arc<dyn Mailer>,
        company_name: impl Into<String>,
    ) -> Self {
        Self {
            invoices,
            profiles,
            mailer,
            company_name: company_name.into(),
        }
    }

    pub async fn handle(&self, cmd: ReconcileCallbackCommand) -> Result<ReconcileOutcome, BillingError> {
        let callback = match StkCallback::parse(&cmd.payload) {
            Ok(callback) => callback,
            Err(e) => {
                tracing::warn!(error = %e, "Invoice callback without stkCallback envelope");
                return Ok(ReconcileOutcome::InvalidPayload);
            }
        };
        let checkout_request_id = callback.checkout_request_id.as_str();

        let payment = match callback.outcome() {
            CallbackOutcome::Succeeded(payment) => payment,
            CallbackOutcome::Failed {
                result_code,
                result_desc,
            } => {
                tracing::info!(
                    checkout_request_id,
                    result_code,
                    result_desc = %result_desc,
                    "Invoice payment not completed"
                );
                return Ok(ReconcileOutcome::FailureAcknowledged);
            }
            CallbackOutcome::MissingReceipt => {
                tracing::warn!(checkout_request_id, "Successful invoice callback without receipt number");
                return Ok(ReconcileOutcome::MissingReceipt);
            }
        };

        let Some(mut invoice) = self
            .invoices
            .find_by_checkout_request_id(checkout_request_id)
            .await?
        else {
            tracing::warn!(checkout_request_id, "No invoice for callback");
            return Ok(ReconcileOutcome::NotFound);
        };

        let receipt = payment.receipt(cmd.received_at);
        if invoice.mark_paid(receipt.clone()).is_err() {
            tracing::info!(invoice_id = %invoice.id, status = %invoice.status, "Invoice already settled");
            return Ok(ReconcileOutcome::AlreadyProcessed);
        }
        if !self.invoices.mark_paid(&invoice.id, &receipt).await? {
            tracing::info!(invoice_id = %invoice.id, "Invoice settled by a concurrent delivery");
            return Ok(ReconcileOutcome::AlreadyProcessed);
        }

        tracing::info!(
            invoice_id = %invoice.id,
            receipt_number = %receipt.receipt_number,
            "Invoice paid"
        );

        self.send_receipt(&invoice, &receipt).await;
        Ok(ReconcileOutcome::Paid)
    }

    async fn send_receipt(&self, invoice: &Invoice, receipt: &PaymentReceipt) {
        let account = match self.profiles.find_by_id(&invoice.account_id).await {
            Ok(Some(account)) => account,
            Ok(None) => {
                tracing::warn!(invoice_id = %invoice.id, "No profile for receipt email");
                return;
            }
            Err(e) => {
                tracing::warn!(invoice_id = %invoice.id, error = %e, "Profile lookup for receipt failed");
                return;
            }
        };
        let Some(to) = account.contact_email() else {
            tracing::warn!(invoice_id = %invoice.id, "Profile has no email for receipt");
            return;
        };

        let email = receipt_email(to, account.display_name(), &self.company_name, invoice, receipt);
        if let Err(e) = self.mailer.send(email).await {
            tracing::error!(invoice_id = %invoice.id, error = %e, "Receipt email failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::{pending_invoice, profile, Harness};
    use crate::domain::billing::{InvoiceStatus, PaymentCorrelation};
    use crate::domain::foundation::Role;
    use crate::ports::MailStream;
    use chrono::TimeZone;
    use serde_json::json;

    fn handler(h: &Harness) -> ReconcileInvoiceCallbackHandler {
        ReconcileInvoiceCallbackHandler::new(h.store.clone(), h.store.clone(), h.mailer.clone(), "Acme")
    }

    fn received_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 3, 12, 0, 0).unwrap()
    }

    fn seeded(h: &Harness) -> Invoice {
        let owner = profile(Role::Client);
        h.store.insert_profile(owner.clone());
        let mut invoice = pending_invoice(&owner.id, 5000);
        invoice
            .attach_checkout(PaymentCorrelation {
                merchant_request_id: "29115-34620561-1".to_string(),
                checkout_request_id: "ws_CO_191220191020363925".to_string(),
            })
            .unwrap();
        h.store.insert_invoice(invoice.clone());
        invoice
    }

    fn success(checkout: &str) -> Value {
        json!({
            "Body": {
                "stkCallback": {
                    "MerchantRequestID": "29115-34620561-1",
                    "CheckoutRequestID": checkout,
                    "ResultCode": 0,
                    "ResultDesc": "The service request is processed successfully.",
                    "CallbackMetadata": {
                        "Item": [
                            { "Name": "PhoneNumber", "Value": 254712345678u64 },
                            { "Name": "TransactionDate", "Value": 20240103091500u64 },
                            { "Name": "Amount", "Value": 5000 },
                            { "Name": "MpesaReceiptNumber", "Value": "NLJ7RT61SV" }
                        ]
                    }
                }
            }
        })
    }

    async fn reconcile(h: &Harness, payload: Value) -> ReconcileOutcome {
        handler(h)
            .handle(ReconcileCallbackCommand {
                payload,
                received_at: received_at(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn success_marks_matching_invoice_paid_and_emails_receipt() {
        let h = Harness::new();
        let invoice = seeded(&h);

        let outcome = reconcile(&h, success("ws_CO_191220191020363925")).await;

        assert_eq!(outcome, ReconcileOutcome::Paid);
        let stored = h.store.invoice(&invoice.id).unwrap();
        assert_eq!(stored.status, InvoiceStatus::Paid);
        assert_eq!(stored.mpesa_receipt_number.as_deref(), Some("NLJ7RT61SV"));
        assert_eq!(
            stored.paid_at,
            Some(Utc.with_ymd_and_hms(2024, 1, 3, 6, 15, 0).unwrap())
        );
        let sent = h.mailer.sent_on(MailStream::Accounts);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "jane@client.test");
    }

    #[tokio::test]
    async fn duplicate_delivery_is_acknowledged_without_second_email() {
        let h = Harness::new();
        seeded(&h);

        reconcile(&h, success("ws_CO_191220191020363925")).await;
        let second = reconcile(&h, success("ws_CO_191220191020363925")).await;

        assert_eq!(second, ReconcileOutcome::AlreadyProcessed);
        assert_eq!(h.mailer.sent().len(), 1);
    }

    #[tokio::test]
    async fn unknown_checkout_id_mutates_nothing() {
        let h = Harness::new();
        let invoice = seeded(&h);

        let outcome = reconcile(&h, success("ws_CO_unknown")).await;

        assert_eq!(outcome, ReconcileOutcome::NotFound);
        assert_eq!(h.store.invoice(&invoice.id).unwrap(), invoice);
        assert!(h.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn failure_code_leaves_invoice_pending_without_receipt() {
        let h = Harness::new();
        let invoice = seeded(&h);
        let payload = json!({
            "Body": { "stkCallback": {
                "MerchantRequestID": "29115-34620561-1",
                "CheckoutRequestID": "ws_CO_191220191020363925",
                "ResultCode": 1032,
                "ResultDesc": "Request cancelled by user"
            }}
        });

        let outcome = reconcile(&h, payload).await;

        assert_eq!(outcome, ReconcileOutcome::FailureAcknowledged);
        let stored = h.store.invoice(&invoice.id).unwrap();
        assert_eq!(stored.status, InvoiceStatus::Pending);
        assert!(stored.mpesa_receipt_number.is_none());
    }

    #[tokio::test]
    async fn missing_receipt_is_acknowledged_without_mutation() {
        let h = Harness::new();
        let invoice = seeded(&h);
        let payload = json!({
            "Body": { "stkCallback": {
                "CheckoutRequestID": "ws_CO_191220191020363925",
                "ResultCode": 0,
                "ResultDesc": "ok",
                "CallbackMetadata": { "Item": [ { "Name": "Amount", "Value": 5000 } ] }
            }}
        });

        let outcome = reconcile(&h, payload).await;

        assert_eq!(outcome, ReconcileOutcome::MissingReceipt);
        assert_eq!(h.store.invoice(&invoice.id).unwrap(), invoice);
    }

    #[tokio::test]
    async fn malformed_envelope_is_invalid_payload() {
        let h = Harness::new();
        let outcome = reconcile(&h, json!({ "hello": "world" })).await;
        assert_eq!(outcome, ReconcileOutcome::InvalidPayload);
    }

    #[tokio::test]
    async fn email_failure_keeps_invoice_paid() {
        let h = Harness::new();
        let invoice = seeded(&h);
        h.mailer.set_failing(true);

        let outcome = reconcile(&h, success("ws_CO_191220191020363925")).await;

        assert_eq!(outcome, ReconcileOutcome::Paid);
        assert_eq!(h.store.invoice(&invoice.id).unwrap().status, InvoiceStatus::Paid);
    }

    #[tokio::test]
    async fn missing_profile_skips_email() {
        let h = Harness::new();
        let mut invoice = pending_invoice(&crate::domain::foundation::UserId::new(), 5000);
        invoice
            .attach_checkout(PaymentCorrelation {
                merchant_request_id: "m".to_string(),
                checkout_request_id: "ws_CO_orphan_profile".to_string(),
            })
            .unwrap();
        h.store.insert_invoice(invoice.clone());

        let outcome = reconcile(&h, success("ws_CO_orphan_profile")).await;

        assert_eq!(outcome, ReconcileOutcome::Paid);
        assert!(h.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn missing_transaction_date_falls_back_to_receipt_time() {
        let h = Harness::new();
        let invoice = seeded(&h);
        let payload = json!({
            "Body": { "stkCallback": {
                "CheckoutRequestID": "ws_CO_191220191020363925",
                "ResultCode": "0",
                "CallbackMetadata": { "Item": [ { "Name": "MpesaReceiptNumber", "Value": "QAX123" } ] }
            }}
        });

        reconcile(&h, payload).await;

        assert_eq!(h.store.invoice(&invoice.id).unwrap().paid_at, Some(received_at()));
    }
}
