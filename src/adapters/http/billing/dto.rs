//! Request and response bodies for the billing endpoints.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::handlers::{BillingRunSummary, CreateDonationResult, PushInitiated};

/// `GET /api/cron/billing` query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CronQuery {
    #[serde(default)]
    pub secret: Option<String>,
}

/// `POST /api/payments/invoices/{id}/push` body.
#[derive(Debug, Clone, Deserialize)]
pub struct InvoicePushRequest {
    pub phone: String,
}

/// `POST /api/donations` body.
#[derive(Debug, Clone, Deserialize)]
pub struct DonationRequest {
    pub name: String,
    pub phone: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct BillingRunResponse {
    pub generated: u32,
    pub errors: u32,
}

impl From<BillingRunSummary> for BillingRunResponse {
    fn from(summary: BillingRunSummary) -> Self {
        Self {
            generated: summary.generated,
            errors: summary.errors,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PushResponse {
    pub success: bool,
    pub checkout_request_id: String,
    pub merchant_request_id: String,
    pub response_code: String,
    pub message: String,
}

impl From<PushInitiated> for PushResponse {
    fn from(push: PushInitiated) -> Self {
        let message = if push.customer_message.is_empty() {
            push.response_description
        } else {
            push.customer_message
        };
        Self {
            success: push.accepted,
            checkout_request_id: push.checkout_request_id,
            merchant_request_id: push.merchant_request_id,
            response_code: push.response_code,
            message,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DonationResponse {
    pub donation_id: String,
    pub account_reference: String,
    #[serde(flatten)]
    pub push: PushResponse,
}

impl From<CreateDonationResult> for DonationResponse {
    fn from(result: CreateDonationResult) -> Self {
        Self {
            donation_id: result.donation_id.to_string(),
            account_reference: result.account_reference,
            push: result.push.into(),
        }
    }
}

/// Webhook acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebhookAck {
    pub result: String,
}

impl WebhookAck {
    pub fn new(result: impl Into<String>) -> Self {
        Self {
            result: result.into(),
        }
    }
}

/// Error response body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn donation_request_accepts_numeric_amount() {
        let req: DonationRequest =
            serde_json::from_str(r#"{"name":"Jane","phone":"254712345678","amount":500}"#).unwrap();
        assert_eq!(req.amount, Decimal::from(500));
    }

    #[test]
    fn push_response_prefers_customer_message() {
        let push = PushInitiated {
            accepted: true,
            merchant_request_id: "m".to_string(),
            checkout_request_id: "c".to_string(),
            response_code: "0".to_string(),
            response_description: "Success. Request accepted for processing".to_string(),
            customer_message: "Success. Request accepted for processing".to_string(),
        };
        let response = PushResponse::from(push);
        assert!(response.success);
        assert_eq!(response.message, "Success. Request accepted for processing");
    }
}
