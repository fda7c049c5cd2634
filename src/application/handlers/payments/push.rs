//! Result type and error mapping shared by the push initiators.

use serde::Serialize;

use crate::domain::billing::BillingError;
use crate::ports::{GatewayError, StkPushResponse};

/// What the payer-facing caller learns about a push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushInitiated {
    /// True when the gateway sent a prompt to the phone.
    pub accepted: bool,
    pub merchant_request_id: String,
    pub checkout_request_id: String,
    pub response_code: String,
    pub response_description: String,
    pub customer_message: String,
}

impl From<StkPushResponse> for PushInitiated {
    fn from(response: StkPushResponse) -> Self {
        Self {
            accepted: response.is_accepted(),
            merchant_request_id: response.merchant_request_id,
            checkout_request_id: response.checkout_request_id,
            response_code: response.response_code,
            response_description: response.response_description,
            customer_message: response.customer_message,
        }
    }
}

pub(super) fn gateway_failure(err: GatewayError) -> BillingError {
    match err {
        GatewayError::Configuration(msg) => BillingError::configuration(msg),
        other => BillingError::gateway(other.to_string()),
    }
}
