//! Mobile-money push payment gateway port.
//!
//! One parameterized operation covers both the pay-bill (invoice) and the
//! buy-goods (donation) flows; the flow selects transaction type, receiving
//! party and callback URL.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::payment::{PaymentFlow, PhoneNumber};

/// Response code the gateway returns when it accepted a push.
pub const RESPONSE_CODE_ACCEPTED: &str = "0";

/// A push payment to initiate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StkPushRequest {
    pub phone: PhoneNumber,
    /// Whole currency units; the caller rounds up.
    pub amount: i64,
    pub account_reference: String,
    pub description: String,
    pub flow: PaymentFlow,
}

/// The gateway's synchronous answer to a push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StkPushResponse {
    #[serde(rename = "MerchantRequestID", default)]
    pub merchant_request_id: String,
    #[serde(rename = "CheckoutRequestID", default)]
    pub checkout_request_id: String,
    #[serde(rename = "ResponseCode", default)]
    pub response_code: String,
    #[serde(rename = "ResponseDescription", default)]
    pub response_description: String,
    #[serde(rename = "CustomerMessage", default)]
    pub customer_message: String,
}

impl StkPushResponse {
    /// True when the gateway accepted the request and a prompt was sent.
    pub fn is_accepted(&self) -> bool {
        self.response_code.trim() == RESPONSE_CODE_ACCEPTED && !self.checkout_request_id.is_empty()
    }
}

/// Gateway failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// Credentials, short code, pass key or callback URL are not set.
    #[error("Gateway not configured: {0}")]
    Configuration(String),

    /// The OAuth token endpoint failed.
    #[error("Gateway authentication failed: {0}")]
    Auth(String),

    /// The request never completed (DNS, TLS, timeout).
    #[error("Gateway transport error: {0}")]
    Transport(String),

    /// The gateway answered with a non-2xx status.
    #[error("Gateway rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// A 2xx body could not be decoded.
    #[error("Gateway returned an invalid response: {0}")]
    InvalidResponse(String),
}

/// Port for the push payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Sends a push prompt to the payer's phone.
    ///
    /// A non-zero `ResponseCode` in a 2xx body is returned, not raised.
    async fn initiate_push(&self, request: StkPushRequest) -> Result<StkPushResponse, GatewayError>;
}
