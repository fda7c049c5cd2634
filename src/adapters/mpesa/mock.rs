//! Mock payment gateway for testing.
//!
//! Supports:
//! - Accepted responses with generated correlation ids (default)
//! - In-body rejections (non-zero `ResponseCode`)
//! - Error injection
//! - Call tracking

use std::sync::Mutex;

use async_trait::async_trait;

use crate::ports::{GatewayError, PaymentGateway, StkPushRequest, StkPushResponse};

#[derive(Default)]
struct MockState {
    calls: Vec<StkPushRequest>,
    next_error: Option<GatewayError>,
    next_response: Option<StkPushResponse>,
    counter: u64,
}

/// Configurable in-process `PaymentGateway`.
///
/// # Example
///
/// ```ignore
/// let gateway = MockPaymentGateway::new();
/// gateway.fail_next(GatewayError::Transport("timeout".into()));
/// ```
#[derive(Default)]
pub struct MockPaymentGateway {
    inner: Mutex<MockState>,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns `error` from the next call.
    pub fn fail_next(&self, error: GatewayError) {
        self.state().next_error = Some(error);
    }

    /// Returns `response` from the next call.
    pub fn respond_next(&self, response: StkPushResponse) {
        self.state().next_response = Some(response);
    }

    /// Answers the next call with a non-zero response code.
    pub fn reject_next(&self, code: &str, description: &str) {
        self.respond_next(StkPushResponse {
            merchant_request_id: String::new(),
            checkout_request_id: String::new(),
            response_code: code.to_string(),
            response_description: description.to_string(),
            customer_message: description.to_string(),
        });
    }

    pub fn calls(&self) -> Vec<StkPushRequest> {
        self.state().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state().calls.len()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn initiate_push(&self, request: StkPushRequest) -> Result<StkPushResponse, GatewayError> {
        let mut state = self.state();
        state.calls.push(request);
        if let Some(error) = state.next_error.take() {
            return Err(error);
        }
        if let Some(response) = state.next_response.take() {
            return Ok(response);
        }
        state.counter += 1;
        Ok(StkPushResponse {
            merchant_request_id: format!("mock-merchant-{}", state.counter),
            checkout_request_id: format!("ws_CO_mock_{}", state.counter),
            response_code: "0".to_string(),
            response_description: "Success. Request accepted for processing".to_string(),
            customer_message: "Success. Request accepted for processing".to_string(),
        })
    }
}
