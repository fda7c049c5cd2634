//! Maps `BillingError` to HTTP responses.
//!
//! Internal detail is logged here and never returned to the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::domain::billing::BillingError;
use crate::domain::foundation::DomainError;

use super::dto::ErrorResponse;

/// API error type that converts billing errors to HTTP responses.
#[derive(Debug)]
pub enum BillingApiError {
    Billing(BillingError),
    /// Shared secret or session missing or wrong.
    Unauthorized,
}

impl From<BillingError> for BillingApiError {
    fn from(err: BillingError) -> Self {
        Self::Billing(err)
    }
}

impl From<DomainError> for BillingApiError {
    fn from(err: DomainError) -> Self {
        Self::Billing(err.into())
    }
}

impl BillingApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            BillingApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            BillingApiError::Billing(err) => match err {
                BillingError::NotFound { .. } => StatusCode::NOT_FOUND,
                BillingError::Forbidden => StatusCode::FORBIDDEN,
                BillingError::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
                BillingError::InvalidState { .. } => StatusCode::CONFLICT,
                BillingError::Gateway(_) => StatusCode::BAD_GATEWAY,
                BillingError::RelationMissing { .. }
                | BillingError::Configuration(_)
                | BillingError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for BillingApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            BillingApiError::Unauthorized => ErrorResponse::new("UNAUTHORIZED", "Unauthorized"),
            BillingApiError::Billing(err) => {
                if status.is_server_error() {
                    tracing::error!(code = %err.code(), detail = %err.detail(), "Request failed");
                } else {
                    tracing::debug!(code = %err.code(), detail = %err.detail(), "Request rejected");
                }
                ErrorResponse::new(err.code().to_string(), err.message())
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let cases = [
            (BillingError::not_found("invoice", "x"), StatusCode::NOT_FOUND),
            (BillingError::forbidden(), StatusCode::FORBIDDEN),
            (BillingError::validation("phone", "bad"), StatusCode::BAD_REQUEST),
            (BillingError::invalid_state("paid", "pay"), StatusCode::CONFLICT),
            (BillingError::gateway("500"), StatusCode::BAD_GATEWAY),
            (BillingError::configuration("no key"), StatusCode::INTERNAL_SERVER_ERROR),
            (BillingError::infrastructure("db"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(BillingApiError::from(err).status(), status);
        }
        assert_eq!(BillingApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn server_errors_hide_detail() {
        let response =
            BillingApiError::from(BillingError::infrastructure("password=hunter2")).into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(!text.contains("hunter2"));
        assert!(text.contains("DATABASE_ERROR"));
    }
}
