//! Billing and payment error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | NotFound | 404 |
//! | Forbidden | 403 |
//! | RelationMissing | 500 |
//! | ValidationFailed | 400 |
//! | InvalidState | 409 |
//! | Configuration | 500 |
//! | Gateway | 502 |
//! | Infrastructure | 500 |

use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};

/// Errors surfaced by the billing and payment handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingError {
    /// A record was not found.
    NotFound { entity: &'static str, id: String },

    /// The caller may not act on this record.
    Forbidden,

    /// A required related row (plan, profile) is absent.
    RelationMissing { entity: &'static str, relation: &'static str },

    /// Input failed validation.
    ValidationFailed { field: String, message: String },

    /// The record's status does not allow the operation.
    InvalidState { current: String, attempted: String },

    /// Required configuration is missing.
    Configuration(String),

    /// The payment gateway failed or rejected the request.
    Gateway(String),

    /// Store, email or other infrastructure failure.
    Infrastructure(String),
}

impl BillingError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        BillingError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn forbidden() -> Self {
        BillingError::Forbidden
    }

    pub fn relation_missing(entity: &'static str, relation: &'static str) -> Self {
        BillingError::RelationMissing { entity, relation }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        BillingError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn invalid_state(current: impl Into<String>, attempted: impl Into<String>) -> Self {
        BillingError::InvalidState {
            current: current.into(),
            attempted: attempted.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        BillingError::Configuration(message.into())
    }

    pub fn gateway(message: impl Into<String>) -> Self {
        BillingError::Gateway(message.into())
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        BillingError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            BillingError::NotFound { entity, .. } => match *entity {
                "subscription" => ErrorCode::SubscriptionNotFound,
                "donation" => ErrorCode::DonationNotFound,
                "profile" => ErrorCode::ProfileNotFound,
                _ => ErrorCode::InvoiceNotFound,
            },
            BillingError::Forbidden => ErrorCode::Forbidden,
            BillingError::RelationMissing { .. } => ErrorCode::InternalError,
            BillingError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            BillingError::InvalidState { .. } => ErrorCode::InvalidStateTransition,
            BillingError::Configuration(_) => ErrorCode::ConfigurationError,
            BillingError::Gateway(_) => ErrorCode::GatewayError,
            BillingError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a user-facing message. Infrastructure detail is withheld.
    pub fn message(&self) -> String {
        match self {
            BillingError::NotFound { entity, id } => format!("{} not found: {}", capitalize(entity), id),
            BillingError::Forbidden => "You do not have access to this resource".to_string(),
            BillingError::RelationMissing { entity, relation } => {
                format!("{} is missing its {}", capitalize(entity), relation)
            }
            BillingError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            BillingError::InvalidState { current, attempted } => {
                format!("Cannot {} an invoice that is {}", attempted, current)
            }
            BillingError::Configuration(_) => "Payment service is not configured".to_string(),
            BillingError::Gateway(_) => "Payment gateway request failed".to_string(),
            BillingError::Infrastructure(_) => "An internal error occurred".to_string(),
        }
    }

    /// Detail for logs; may contain internal information.
    pub fn detail(&self) -> String {
        match self {
            BillingError::Configuration(msg)
            | BillingError::Gateway(msg)
            | BillingError::Infrastructure(msg) => msg.clone(),
            other => other.message(),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

impl std::fmt::Display for BillingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.detail())
    }
}

impl std::error::Error for BillingError {}

impl From<ValidationError> for BillingError {
    fn from(err: ValidationError) -> Self {
        BillingError::validation(err.field(), err.to_string())
    }
}

impl From<DomainError> for BillingError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed => BillingError::validation(
                err.details.get("field").cloned().unwrap_or_default(),
                err.message,
            ),
            ErrorCode::Forbidden | ErrorCode::Unauthorized => BillingError::Forbidden,
            ErrorCode::GatewayError => BillingError::Gateway(err.message),
            ErrorCode::ConfigurationError => BillingError::Configuration(err.message),
            _ => BillingError::Infrastructure(err.to_string()),
        }
    }
}
