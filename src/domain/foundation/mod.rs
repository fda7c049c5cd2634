//! Foundation module - Shared domain primitives.
//!
//! Identifiers, error types, the status state machine trait and the
//! authentication vocabulary used across the billing workflow.

mod auth;
mod errors;
mod ids;
mod state_machine;

pub use auth::{AuthError, AuthenticatedUser, Role};
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{DonationId, InvoiceId, PlanId, SubscriptionId, UserId};
pub use state_machine::StateMachine;
