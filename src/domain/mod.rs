//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, errors, state machine, auth)
//! - `billing` - Plans, subscriptions, invoices and money formatting
//! - `payment` - Push-payment flows, donations and gateway callbacks

pub mod billing;
pub mod foundation;
pub mod payment;
