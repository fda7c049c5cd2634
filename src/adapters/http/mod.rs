//! HTTP adapters - REST API implementations.
//!
//! - `billing` - Scheduler trigger, payment pushes, webhooks, invoice download
//! - `middleware` - Access token validation and the `RequireAuth` extractor
//! - `server` - Router assembly and graceful shutdown

pub mod billing;
pub mod middleware;
pub mod server;

pub use billing::{billing_router, BillingAppState};
pub use server::{app_router, serve};
