//! Authentication adapters.
//!
//! Implementations of the `SessionValidator` port:
//!
//! - `jwt` - HS256 validation of the hosted auth backend's access tokens
//! - `mock` - Test implementation that doesn't require external services

mod jwt;
mod mock;

pub use jwt::{JwtSessionValidator, JwtValidatorConfig};
pub use mock::MockSessionValidator;
