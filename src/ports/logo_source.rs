//! Logo asset source port.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;

use super::LogoImage;

/// Fetches the issuer logo printed on invoices.
///
/// Callers treat any error as "no logo" and render a text header instead.
#[async_trait]
pub trait LogoSource: Send + Sync {
    async fn fetch(&self) -> Result<LogoImage, DomainError>;
}
