//! Profile reader port.
//!
//! Profiles are owned by the auth backend; the portal reads display name,
//! email and role.

use async_trait::async_trait;

use crate::domain::billing::AccountHolder;
use crate::domain::foundation::{DomainError, UserId};

#[async_trait]
pub trait ProfileReader: Send + Sync {
    /// Returns `None` if the user has no profile row.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<AccountHolder>, DomainError>;
}
