//! Invoice access policy shared by download and payment initiation.

use crate::domain::billing::{BillingError, Invoice};
use crate::domain::foundation::AuthenticatedUser;
use crate::ports::ProfileReader;

/// Allows the invoice's account holder, or any user whose profile role is admin.
pub(crate) async fn authorize_invoice_access(
    profiles: &dyn ProfileReader,
    user: &AuthenticatedUser,
    invoice: &Invoice,
) -> Result<(), BillingError> {
    if invoice.account_id == user.id {
        return Ok(());
    }

    let is_admin = profiles
        .find_by_id(&user.id)
        .await?
        .map(|profile| profile.role.is_admin())
        .unwrap_or(false);

    if is_admin {
        Ok(())
    } else {
        tracing::warn!(user_id = %user.id, invoice_id = %invoice.id, "Invoice access denied");
        Err(BillingError::forbidden())
    }
}
