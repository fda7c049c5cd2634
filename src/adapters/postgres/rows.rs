//! Row decoding shared by the billing repositories.
//!
//! Joined relations arrive as nullable column groups. They are folded into
//! `Option<Plan>` / `Option<AccountHolder>` here so no caller ever sees a
//! one-element list or a half-populated record.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::billing::{AccountHolder, BillingCycle, Plan};
use crate::domain::foundation::{DomainError, ErrorCode, PlanId, Role, UserId};

/// Nullable plan columns from a LEFT JOIN.
#[derive(Debug, Default, sqlx::FromRow)]
pub(super) struct PlanColumns {
    pub plan_row_id: Option<Uuid>,
    pub plan_name: Option<String>,
    pub plan_price: Option<Decimal>,
    pub plan_billing_cycle: Option<String>,
    pub plan_currency: Option<String>,
}

impl PlanColumns {
    pub fn into_plan(self) -> Option<Plan> {
        Some(Plan {
            id: PlanId::from_uuid(self.plan_row_id?),
            name: self.plan_name.unwrap_or_default(),
            price: self.plan_price?,
            billing_cycle: self
                .plan_billing_cycle
                .as_deref()
                .map(BillingCycle::parse)
                .unwrap_or(BillingCycle::Monthly),
            currency: self.plan_currency,
        })
    }
}

/// Nullable profile columns from a LEFT JOIN.
#[derive(Debug, Default, sqlx::FromRow)]
pub(super) struct ProfileColumns {
    pub profile_id: Option<Uuid>,
    pub profile_full_name: Option<String>,
    pub profile_email: Option<String>,
    pub profile_role: Option<String>,
}

impl ProfileColumns {
    pub fn into_account(self) -> Option<AccountHolder> {
        Some(AccountHolder {
            id: UserId::from_uuid(self.profile_id?),
            full_name: self.profile_full_name,
            email: self.profile_email,
            role: self
                .profile_role
                .as_deref()
                .map(Role::parse)
                .unwrap_or(Role::Client),
        })
    }
}

/// SELECT list for `PlanColumns`, assuming the plans table is aliased `p`.
pub(super) const PLAN_COLUMNS: &str = "p.id AS plan_row_id, p.name AS plan_name, \
     p.price AS plan_price, p.billing_cycle AS plan_billing_cycle, p.currency AS plan_currency";

/// SELECT list for `ProfileColumns`, assuming the profiles table is aliased `pr`.
pub(super) const PROFILE_COLUMNS: &str = "pr.id AS profile_id, pr.full_name AS profile_full_name, \
     pr.email AS profile_email, pr.role AS profile_role";

pub(super) fn db_error(context: &str) -> impl Fn(sqlx::Error) -> DomainError + '_ {
    move |e| {
        tracing::error!(error = %e, context, "Database query failed");
        DomainError::database(format!("{}: {}", context, e))
    }
}

/// Maps a write that hit a `*_checkout_request_id_key` unique index.
pub(super) fn correlation_error<'a>(
    constraint: &'static str,
    context: &'static str,
    checkout_request_id: &'a str,
) -> impl FnOnce(sqlx::Error) -> DomainError + 'a {
    move |e| {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.constraint() == Some(constraint) {
                tracing::error!(checkout_request_id, "Checkout request id already recorded");
                return DomainError::new(
                    ErrorCode::DuplicateCheckoutRequest,
                    format!("Checkout request id already recorded: {}", checkout_request_id),
                );
            }
        }
        db_error(context)(e)
    }
}

pub(super) fn corrupt(field: &str, err: impl std::fmt::Display) -> DomainError {
    DomainError::database(format!("Invalid stored {}: {}", field, err))
}
