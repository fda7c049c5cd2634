//! PostgreSQL implementation of SubscriptionRepository.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::{DueSubscription, Subscription, SubscriptionStatus};
use crate::domain::foundation::{DomainError, ErrorCode, PlanId, SubscriptionId, UserId};
use crate::ports::SubscriptionRepository;

use super::rows::{db_error, PlanColumns, ProfileColumns, PLAN_COLUMNS, PROFILE_COLUMNS};

pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DueSubscriptionRow {
    id: Uuid,
    account_id: Uuid,
    plan_id: Uuid,
    custom_price: Option<Decimal>,
    next_billing_date: NaiveDate,
    status: String,
    #[sqlx(flatten)]
    plan: PlanColumns,
    #[sqlx(flatten)]
    profile: ProfileColumns,
}

impl From<DueSubscriptionRow> for DueSubscription {
    fn from(row: DueSubscriptionRow) -> Self {
        DueSubscription {
            subscription: Subscription {
                id: SubscriptionId::from_uuid(row.id),
                account_id: UserId::from_uuid(row.account_id),
                plan_id: PlanId::from_uuid(row.plan_id),
                custom_price: row.custom_price,
                next_billing_date: row.next_billing_date,
                status: SubscriptionStatus::parse(&row.status),
            },
            plan: row.plan.into_plan(),
            account: row.profile.into_account(),
        }
    }
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn list_due(&self, today: NaiveDate) -> Result<Vec<DueSubscription>, DomainError> {
        let sql = format!(
            r#"
            SELECT s.id, s.account_id, s.plan_id, s.custom_price, s.next_billing_date, s.status,
                   {}, {}
            FROM subscriptions s
            LEFT JOIN plans p ON p.id = s.plan_id
            LEFT JOIN profiles pr ON pr.id = s.account_id
            WHERE lower(s.status) = 'active' AND s.next_billing_date <= $1
            ORDER BY s.next_billing_date, s.id
            "#,
            PLAN_COLUMNS, PROFILE_COLUMNS
        );

        let rows: Vec<DueSubscriptionRow> = sqlx::query_as(&sql)
            .bind(today)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list due subscriptions"))?;

        Ok(rows.into_iter().map(DueSubscription::from).collect())
    }

    async fn advance_next_billing_date(
        &self,
        id: &SubscriptionId,
        next: NaiveDate,
    ) -> Result<(), DomainError> {
        let result = sqlx::query("UPDATE subscriptions SET next_billing_date = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(next)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to advance billing date"))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::SubscriptionNotFound,
                format!("Subscription not found: {}", id),
            ));
        }
        Ok(())
    }
}
