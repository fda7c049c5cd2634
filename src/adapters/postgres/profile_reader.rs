//! PostgreSQL implementation of ProfileReader.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::billing::AccountHolder;
use crate::domain::foundation::{DomainError, UserId};
use crate::ports::ProfileReader;

use super::rows::{db_error, ProfileColumns, PROFILE_COLUMNS};

pub struct PostgresProfileReader {
    pool: PgPool,
}

impl PostgresProfileReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileReader for PostgresProfileReader {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<AccountHolder>, DomainError> {
        let sql = format!("SELECT {} FROM profiles pr WHERE pr.id = $1", PROFILE_COLUMNS);
        let row: Option<ProfileColumns> = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to load profile"))?;

        Ok(row.and_then(ProfileColumns::into_account))
    }
}
