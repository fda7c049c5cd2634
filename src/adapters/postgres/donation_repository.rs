//! PostgreSQL implementation of DonationRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::{PaymentCorrelation, PaymentReceipt};
use crate::domain::foundation::{DomainError, DonationId, ErrorCode};
use crate::domain::payment::{Donation, DonationStatus, PhoneNumber};
use crate::ports::DonationRepository;

use super::rows::{corrupt, correlation_error, db_error};

const CHECKOUT_REQUEST_CONSTRAINT: &str = "donations_checkout_request_id_key";

pub struct PostgresDonationRepository {
    pool: PgPool,
}

impl PostgresDonationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DonationRow {
    id: Uuid,
    donor_name: String,
    phone: String,
    amount: Decimal,
    account_reference: String,
    merchant_request_id: Option<String>,
    checkout_request_id: Option<String>,
    status: String,
    mpesa_receipt_number: Option<String>,
    transaction_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<DonationRow> for Donation {
    type Error = DomainError;

    fn try_from(row: DonationRow) -> Result<Self, Self::Error> {
        Ok(Donation {
            id: DonationId::from_uuid(row.id),
            donor_name: row.donor_name,
            phone: PhoneNumber::parse(&row.phone).map_err(|e| corrupt("phone", e))?,
            amount: row.amount,
            account_reference: row.account_reference,
            merchant_request_id: row.merchant_request_id,
            checkout_request_id: row.checkout_request_id,
            status: row.status.parse().map_err(|e| corrupt("status", e))?,
            mpesa_receipt_number: row.mpesa_receipt_number,
            transaction_date: row.transaction_date,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl DonationRepository for PostgresDonationRepository {
    async fn create(&self, donation: &Donation) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO donations (
                id, donor_name, phone, amount, account_reference, merchant_request_id,
                checkout_request_id, status, mpesa_receipt_number, transaction_date, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(donation.id.as_uuid())
        .bind(&donation.donor_name)
        .bind(donation.phone.as_str())
        .bind(donation.amount)
        .bind(&donation.account_reference)
        .bind(&donation.merchant_request_id)
        .bind(&donation.checkout_request_id)
        .bind(donation.status.as_str())
        .bind(&donation.mpesa_receipt_number)
        .bind(donation.transaction_date)
        .bind(donation.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to create donation"))?;

        Ok(())
    }

    async fn attach_checkout(
        &self,
        id: &DonationId,
        correlation: &PaymentCorrelation,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE donations SET merchant_request_id = $2, checkout_request_id = $3 WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(&correlation.merchant_request_id)
        .bind(&correlation.checkout_request_id)
        .execute(&self.pool)
        .await
        .map_err(correlation_error(
            CHECKOUT_REQUEST_CONSTRAINT,
            "Failed to store checkout correlation",
            &correlation.checkout_request_id,
        ))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::DonationNotFound,
                format!("Donation not found: {}", id),
            ));
        }
        Ok(())
    }

    async fn find_by_checkout_request_id(
        &self,
        checkout_request_id: &str,
    ) -> Result<Option<Donation>, DomainError> {
        let row: Option<DonationRow> = sqlx::query_as(
            r#"
            SELECT id, donor_name, phone, amount, account_reference, merchant_request_id,
                   checkout_request_id, status, mpesa_receipt_number, transaction_date, created_at
            FROM donations
            WHERE checkout_request_id = $1
            "#,
        )
        .bind(checkout_request_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to look up donation by checkout id"))?;

        row.map(Donation::try_from).transpose()
    }

    async fn mark_success(
        &self,
        id: &DonationId,
        receipt: &PaymentReceipt,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE donations
            SET status = $2, mpesa_receipt_number = $3, transaction_date = $4
            WHERE id = $1 AND status = $5
            "#,
        )
        .bind(id.as_uuid())
        .bind(DonationStatus::Success.as_str())
        .bind(&receipt.receipt_number)
        .bind(receipt.paid_at)
        .bind(DonationStatus::Pending.as_str())
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to mark donation successful"))?;

        Ok(result.rows_affected() == 1)
    }

    async fn mark_failed(&self, id: &DonationId) -> Result<bool, DomainError> {
        let result = sqlx::query("UPDATE donations SET status = $2 WHERE id = $1 AND status = $3")
            .bind(id.as_uuid())
            .bind(DonationStatus::Failed.as_str())
            .bind(DonationStatus::Pending.as_str())
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to mark donation failed"))?;

        Ok(result.rows_affected() == 1)
    }
}
