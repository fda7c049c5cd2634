//! PostgreSQL implementation of InvoiceRepository.
//!
//! Settlement is a single conditional UPDATE guarded by the payable
//! statuses, so concurrent or replayed callbacks settle an invoice once.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::{
    Invoice, InvoiceNumber, InvoiceStatus, PaymentCorrelation, PaymentReceipt,
};
use crate::domain::foundation::{DomainError, ErrorCode, InvoiceId, SubscriptionId, UserId};
use crate::ports::{InvoiceDetail, InvoiceRepository};

use super::rows::{corrupt, correlation_error, db_error, PlanColumns, ProfileColumns, PLAN_COLUMNS, PROFILE_COLUMNS};

const INVOICE_NUMBER_CONSTRAINT: &str = "invoices_invoice_number_key";
const CHECKOUT_REQUEST_CONSTRAINT: &str = "invoices_checkout_request_id_key";

const INVOICE_COLUMNS: &str = "i.id, i.subscription_id, i.account_id, i.invoice_number, i.amount, \
     i.currency, i.status, i.due_date, i.mpesa_receipt_number, i.merchant_request_id, \
     i.checkout_request_id, i.paid_at, i.created_at";

pub struct PostgresInvoiceRepository {
    pool: PgPool,
}

impl PostgresInvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct InvoiceRow {
    id: Uuid,
    subscription_id: Option<Uuid>,
    account_id: Uuid,
    invoice_number: String,
    amount: Decimal,
    currency: String,
    status: String,
    due_date: NaiveDate,
    mpesa_receipt_number: Option<String>,
    merchant_request_id: Option<String>,
    checkout_request_id: Option<String>,
    paid_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<InvoiceRow> for Invoice {
    type Error = DomainError;

    fn try_from(row: InvoiceRow) -> Result<Self, Self::Error> {
        let invoice_number: InvoiceNumber = row
            .invoice_number
            .parse()
            .map_err(|e| corrupt("invoice_number", e))?;
        let status: InvoiceStatus = row.status.parse().map_err(|e| corrupt("status", e))?;
        let correlation = match (row.merchant_request_id, row.checkout_request_id) {
            (Some(merchant_request_id), Some(checkout_request_id)) => Some(PaymentCorrelation {
                merchant_request_id,
                checkout_request_id,
            }),
            _ => None,
        };

        Ok(Invoice::reconstitute(
            InvoiceId::from_uuid(row.id),
            row.subscription_id.map(SubscriptionId::from_uuid),
            UserId::from_uuid(row.account_id),
            invoice_number,
            row.amount,
            row.currency,
            status,
            row.due_date,
            row.mpesa_receipt_number,
            correlation,
            row.paid_at,
            row.created_at,
        ))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct InvoiceDetailRow {
    #[sqlx(flatten)]
    invoice: InvoiceRow,
    #[sqlx(flatten)]
    plan: PlanColumns,
    #[sqlx(flatten)]
    profile: ProfileColumns,
}

fn payable_statuses() -> Vec<String> {
    InvoiceStatus::payable()
        .iter()
        .map(|s| s.as_str().to_string())
        .collect()
}

#[async_trait]
impl InvoiceRepository for PostgresInvoiceRepository {
    async fn create(&self, invoice: &Invoice) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, subscription_id, account_id, invoice_number, amount, currency, status,
                due_date, mpesa_receipt_number, merchant_request_id, checkout_request_id,
                paid_at, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(invoice.id.as_uuid())
        .bind(invoice.subscription_id.map(|id| *id.as_uuid()))
        .bind(invoice.account_id.as_uuid())
        .bind(invoice.invoice_number.as_str())
        .bind(invoice.amount())
        .bind(&invoice.currency)
        .bind(invoice.status.as_str())
        .bind(invoice.due_date)
        .bind(&invoice.mpesa_receipt_number)
        .bind(&invoice.merchant_request_id)
        .bind(&invoice.checkout_request_id)
        .bind(invoice.paid_at)
        .bind(invoice.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some(INVOICE_NUMBER_CONSTRAINT) {
                    return DomainError::new(
                        ErrorCode::DuplicateInvoiceNumber,
                        format!("Invoice number already exists: {}", invoice.invoice_number),
                    );
                }
            }
            db_error("Failed to create invoice")(e)
        })?;

        Ok(())
    }

    async fn number_exists(&self, number: &InvoiceNumber) -> Result<bool, DomainError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM invoices WHERE invoice_number = $1)")
                .bind(number.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(db_error("Failed to check invoice number"))?;
        Ok(exists)
    }

    async fn find_by_id(&self, id: &InvoiceId) -> Result<Option<Invoice>, DomainError> {
        let sql = format!("SELECT {} FROM invoices i WHERE i.id = $1", INVOICE_COLUMNS);
        let row: Option<InvoiceRow> = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to load invoice"))?;

        row.map(Invoice::try_from).transpose()
    }

    async fn find_detail(&self, id: &InvoiceId) -> Result<Option<InvoiceDetail>, DomainError> {
        let sql = format!(
            r#"
            SELECT {}, {}, {}
            FROM invoices i
            LEFT JOIN subscriptions s ON s.id = i.subscription_id
            LEFT JOIN plans p ON p.id = s.plan_id
            LEFT JOIN profiles pr ON pr.id = i.account_id
            WHERE i.id = $1
            "#,
            INVOICE_COLUMNS, PLAN_COLUMNS, PROFILE_COLUMNS
        );
        let row: Option<InvoiceDetailRow> = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to load invoice detail"))?;

        row.map(|row| {
            Ok(InvoiceDetail {
                invoice: Invoice::try_from(row.invoice)?,
                plan: row.plan.into_plan(),
                account: row.profile.into_account(),
            })
        })
        .transpose()
    }

    async fn find_by_checkout_request_id(
        &self,
        checkout_request_id: &str,
    ) -> Result<Option<Invoice>, DomainError> {
        let sql = format!(
            "SELECT {} FROM invoices i WHERE i.checkout_request_id = $1",
            INVOICE_COLUMNS
        );
        let row: Option<InvoiceRow> = sqlx::query_as(&sql)
            .bind(checkout_request_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to look up invoice by checkout id"))?;

        row.map(Invoice::try_from).transpose()
    }

    async fn attach_checkout(
        &self,
        id: &InvoiceId,
        correlation: &PaymentCorrelation,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE invoices SET merchant_request_id = $2, checkout_request_id = $3 WHERE id = $1",
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
                ErrorCode::InvoiceNotFound,
                format!("Invoice not found: {}", id),
            ));
        }
        Ok(())
    }

    async fn mark_paid(&self, id: &InvoiceId, receipt: &PaymentReceipt) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET status = 'paid', mpesa_receipt_number = $2, paid_at = $3
            WHERE id = $1 AND status = ANY($4)
            "#,
        )
        .bind(id.as_uuid())
        .bind(&receipt.receipt_number)
        .bind(receipt.paid_at)
        .bind(payable_statuses())
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to mark invoice paid"))?;

        Ok(result.rows_affected() == 1)
    }
}
