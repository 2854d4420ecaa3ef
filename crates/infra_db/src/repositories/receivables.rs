//! Receivable store over PostgreSQL

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use core_kernel::{DomainPort, InvoiceId, PortError};
use domain_receivables::{Invoice, Payment, ReceivableStore};

use super::{db_err, money_from_row, parse_stored};

/// PostgreSQL implementation of [`ReceivableStore`]
#[derive(Debug, Clone)]
pub struct PgReceivableStore {
    pool: PgPool,
}

impl PgReceivableStore {
    /// Creates a new store over the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct InvoiceRow {
    id: Uuid,
    number: String,
    client_id: Uuid,
    currency: String,
    total: Decimal,
    paid_amount: Decimal,
    balance: Decimal,
    status: String,
    due_date: NaiveDate,
    issued_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl InvoiceRow {
    fn into_domain(self) -> Result<Invoice, PortError> {
        let money = |amount: Decimal| money_from_row(amount, &self.currency);
        Ok(Invoice {
            id: InvoiceId::from(self.id),
            number: self.number,
            client_id: self.client_id.into(),
            total: money(self.total)?,
            paid_amount: money(self.paid_amount)?,
            balance: money(self.balance)?,
            status: parse_stored(&self.status, "invoice status")?,
            due_date: self.due_date,
            issued_at: self.issued_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    invoice_id: Uuid,
    amount: Decimal,
    currency: String,
    method: String,
    payment_date: DateTime<Utc>,
    reference: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl PaymentRow {
    fn into_domain(self) -> Result<Payment, PortError> {
        Ok(Payment {
            id: self.id.into(),
            invoice_id: InvoiceId::from(self.invoice_id),
            amount: money_from_row(self.amount, &self.currency)?,
            method: parse_stored(&self.method, "payment method")?,
            payment_date: self.payment_date,
            reference: self.reference,
            notes: self.notes,
            created_at: self.created_at,
        })
    }
}

const INVOICE_COLUMNS: &str = "id, number, client_id, currency, total, paid_amount, balance, \
     status, due_date, issued_at, updated_at";

const PAYMENT_COLUMNS: &str =
    "id, invoice_id, amount, currency, method, payment_date, reference, notes, created_at";

async fn update_invoice_row<'e, E>(executor: E, invoice: &Invoice) -> Result<u64, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE invoices SET
            paid_amount = $2,
            balance = $3,
            status = $4,
            updated_at = $5
        WHERE id = $1
        "#,
    )
    .bind(Uuid::from(invoice.id))
    .bind(invoice.paid_amount.amount())
    .bind(invoice.balance.amount())
    .bind(invoice.status.as_str())
    .bind(invoice.updated_at)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

impl DomainPort for PgReceivableStore {}

#[async_trait]
impl ReceivableStore for PgReceivableStore {
    async fn find_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>, PortError> {
        let row = sqlx::query_as::<_, InvoiceRow>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = $1"
        ))
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(InvoiceRow::into_domain).transpose()
    }

    async fn insert_invoice(&self, invoice: &Invoice) -> Result<(), PortError> {
        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, number, client_id, currency, total, paid_amount, balance,
                status, due_date, issued_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(Uuid::from(invoice.id))
        .bind(&invoice.number)
        .bind(Uuid::from(invoice.client_id))
        .bind(invoice.currency().code())
        .bind(invoice.total.amount())
        .bind(invoice.paid_amount.amount())
        .bind(invoice.balance.amount())
        .bind(invoice.status.as_str())
        .bind(invoice.due_date)
        .bind(invoice.issued_at)
        .bind(invoice.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn update_invoice(&self, invoice: &Invoice) -> Result<(), PortError> {
        let affected = update_invoice_row(&self.pool, invoice)
            .await
            .map_err(db_err)?;
        if affected == 0 {
            return Err(PortError::not_found("Invoice", invoice.id));
        }
        Ok(())
    }

    async fn record_payment(
        &self,
        payment: &Payment,
        invoice: &Invoice,
    ) -> Result<(), PortError> {
        debug!(invoice_id = %invoice.id, payment_id = %payment.id, "recording payment");

        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query(
            r#"
            INSERT INTO payments (
                id, invoice_id, amount, currency, method, payment_date,
                reference, notes, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(Uuid::from(payment.id))
        .bind(Uuid::from(payment.invoice_id))
        .bind(payment.amount.amount())
        .bind(payment.amount.currency().code())
        .bind(payment.method.as_str())
        .bind(payment.payment_date)
        .bind(&payment.reference)
        .bind(&payment.notes)
        .bind(payment.created_at)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        let affected = update_invoice_row(&mut *tx, invoice).await.map_err(db_err)?;
        if affected == 0 {
            return Err(PortError::not_found("Invoice", invoice.id));
        }

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn payments_for_invoice(&self, id: InvoiceId) -> Result<Vec<Payment>, PortError> {
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE invoice_id = $1 ORDER BY payment_date DESC"
        ))
        .bind(Uuid::from(id))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(PaymentRow::into_domain).collect()
    }

    async fn all_payments(&self) -> Result<Vec<Payment>, PortError> {
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments ORDER BY payment_date DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(PaymentRow::into_domain).collect()
    }
}
