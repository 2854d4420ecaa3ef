//! Return store over PostgreSQL

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use core_kernel::{DomainPort, PortError, ProductId, ReturnId, SaleId};
use domain_returns::{
    ReturnItem, ReturnOrder, ReturnStore, SaleLine, SaleRecord, StockAdjustment,
};

use super::{db_err, money_from_row, parse_stored};

/// PostgreSQL implementation of [`ReturnStore`]
#[derive(Debug, Clone)]
pub struct PgReturnStore {
    pool: PgPool,
}

impl PgReturnStore {
    /// Creates a new store over the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn items_for_return(&self, return_id: Uuid) -> Result<Vec<ReturnItem>, PortError> {
        let rows = sqlx::query_as::<_, ReturnItemRow>(
            r#"
            SELECT ri.product_id, ri.quantity, ri.unit_price, r.currency, ri.total,
                   ri.restock_quantity
            FROM return_items ri
            JOIN returns r ON r.id = ri.return_id
            WHERE ri.return_id = $1
            "#,
        )
        .bind(return_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(ReturnItemRow::into_domain).collect()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: Uuid,
    sold_at: DateTime<Utc>,
    is_active: bool,
    is_cancelled: bool,
    has_returns: bool,
}

#[derive(Debug, sqlx::FromRow)]
struct SaleLineRow {
    product_id: Uuid,
    product_name: String,
    quantity: i32,
    unit_price: Decimal,
    currency: String,
    is_returnable: bool,
    return_deadline_days: Option<i32>,
}

impl SaleLineRow {
    fn into_domain(self) -> Result<SaleLine, PortError> {
        Ok(SaleLine {
            product_id: ProductId::from(self.product_id),
            product_name: self.product_name,
            quantity: self.quantity as u32,
            unit_price: money_from_row(self.unit_price, &self.currency)?,
            is_returnable: self.is_returnable,
            return_deadline_days: self.return_deadline_days.map(|d| d as u32),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ReturnRow {
    id: Uuid,
    original_sale_id: Uuid,
    credit_note_number: String,
    return_type: String,
    reason: String,
    product_condition: String,
    currency: String,
    refund_amount: Decimal,
    refund_method: String,
    status: String,
    approved_by: Option<Uuid>,
    approved_at: Option<DateTime<Utc>>,
    notes: Option<String>,
    requested_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ReturnRow {
    fn into_domain(self, items: Vec<ReturnItem>) -> Result<ReturnOrder, PortError> {
        Ok(ReturnOrder {
            id: ReturnId::from(self.id),
            original_sale_id: SaleId::from(self.original_sale_id),
            credit_note_number: self.credit_note_number,
            return_type: parse_stored(&self.return_type, "return type")?,
            reason: self.reason,
            product_condition: parse_stored(&self.product_condition, "product condition")?,
            refund_amount: money_from_row(self.refund_amount, &self.currency)?,
            refund_method: parse_stored(&self.refund_method, "refund method")?,
            status: parse_stored(&self.status, "return status")?,
            approved_by: self.approved_by.map(Into::into),
            approved_at: self.approved_at,
            notes: self.notes,
            requested_by: self.requested_by.into(),
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ReturnItemRow {
    product_id: Uuid,
    quantity: i32,
    unit_price: Decimal,
    currency: String,
    total: Decimal,
    restock_quantity: i32,
}

impl ReturnItemRow {
    fn into_domain(self) -> Result<ReturnItem, PortError> {
        Ok(ReturnItem {
            product_id: ProductId::from(self.product_id),
            quantity: self.quantity as u32,
            unit_price: money_from_row(self.unit_price, &self.currency)?,
            total: money_from_row(self.total, &self.currency)?,
            restock_quantity: self.restock_quantity as u32,
        })
    }
}

const RETURN_COLUMNS: &str = "id, original_sale_id, credit_note_number, return_type, reason, \
     product_condition, currency, refund_amount, refund_method, status, approved_by, \
     approved_at, notes, requested_by, created_at, updated_at";

async fn update_return_row<'e, E>(executor: E, order: &ReturnOrder) -> Result<u64, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE returns SET
            status = $2,
            approved_by = $3,
            approved_at = $4,
            notes = $5,
            updated_at = $6
        WHERE id = $1
        "#,
    )
    .bind(Uuid::from(order.id))
    .bind(order.status.as_str())
    .bind(order.approved_by.map(Uuid::from))
    .bind(order.approved_at)
    .bind(&order.notes)
    .bind(order.updated_at)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

impl DomainPort for PgReturnStore {}

#[async_trait]
impl ReturnStore for PgReturnStore {
    async fn find_sale(&self, id: SaleId) -> Result<Option<SaleRecord>, PortError> {
        let sale = sqlx::query_as::<_, SaleRow>(
            "SELECT id, sold_at, is_active, is_cancelled, has_returns FROM sales WHERE id = $1",
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        let sale = match sale {
            Some(sale) => sale,
            None => return Ok(None),
        };

        let lines = sqlx::query_as::<_, SaleLineRow>(
            r#"
            SELECT product_id, product_name, quantity, unit_price, currency,
                   is_returnable, return_deadline_days
            FROM sale_lines
            WHERE sale_id = $1
            "#,
        )
        .bind(Uuid::from(id))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?
        .into_iter()
        .map(SaleLineRow::into_domain)
        .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(SaleRecord {
            id: SaleId::from(sale.id),
            sold_at: sale.sold_at,
            is_active: sale.is_active,
            is_cancelled: sale.is_cancelled,
            has_returns: sale.has_returns,
            lines,
        }))
    }

    async fn insert_sale(&self, sale: &SaleRecord) -> Result<(), PortError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query(
            r#"
            INSERT INTO sales (id, sold_at, is_active, is_cancelled, has_returns)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::from(sale.id))
        .bind(sale.sold_at)
        .bind(sale.is_active)
        .bind(sale.is_cancelled)
        .bind(sale.has_returns)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        for line in &sale.lines {
            sqlx::query(
                r#"
                INSERT INTO sale_lines (
                    sale_id, product_id, product_name, quantity, unit_price,
                    currency, is_returnable, return_deadline_days
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(Uuid::from(sale.id))
            .bind(Uuid::from(line.product_id))
            .bind(&line.product_name)
            .bind(line.quantity as i32)
            .bind(line.unit_price.amount())
            .bind(line.unit_price.currency().code())
            .bind(line.is_returnable)
            .bind(line.return_deadline_days.map(|d| d as i32))
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn find_return(&self, id: ReturnId) -> Result<Option<ReturnOrder>, PortError> {
        let row = sqlx::query_as::<_, ReturnRow>(&format!(
            "SELECT {RETURN_COLUMNS} FROM returns WHERE id = $1"
        ))
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        match row {
            Some(row) => {
                let items = self.items_for_return(row.id).await?;
                Ok(Some(row.into_domain(items)?))
            }
            None => Ok(None),
        }
    }

    async fn returns_for_sale(&self, sale_id: SaleId) -> Result<Vec<ReturnOrder>, PortError> {
        let rows = sqlx::query_as::<_, ReturnRow>(&format!(
            "SELECT {RETURN_COLUMNS} FROM returns WHERE original_sale_id = $1 ORDER BY created_at"
        ))
        .bind(Uuid::from(sale_id))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.items_for_return(row.id).await?;
            orders.push(row.into_domain(items)?);
        }
        Ok(orders)
    }

    async fn latest_credit_note_number(&self) -> Result<Option<String>, PortError> {
        sqlx::query_scalar::<_, String>(
            "SELECT credit_note_number FROM returns ORDER BY created_at DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)
    }

    async fn insert_return(&self, order: &ReturnOrder) -> Result<(), PortError> {
        debug!(
            return_id = %order.id,
            credit_note = %order.credit_note_number,
            "inserting return"
        );

        let mut tx = self.pool.begin().await.map_err(db_err)?;

        // The unique constraint on credit_note_number rejects a concurrent
        // creator's duplicate as 23505.
        sqlx::query(
            r#"
            INSERT INTO returns (
                id, original_sale_id, credit_note_number, return_type, reason,
                product_condition, currency, refund_amount, refund_method, status,
                approved_by, approved_at, notes, requested_by, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(Uuid::from(order.id))
        .bind(Uuid::from(order.original_sale_id))
        .bind(&order.credit_note_number)
        .bind(order.return_type.as_str())
        .bind(&order.reason)
        .bind(order.product_condition.as_str())
        .bind(order.refund_amount.currency().code())
        .bind(order.refund_amount.amount())
        .bind(order.refund_method.as_str())
        .bind(order.status.as_str())
        .bind(order.approved_by.map(Uuid::from))
        .bind(order.approved_at)
        .bind(&order.notes)
        .bind(Uuid::from(order.requested_by))
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        for item in &order.items {
            sqlx::query(
                r#"
                INSERT INTO return_items (
                    return_id, product_id, quantity, unit_price, total, restock_quantity
                ) VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(Uuid::from(order.id))
            .bind(Uuid::from(item.product_id))
            .bind(item.quantity as i32)
            .bind(item.unit_price.amount())
            .bind(item.total.amount())
            .bind(item.restock_quantity as i32)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        let result = sqlx::query("UPDATE sales SET has_returns = TRUE WHERE id = $1")
            .bind(Uuid::from(order.original_sale_id))
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(PortError::not_found("Sale", order.original_sale_id));
        }

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn update_return(&self, order: &ReturnOrder) -> Result<(), PortError> {
        let affected = update_return_row(&self.pool, order).await.map_err(db_err)?;
        if affected == 0 {
            return Err(PortError::not_found("Return", order.id));
        }
        Ok(())
    }

    async fn complete_return(
        &self,
        order: &ReturnOrder,
        adjustments: &[StockAdjustment],
    ) -> Result<(), PortError> {
        debug!(
            return_id = %order.id,
            adjustments = adjustments.len(),
            "processing return"
        );

        let mut tx = self.pool.begin().await.map_err(db_err)?;

        for adjustment in adjustments {
            // The stock >= 0 check rejects a negative result as 23514,
            // rolling back the whole unit.
            let result = sqlx::query("UPDATE products SET stock = stock + $2 WHERE id = $1")
                .bind(Uuid::from(adjustment.product_id))
                .bind(adjustment.delta)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
            if result.rows_affected() == 0 {
                return Err(PortError::not_found("Product", adjustment.product_id));
            }
        }

        let affected = update_return_row(&mut *tx, order).await.map_err(db_err)?;
        if affected == 0 {
            return Err(PortError::not_found("Return", order.id));
        }

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn product_stock(&self, id: ProductId) -> Result<Option<i64>, PortError> {
        sqlx::query_scalar::<_, i64>("SELECT stock FROM products WHERE id = $1")
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn set_product_stock(&self, id: ProductId, stock: i64) -> Result<(), PortError> {
        sqlx::query(
            r#"
            INSERT INTO products (id, stock) VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET stock = EXCLUDED.stock
            "#,
        )
        .bind(Uuid::from(id))
        .bind(stock)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }
}
