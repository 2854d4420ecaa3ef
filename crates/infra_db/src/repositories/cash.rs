//! Cash store over PostgreSQL

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use core_kernel::{DomainPort, PortError, RegisterId, SessionId};
use domain_cash::{CashMovement, CashRegister, CashSession, CashStore};

use super::{db_err, money_from_row, parse_stored};

/// PostgreSQL implementation of [`CashStore`]
#[derive(Debug, Clone)]
pub struct PgCashStore {
    pool: PgPool,
}

impl PgCashStore {
    /// Creates a new store over the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RegisterRow {
    id: Uuid,
    name: String,
    currency: String,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl RegisterRow {
    fn into_domain(self) -> Result<CashRegister, PortError> {
        Ok(CashRegister {
            id: RegisterId::from(self.id),
            name: self.name,
            currency: parse_stored(&self.currency, "currency")?,
            is_active: self.is_active,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    id: Uuid,
    register_id: Uuid,
    status: String,
    opened_by: Uuid,
    closed_by: Option<Uuid>,
    opened_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
    currency: String,
    opening_balance: Decimal,
    expected_balance: Option<Decimal>,
    actual_balance: Option<Decimal>,
    variance: Option<Decimal>,
    opening_notes: Option<String>,
    closing_notes: Option<String>,
}

impl SessionRow {
    fn into_domain(self) -> Result<CashSession, PortError> {
        let money = |amount: Decimal| money_from_row(amount, &self.currency);
        Ok(CashSession {
            id: SessionId::from(self.id),
            register_id: RegisterId::from(self.register_id),
            status: parse_stored(&self.status, "session status")?,
            opened_by: self.opened_by.into(),
            closed_by: self.closed_by.map(Into::into),
            opened_at: self.opened_at,
            closed_at: self.closed_at,
            opening_balance: money(self.opening_balance)?,
            expected_balance: self.expected_balance.map(&money).transpose()?,
            actual_balance: self.actual_balance.map(&money).transpose()?,
            variance: self.variance.map(&money).transpose()?,
            opening_notes: self.opening_notes,
            closing_notes: self.closing_notes,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MovementRow {
    id: Uuid,
    session_id: Uuid,
    kind: String,
    amount: Decimal,
    currency: String,
    description: String,
    notes: Option<String>,
    performed_by: Uuid,
    sale_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl MovementRow {
    fn into_domain(self) -> Result<CashMovement, PortError> {
        Ok(CashMovement {
            id: self.id.into(),
            session_id: SessionId::from(self.session_id),
            kind: parse_stored(&self.kind, "movement kind")?,
            amount: money_from_row(self.amount, &self.currency)?,
            description: self.description,
            notes: self.notes,
            performed_by: self.performed_by.into(),
            sale_id: self.sale_id.map(Into::into),
            created_at: self.created_at,
        })
    }
}

const SESSION_COLUMNS: &str = "id, register_id, status, opened_by, closed_by, opened_at, \
     closed_at, currency, opening_balance, expected_balance, actual_balance, variance, \
     opening_notes, closing_notes";

async fn insert_movement<'e, E>(executor: E, movement: &CashMovement) -> Result<(), sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO cash_movements (
            id, session_id, kind, amount, currency, description, notes,
            performed_by, sale_id, created_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(Uuid::from(movement.id))
    .bind(Uuid::from(movement.session_id))
    .bind(movement.kind.as_str())
    .bind(movement.amount.amount())
    .bind(movement.amount.currency().code())
    .bind(&movement.description)
    .bind(&movement.notes)
    .bind(Uuid::from(movement.performed_by))
    .bind(movement.sale_id.map(Uuid::from))
    .bind(movement.created_at)
    .execute(executor)
    .await?;
    Ok(())
}

impl DomainPort for PgCashStore {}

#[async_trait]
impl CashStore for PgCashStore {
    async fn find_register(&self, id: RegisterId) -> Result<Option<CashRegister>, PortError> {
        let row = sqlx::query_as::<_, RegisterRow>(
            "SELECT id, name, currency, is_active, created_at FROM cash_registers WHERE id = $1",
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(RegisterRow::into_domain).transpose()
    }

    async fn insert_register(&self, register: &CashRegister) -> Result<(), PortError> {
        sqlx::query(
            r#"
            INSERT INTO cash_registers (id, name, currency, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::from(register.id))
        .bind(&register.name)
        .bind(register.currency.code())
        .bind(register.is_active)
        .bind(register.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn find_session(&self, id: SessionId) -> Result<Option<CashSession>, PortError> {
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM cash_sessions WHERE id = $1"
        ))
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(SessionRow::into_domain).transpose()
    }

    async fn find_open_session(
        &self,
        register_id: RegisterId,
    ) -> Result<Option<CashSession>, PortError> {
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM cash_sessions WHERE register_id = $1 AND status = 'OPEN'"
        ))
        .bind(Uuid::from(register_id))
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(SessionRow::into_domain).transpose()
    }

    async fn sessions_for_register(
        &self,
        register_id: RegisterId,
    ) -> Result<Vec<CashSession>, PortError> {
        let rows = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM cash_sessions WHERE register_id = $1 ORDER BY opened_at DESC"
        ))
        .bind(Uuid::from(register_id))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(SessionRow::into_domain).collect()
    }

    async fn movements_for_session(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<CashMovement>, PortError> {
        let rows = sqlx::query_as::<_, MovementRow>(
            r#"
            SELECT id, session_id, kind, amount, currency, description, notes,
                   performed_by, sale_id, created_at
            FROM cash_movements
            WHERE session_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(Uuid::from(session_id))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(MovementRow::into_domain).collect()
    }

    async fn insert_session(
        &self,
        session: &CashSession,
        opening: &CashMovement,
    ) -> Result<(), PortError> {
        debug!(session_id = %session.id, register_id = %session.register_id, "inserting cash session");

        let mut tx = self.pool.begin().await.map_err(db_err)?;

        // The partial unique index on (register_id) WHERE status = 'OPEN'
        // rejects a concurrent second open as 23505.
        sqlx::query(
            r#"
            INSERT INTO cash_sessions (
                id, register_id, status, opened_by, closed_by, opened_at, closed_at,
                currency, opening_balance, expected_balance, actual_balance, variance,
                opening_notes, closing_notes
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(Uuid::from(session.id))
        .bind(Uuid::from(session.register_id))
        .bind(session.status.as_str())
        .bind(Uuid::from(session.opened_by))
        .bind(session.closed_by.map(Uuid::from))
        .bind(session.opened_at)
        .bind(session.closed_at)
        .bind(session.currency().code())
        .bind(session.opening_balance.amount())
        .bind(session.expected_balance.map(|m| m.amount()))
        .bind(session.actual_balance.map(|m| m.amount()))
        .bind(session.variance.map(|m| m.amount()))
        .bind(&session.opening_notes)
        .bind(&session.closing_notes)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        insert_movement(&mut *tx, opening).await.map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn append_movement(&self, movement: &CashMovement) -> Result<(), PortError> {
        insert_movement(&self.pool, movement).await.map_err(db_err)
    }

    async fn store_closed_session(
        &self,
        session: &CashSession,
        closing: &CashMovement,
    ) -> Result<(), PortError> {
        debug!(session_id = %session.id, "closing cash session");

        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let result = sqlx::query(
            r#"
            UPDATE cash_sessions SET
                status = $2,
                closed_by = $3,
                closed_at = $4,
                expected_balance = $5,
                actual_balance = $6,
                variance = $7,
                closing_notes = $8
            WHERE id = $1 AND status = 'OPEN'
            "#,
        )
        .bind(Uuid::from(session.id))
        .bind(session.status.as_str())
        .bind(session.closed_by.map(Uuid::from))
        .bind(session.closed_at)
        .bind(session.expected_balance.map(|m| m.amount()))
        .bind(session.actual_balance.map(|m| m.amount()))
        .bind(session.variance.map(|m| m.amount()))
        .bind(&session.closing_notes)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(PortError::conflict(format!(
                "session {} is not open",
                session.id
            )));
        }

        insert_movement(&mut *tx, closing).await.map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }
}
