//! Cash movements - the append-only till ledger

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{Money, MovementId, SaleId, SessionId, UserId};

use crate::session::CashSession;

/// Kind of cash movement
///
/// The kind alone determines how a movement affects the expected till
/// balance; amounts are always stored non-negative. The direction names are
/// till-relative: a `Withdrawal` is cash withdrawn from elsewhere INTO the
/// till, a `Deposit` is cash taken out of the till and deposited elsewhere
/// (e.g. the bank). The UI encodes the same convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementKind {
    /// Cash received for a completed sale (created only by the sale flow)
    Sale,
    /// Cash paid out of the till for an expense
    Expense,
    /// Cash removed from the till and sent elsewhere
    Deposit,
    /// Cash brought into the till from elsewhere
    Withdrawal,
    /// Audit entry carrying the opening balance
    Opening,
    /// Audit entry carrying the counted balance at close
    Closing,
}

impl MovementKind {
    /// True for the kinds a cashier may record directly
    ///
    /// SALE entries stay strictly 1:1 with completed sales and OPENING/CLOSING
    /// entries belong to the session lifecycle, so none of those three can be
    /// appended through the manual entry point.
    pub fn is_manual(&self) -> bool {
        matches!(
            self,
            MovementKind::Expense | MovementKind::Deposit | MovementKind::Withdrawal
        )
    }

    /// Wire/storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Sale => "SALE",
            MovementKind::Expense => "EXPENSE",
            MovementKind::Deposit => "DEPOSIT",
            MovementKind::Withdrawal => "WITHDRAWAL",
            MovementKind::Opening => "OPENING",
            MovementKind::Closing => "CLOSING",
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MovementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SALE" => Ok(MovementKind::Sale),
            "EXPENSE" => Ok(MovementKind::Expense),
            "DEPOSIT" => Ok(MovementKind::Deposit),
            "WITHDRAWAL" => Ok(MovementKind::Withdrawal),
            "OPENING" => Ok(MovementKind::Opening),
            "CLOSING" => Ok(MovementKind::Closing),
            other => Err(format!("unknown movement kind: {other}")),
        }
    }
}

/// A single cash-affecting event within a session
///
/// Movements are immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashMovement {
    /// Unique identifier
    pub id: MovementId,
    /// Owning session
    pub session_id: SessionId,
    /// Movement kind (determines the till effect)
    pub kind: MovementKind,
    /// Non-negative amount in the session currency
    pub amount: Money,
    /// Human-readable description
    pub description: String,
    /// Optional free-form notes
    pub notes: Option<String>,
    /// Cashier/user who performed the movement
    pub performed_by: UserId,
    /// Back-reference to the sale for SALE movements
    pub sale_id: Option<SaleId>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl CashMovement {
    /// Creates a new movement
    pub fn new(
        session_id: SessionId,
        kind: MovementKind,
        amount: Money,
        description: impl Into<String>,
        performed_by: UserId,
    ) -> Self {
        Self {
            id: MovementId::new_v7(),
            session_id,
            kind,
            amount,
            description: description.into(),
            notes: None,
            performed_by,
            sale_id: None,
            created_at: Utc::now(),
        }
    }

    /// Sets the notes
    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }

    /// Creates the SALE entry for a completed sale
    pub fn for_sale(
        session_id: SessionId,
        amount: Money,
        sale_id: SaleId,
        performed_by: UserId,
    ) -> Self {
        let mut movement = Self::new(
            session_id,
            MovementKind::Sale,
            amount,
            "Venta",
            performed_by,
        );
        movement.sale_id = Some(sale_id);
        movement
    }

    /// Creates the OPENING audit entry for a freshly opened session
    pub fn opening(session: &CashSession) -> Self {
        Self::new(
            session.id,
            MovementKind::Opening,
            session.opening_balance,
            "Apertura de caja",
            session.opened_by,
        )
    }

    /// Creates the CLOSING audit entry carrying the counted balance
    pub fn closing(session: &CashSession, counted: Money, closed_by: UserId) -> Self {
        Self::new(
            session.id,
            MovementKind::Closing,
            counted,
            "Cierre de caja",
            closed_by,
        )
    }
}
