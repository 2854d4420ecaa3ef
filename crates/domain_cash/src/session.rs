//! Cash session aggregate and close-out arithmetic

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{Currency, Money, RegisterId, SessionId, UserId};

use crate::error::CashError;
use crate::movement::{CashMovement, MovementKind};

/// Session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    /// Accepting movements
    Open,
    /// Closed out; terminal
    Closed,
}

impl SessionStatus {
    /// Wire/storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Open => "OPEN",
            SessionStatus::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(SessionStatus::Open),
            "CLOSED" => Ok(SessionStatus::Closed),
            other => Err(format!("unknown session status: {other}")),
        }
    }
}

/// One open/close cycle of a register
///
/// Created at open; mutated exactly once at close (the close-out fields are
/// set together with the CLOSED status and never change again).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashSession {
    /// Unique identifier
    pub id: SessionId,
    /// Owning register
    pub register_id: RegisterId,
    /// Status
    pub status: SessionStatus,
    /// Cashier who opened the session
    pub opened_by: UserId,
    /// Cashier who closed the session
    pub closed_by: Option<UserId>,
    /// Opened timestamp
    pub opened_at: DateTime<Utc>,
    /// Closed timestamp
    pub closed_at: Option<DateTime<Utc>>,
    /// Float counted into the till at open
    pub opening_balance: Money,
    /// Computed balance at close
    pub expected_balance: Option<Money>,
    /// Physically counted balance at close
    pub actual_balance: Option<Money>,
    /// actual - expected
    pub variance: Option<Money>,
    /// Notes captured at open
    pub opening_notes: Option<String>,
    /// Notes captured at close
    pub closing_notes: Option<String>,
}

impl CashSession {
    /// Opens a new session on a register
    pub fn open(
        register_id: RegisterId,
        opening_balance: Money,
        opened_by: UserId,
        opening_notes: Option<String>,
    ) -> Self {
        Self {
            id: SessionId::new_v7(),
            register_id,
            status: SessionStatus::Open,
            opened_by,
            closed_by: None,
            opened_at: Utc::now(),
            closed_at: None,
            opening_balance,
            expected_balance: None,
            actual_balance: None,
            variance: None,
            opening_notes,
            closing_notes: None,
        }
    }

    /// Currency the session operates in
    pub fn currency(&self) -> Currency {
        self.opening_balance.currency()
    }

    /// True while the session accepts movements
    pub fn is_open(&self) -> bool {
        self.status == SessionStatus::Open
    }

    /// Closes the session against a computed summary and the counted cash
    ///
    /// Sets the close-out fields and the terminal CLOSED status in one step.
    pub fn close(
        &mut self,
        summary: &SessionSummary,
        actual_balance: Money,
        closed_by: UserId,
        closing_notes: Option<String>,
    ) -> Result<(), CashError> {
        if !self.is_open() {
            return Err(CashError::SessionClosed(self.id));
        }
        self.expected_balance = Some(summary.expected);
        self.actual_balance = Some(actual_balance);
        self.variance = Some(actual_balance - summary.expected);
        self.closed_by = Some(closed_by);
        self.closed_at = Some(Utc::now());
        self.closing_notes = closing_notes;
        self.status = SessionStatus::Closed;
        Ok(())
    }
}

/// Per-kind totals and the expected balance for one session
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SessionSummary {
    pub sales: Money,
    pub expenses: Money,
    pub deposits: Money,
    pub withdrawals: Money,
    pub expected: Money,
}

/// Computes the close-out summary for a session from its own movements
///
/// Pure function, no I/O. All movements of a session share its currency
/// (enforced when recording).
///
/// Sign convention, till-relative: withdrawals bring cash into the till and
/// deposits send cash out of it, so
/// `expected = opening + sales + withdrawals - expenses - deposits`.
/// OPENING and CLOSING entries are audit rows; the opening balance enters
/// through the session record, not through its movement.
pub fn summarize(session: &CashSession, movements: &[CashMovement]) -> SessionSummary {
    let currency = session.currency();
    let mut sales = Money::zero(currency);
    let mut expenses = Money::zero(currency);
    let mut deposits = Money::zero(currency);
    let mut withdrawals = Money::zero(currency);

    for movement in movements {
        match movement.kind {
            MovementKind::Sale => sales = sales + movement.amount,
            MovementKind::Expense => expenses = expenses + movement.amount,
            MovementKind::Deposit => deposits = deposits + movement.amount,
            MovementKind::Withdrawal => withdrawals = withdrawals + movement.amount,
            MovementKind::Opening | MovementKind::Closing => {}
        }
    }

    let expected = session.opening_balance + sales + withdrawals - expenses - deposits;

    SessionSummary {
        sales,
        expenses,
        deposits,
        withdrawals,
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn money(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount, Currency::DOP)
    }

    fn open_session(opening: rust_decimal::Decimal) -> CashSession {
        CashSession::open(RegisterId::new(), money(opening), UserId::new(), None)
    }

    fn movement(session: &CashSession, kind: MovementKind, amount: rust_decimal::Decimal) -> CashMovement {
        CashMovement::new(session.id, kind, money(amount), "test", session.opened_by)
    }

    #[test]
    fn test_summarize_empty_session() {
        let session = open_session(dec!(100));
        let summary = summarize(&session, &[]);

        assert_eq!(summary.expected, money(dec!(100)));
        assert!(summary.sales.is_zero());
    }

    #[test]
    fn test_summarize_sign_convention() {
        // Withdrawals add to the till, deposits remove from it.
        let session = open_session(dec!(100));
        let movements = vec![
            movement(&session, MovementKind::Sale, dec!(50)),
            movement(&session, MovementKind::Expense, dec!(30)),
            movement(&session, MovementKind::Withdrawal, dec!(20)),
            movement(&session, MovementKind::Deposit, dec!(40)),
        ];

        let summary = summarize(&session, &movements);

        assert_eq!(summary.sales, money(dec!(50)));
        assert_eq!(summary.expenses, money(dec!(30)));
        assert_eq!(summary.withdrawals, money(dec!(20)));
        assert_eq!(summary.deposits, money(dec!(40)));
        // 100 + 50 + 20 - 30 - 40
        assert_eq!(summary.expected, money(dec!(100)));
    }

    #[test]
    fn test_summarize_ignores_opening_and_closing_entries() {
        let session = open_session(dec!(100));
        let movements = vec![
            CashMovement::opening(&session),
            movement(&session, MovementKind::Closing, dec!(100)),
        ];

        let summary = summarize(&session, &movements);
        assert_eq!(summary.expected, money(dec!(100)));
    }

    #[test]
    fn test_close_sets_variance() {
        let mut session = open_session(dec!(100));
        let summary = summarize(&session, &[]);

        session
            .close(&summary, money(dec!(90)), UserId::new(), None)
            .unwrap();

        assert_eq!(session.status, SessionStatus::Closed);
        assert_eq!(session.expected_balance, Some(money(dec!(100))));
        assert_eq!(session.actual_balance, Some(money(dec!(90))));
        assert_eq!(session.variance, Some(money(dec!(-10))));
        assert!(session.closed_at.is_some());
    }

    #[test]
    fn test_close_is_terminal() {
        let mut session = open_session(dec!(100));
        let summary = summarize(&session, &[]);

        session
            .close(&summary, money(dec!(100)), UserId::new(), None)
            .unwrap();
        let again = session.close(&summary, money(dec!(100)), UserId::new(), None);

        assert!(matches!(again, Err(CashError::SessionClosed(_))));
    }

    #[test]
    fn test_status_round_trip() {
        for status in [SessionStatus::Open, SessionStatus::Closed] {
            let parsed: SessionStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }
}
