//! Invoice aggregate

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{ClientId, Currency, InvoiceId, Money};

/// Invoice status
///
/// PAID and PARTIAL are pure functions of the paid amount (see
/// [`derive_status`]); OVERDUE is flagged explicitly by the dunning pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    /// Issued, nothing paid yet
    Pending,
    /// Partially paid
    Partial,
    /// Fully paid; terminal for payment application
    Paid,
    /// Past due date with an open balance
    Overdue,
}

impl InvoiceStatus {
    /// Wire/storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "PENDING",
            InvoiceStatus::Partial => "PARTIAL",
            InvoiceStatus::Paid => "PAID",
            InvoiceStatus::Overdue => "OVERDUE",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(InvoiceStatus::Pending),
            "PARTIAL" => Ok(InvoiceStatus::Partial),
            "PAID" => Ok(InvoiceStatus::Paid),
            "OVERDUE" => Ok(InvoiceStatus::Overdue),
            other => Err(format!("unknown invoice status: {other}")),
        }
    }
}

/// Derives the status after a payment
///
/// PAID requires the balance to be exactly zero - amounts are fixed-point
/// decimals, so no epsilon tolerance is involved. When nothing has been paid
/// the current status is kept (a fresh invoice stays PENDING, a flagged one
/// stays OVERDUE).
pub fn derive_status(total: Money, paid: Money, current: InvoiceStatus) -> InvoiceStatus {
    let balance = total - paid;
    if balance.is_zero() {
        InvoiceStatus::Paid
    } else if paid.is_positive() {
        InvoiceStatus::Partial
    } else {
        current
    }
}

/// A billable document derived from a sale
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique identifier
    pub id: InvoiceId,
    /// Sequential human-readable number, unique
    pub number: String,
    /// Billed client
    pub client_id: ClientId,
    /// Invoice total
    pub total: Money,
    /// Sum of applied payments
    pub paid_amount: Money,
    /// total - paid_amount, never negative
    pub balance: Money,
    /// Status
    pub status: InvoiceStatus,
    /// Payment due date
    pub due_date: NaiveDate,
    /// Issued timestamp
    pub issued_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Issues a new invoice with nothing paid
    pub fn issue(
        number: impl Into<String>,
        client_id: ClientId,
        total: Money,
        due_date: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: InvoiceId::new_v7(),
            number: number.into(),
            client_id,
            total,
            paid_amount: Money::zero(total.currency()),
            balance: total,
            status: InvoiceStatus::Pending,
            due_date,
            issued_at: now,
            updated_at: now,
        }
    }

    /// Currency the invoice is billed in
    pub fn currency(&self) -> Currency {
        self.total.currency()
    }

    /// Applies a payment amount, recomputing paid/balance/status together
    ///
    /// Validation (positive amount, no overpayment, matching currency) is the
    /// service's responsibility; this method only keeps the arithmetic
    /// invariant `balance == total - paid_amount` intact.
    pub fn apply_payment(&mut self, amount: Money) {
        self.paid_amount = self.paid_amount + amount;
        self.balance = self.total - self.paid_amount;
        self.status = derive_status(self.total, self.paid_amount, self.status);
        self.updated_at = Utc::now();
    }

    /// True when the due date has passed and a balance remains open
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        today > self.due_date
            && !matches!(self.status, InvoiceStatus::Paid)
            && self.balance.is_positive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn dop(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount, Currency::DOP)
    }

    fn invoice(total: rust_decimal::Decimal) -> Invoice {
        Invoice::issue(
            "FAC-00000001",
            ClientId::new(),
            dop(total),
            NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
        )
    }

    #[test]
    fn test_issue_starts_pending_with_full_balance() {
        let inv = invoice(dec!(500));
        assert_eq!(inv.status, InvoiceStatus::Pending);
        assert_eq!(inv.paid_amount, dop(dec!(0)));
        assert_eq!(inv.balance, dop(dec!(500)));
    }

    #[test]
    fn test_apply_payment_keeps_balance_invariant() {
        let mut inv = invoice(dec!(500));
        inv.apply_payment(dop(dec!(200)));

        assert_eq!(inv.paid_amount, dop(dec!(200)));
        assert_eq!(inv.balance, dop(dec!(300)));
        assert_eq!(inv.balance, inv.total - inv.paid_amount);
        assert_eq!(inv.status, InvoiceStatus::Partial);
    }

    #[test]
    fn test_paid_requires_exact_zero_balance() {
        let mut inv = invoice(dec!(500));
        inv.apply_payment(dop(dec!(499.99)));
        assert_eq!(inv.status, InvoiceStatus::Partial);

        inv.apply_payment(dop(dec!(0.01)));
        assert_eq!(inv.status, InvoiceStatus::Paid);
        assert!(inv.balance.is_zero());
    }

    #[test]
    fn test_derive_status_keeps_current_when_nothing_paid() {
        let total = dop(dec!(100));
        let none = dop(dec!(0));
        assert_eq!(
            derive_status(total, none, InvoiceStatus::Overdue),
            InvoiceStatus::Overdue
        );
        assert_eq!(
            derive_status(total, none, InvoiceStatus::Pending),
            InvoiceStatus::Pending
        );
    }

    #[test]
    fn test_is_overdue() {
        let inv = invoice(dec!(500));
        let before = NaiveDate::from_ymd_opt(2026, 8, 31).unwrap();
        let due = inv.due_date;
        let after = NaiveDate::from_ymd_opt(2026, 9, 2).unwrap();

        assert!(!inv.is_overdue(before));
        assert!(!inv.is_overdue(due));
        assert!(inv.is_overdue(after));

        let mut paid = invoice(dec!(500));
        paid.apply_payment(dop(dec!(500)));
        assert!(!paid.is_overdue(after));
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            InvoiceStatus::Pending,
            InvoiceStatus::Partial,
            InvoiceStatus::Paid,
            InvoiceStatus::Overdue,
        ] {
            let parsed: InvoiceStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }
}
