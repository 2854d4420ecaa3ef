//! Payment records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{InvoiceId, Money, PaymentId};

/// Payment method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Cash
    Cash,
    /// Credit/debit card
    Card,
    /// Bank transfer
    Transfer,
    /// Check
    Check,
    /// Store credit (credit note)
    Credit,
}

impl PaymentMethod {
    /// Wire/storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::Card => "CARD",
            PaymentMethod::Transfer => "TRANSFER",
            PaymentMethod::Check => "CHECK",
            PaymentMethod::Credit => "CREDIT",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CASH" => Ok(PaymentMethod::Cash),
            "CARD" => Ok(PaymentMethod::Card),
            "TRANSFER" => Ok(PaymentMethod::Transfer),
            "CHECK" => Ok(PaymentMethod::Check),
            "CREDIT" => Ok(PaymentMethod::Credit),
            other => Err(format!("unknown payment method: {other}")),
        }
    }
}

/// A payment applied to an invoice
///
/// Immutable once created; the sum of an invoice's payments equals its
/// paid amount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    /// Unique identifier
    pub id: PaymentId,
    /// Invoice being paid
    pub invoice_id: InvoiceId,
    /// Payment amount (positive)
    pub amount: Money,
    /// Payment method
    pub method: PaymentMethod,
    /// Payment date
    pub payment_date: DateTime<Utc>,
    /// External reference (bank ref, card voucher)
    pub reference: Option<String>,
    /// Notes
    pub notes: Option<String>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Creates a new payment dated now
    pub fn new(invoice_id: InvoiceId, amount: Money, method: PaymentMethod) -> Self {
        let now = Utc::now();
        Self {
            id: PaymentId::new_v7(),
            invoice_id,
            amount,
            method,
            payment_date: now,
            reference: None,
            notes: None,
            created_at: now,
        }
    }

    /// Sets the external reference
    pub fn with_reference(mut self, reference: Option<String>) -> Self {
        self.reference = reference;
        self
    }

    /// Sets the notes
    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }
}
