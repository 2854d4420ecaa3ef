//! Receivables domain errors

use thiserror::Error;

use core_kernel::{Currency, ErrorKind, InvoiceId, Money, PortError};

/// Errors that can occur in the receivables domain
#[derive(Debug, Error)]
pub enum ReceivableError {
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(InvoiceId),

    #[error("Invoice {0} is already fully paid")]
    InvoiceAlreadyPaid(InvoiceId),

    #[error("Invoice {0} is already flagged overdue")]
    AlreadyOverdue(InvoiceId),

    #[error("Invoice {id} is not past due (due {due_date})")]
    NotPastDue {
        id: InvoiceId,
        due_date: chrono::NaiveDate,
    },

    #[error("Payment amount must be positive, got {amount}")]
    NonPositiveAmount { amount: Money },

    #[error("Payment of {amount} exceeds the open balance of {balance}")]
    Overpayment { amount: Money, balance: Money },

    #[error("Currency {given} does not match the invoice currency {expected}")]
    CurrencyMismatch { given: Currency, expected: Currency },

    #[error(transparent)]
    Storage(#[from] PortError),
}

impl ReceivableError {
    /// Classifies this error into the common taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReceivableError::InvoiceNotFound(_) => ErrorKind::NotFound,
            ReceivableError::InvoiceAlreadyPaid(_) | ReceivableError::AlreadyOverdue(_) => {
                ErrorKind::InvalidState
            }
            ReceivableError::NotPastDue { .. }
            | ReceivableError::NonPositiveAmount { .. }
            | ReceivableError::Overpayment { .. }
            | ReceivableError::CurrencyMismatch { .. } => ErrorKind::Validation,
            ReceivableError::Storage(e) => e.kind(),
        }
    }
}
