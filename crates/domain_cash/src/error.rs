//! Cash domain errors

use thiserror::Error;

use core_kernel::{Currency, ErrorKind, Money, PortError, RegisterId, SessionId};

use crate::movement::MovementKind;

/// Errors that can occur in the cash domain
#[derive(Debug, Error)]
pub enum CashError {
    #[error("Cash register not found: {0}")]
    RegisterNotFound(RegisterId),

    #[error("Cash register {0} is inactive")]
    RegisterInactive(RegisterId),

    #[error("Cash session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("Register {0} already has an open session")]
    SessionAlreadyOpen(RegisterId),

    #[error("Session {0} is closed and accepts no further changes")]
    SessionClosed(SessionId),

    #[error("{kind} movements cannot be recorded manually")]
    NotManualMovement { kind: MovementKind },

    #[error("Movement amount must be positive, got {amount}")]
    NonPositiveAmount { amount: Money },

    #[error("Opening balance cannot be negative, got {amount}")]
    NegativeOpeningBalance { amount: Money },

    #[error("Counted balance cannot be negative, got {amount}")]
    NegativeActualBalance { amount: Money },

    #[error("Currency {given} does not match the session currency {expected}")]
    CurrencyMismatch { given: Currency, expected: Currency },

    #[error(transparent)]
    Storage(#[from] PortError),
}

impl CashError {
    /// Classifies this error into the common taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            CashError::RegisterNotFound(_) | CashError::SessionNotFound(_) => ErrorKind::NotFound,
            CashError::SessionClosed(_) => ErrorKind::InvalidState,
            CashError::SessionAlreadyOpen(_) => ErrorKind::Conflict,
            CashError::RegisterInactive(_)
            | CashError::NotManualMovement { .. }
            | CashError::NonPositiveAmount { .. }
            | CashError::NegativeOpeningBalance { .. }
            | CashError::NegativeActualBalance { .. }
            | CashError::CurrencyMismatch { .. } => ErrorKind::Validation,
            CashError::Storage(e) => e.kind(),
        }
    }
}
