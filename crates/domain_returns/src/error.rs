//! Returns domain errors

use thiserror::Error;

use core_kernel::{ErrorKind, Money, PortError, ProductId, ReturnId};

use crate::order::ReturnStatus;

/// Errors that can occur in the returns domain
#[derive(Debug, Error)]
pub enum ReturnError {
    #[error("Return not found: {0}")]
    ReturnNotFound(ReturnId),

    /// The request failed an eligibility rule; the message is end-user facing
    #[error("{0}")]
    Ineligible(String),

    #[error("Return {id} is {from}, cannot move to {to}")]
    InvalidTransition {
        id: ReturnId,
        from: ReturnStatus,
        to: ReturnStatus,
    },

    #[error("A return requires at least one item")]
    EmptyItems,

    #[error("Return quantity for product {product_id} must be positive")]
    NonPositiveQuantity { product_id: ProductId },

    #[error("Restock quantity {restock} exceeds returned quantity {quantity} for product {product_id}")]
    RestockExceedsQuantity {
        product_id: ProductId,
        quantity: u32,
        restock: u32,
    },

    #[error("Refund amount cannot be negative, got {amount}")]
    NegativeRefund { amount: Money },

    #[error("Could not allocate a unique credit-note number")]
    CreditNoteConflict,

    #[error(transparent)]
    Storage(#[from] PortError),
}

impl ReturnError {
    /// Classifies this error into the common taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReturnError::ReturnNotFound(_) => ErrorKind::NotFound,
            ReturnError::InvalidTransition { .. } => ErrorKind::InvalidState,
            ReturnError::Ineligible(_)
            | ReturnError::EmptyItems
            | ReturnError::NonPositiveQuantity { .. }
            | ReturnError::RestockExceedsQuantity { .. }
            | ReturnError::NegativeRefund { .. } => ErrorKind::Validation,
            ReturnError::CreditNoteConflict => ErrorKind::Conflict,
            ReturnError::Storage(e) => e.kind(),
        }
    }
}
