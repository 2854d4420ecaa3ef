//! Error classification shared across the system
//!
//! Every domain crate defines its own `thiserror` enum; `ErrorKind` is the
//! common classification callers branch on (HTTP mapping, retry policy)
//! without matching on domain-specific variants.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a domain error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The referenced entity does not exist
    NotFound,
    /// The operation is not valid for the entity's current lifecycle state
    InvalidState,
    /// Caller-supplied data fails a business rule
    Validation,
    /// The operation collides with existing state (uniqueness, concurrent open)
    Conflict,
    /// An unexpected persistence or infrastructure failure
    Infrastructure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidState => "invalid_state",
            ErrorKind::Validation => "validation",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Infrastructure => "infrastructure",
        };
        write!(f, "{}", s)
    }
}
