//! Ports infrastructure
//!
//! Each domain defines a storage port trait that depends only on this crate;
//! adapters (PostgreSQL in `infra_db`, in-memory mocks for tests) implement
//! those traits. `PortError` is the unified error type all adapters return,
//! so domain services handle storage failures uniformly.
//!
//! Mutating port methods are atomic units: an adapter either applies every
//! row write of the method or none of them.

use crate::error::ErrorKind;
use std::fmt;
use thiserror::Error;

/// Error type for port operations
#[derive(Debug, Error)]
pub enum PortError {
    /// The requested entity was not found
    #[error("Not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    /// The operation conflicts with existing data
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// A validation error occurred inside the adapter
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Connection to the underlying store failed
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An internal adapter error occurred
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl PortError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Creates a Conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        PortError::Conflict {
            message: message.into(),
        }
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
        }
    }

    /// Creates a Connection error
    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        PortError::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true if this error indicates the entity was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }

    /// Returns true if this error indicates a uniqueness/concurrency conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, PortError::Conflict { .. })
    }

    /// Classifies this error into the common taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            PortError::NotFound { .. } => ErrorKind::NotFound,
            PortError::Conflict { .. } => ErrorKind::Conflict,
            PortError::Validation { .. } => ErrorKind::Validation,
            PortError::Connection { .. } | PortError::Internal { .. } => {
                ErrorKind::Infrastructure
            }
        }
    }
}

/// Marker trait for all domain ports
///
/// All port traits extend this marker to ensure they are thread-safe and can
/// be shared across async tasks.
pub trait DomainPort: Send + Sync + 'static {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_error_not_found() {
        let error = PortError::not_found("Invoice", "INV-123");
        assert!(error.is_not_found());
        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert!(error.to_string().contains("Invoice"));
        assert!(error.to_string().contains("INV-123"));
    }

    #[test]
    fn test_port_error_conflict() {
        let error = PortError::conflict("duplicate credit note number");
        assert!(error.is_conflict());
        assert_eq!(error.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_infrastructure_kinds() {
        assert_eq!(
            PortError::connection("refused").kind(),
            ErrorKind::Infrastructure
        );
        assert_eq!(
            PortError::internal("row decode").kind(),
            ErrorKind::Infrastructure
        );
    }
}
