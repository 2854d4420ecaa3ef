//! Core Kernel - Foundational types and utilities for the retail system
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Money types with precise decimal arithmetic
//! - Strongly-typed entity identifiers
//! - Common error classification and port abstractions

pub mod error;
pub mod identifiers;
pub mod money;
pub mod ports;

pub use error::ErrorKind;
pub use identifiers::{
    ClientId, InvoiceId, MovementId, PaymentId, ProductId, RegisterId, ReturnId, SaleId,
    SessionId, UserId,
};
pub use money::{Currency, Money, MoneyError};
pub use ports::{DomainPort, PortError};
