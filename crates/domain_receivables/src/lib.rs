//! Accounts Receivable Domain - Payment Application
//!
//! This crate applies client payments against invoices. The rules are few
//! but strict:
//!
//! - An invoice's balance is always `total - paid_amount` and never negative;
//!   a payment larger than the open balance is rejected outright.
//! - The status is a pure function of the paid amount: PAID exactly when the
//!   balance reaches zero (exact decimal equality), PARTIAL while something
//!   but not everything has been paid.
//! - Payment insert and invoice update happen in one storage transaction;
//!   a failure leaves no orphan payment and no stale balance.

pub mod error;
pub mod invoice;
pub mod payment;
pub mod ports;
pub mod service;

pub use error::ReceivableError;
pub use invoice::{derive_status, Invoice, InvoiceStatus};
pub use payment::{Payment, PaymentMethod};
pub use ports::ReceivableStore;
pub use service::{PaymentReceipt, PaymentService};
