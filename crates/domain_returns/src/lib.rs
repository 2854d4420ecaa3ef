//! Sales Return Domain - Credit-Note Workflow
//!
//! This crate reverses sales under strict rules:
//!
//! - A return request is validated against the sale history before anything
//!   is written: the sale must be live, at most one return may be outstanding
//!   per sale, every requested item must belong to the sale, be returnable,
//!   be within the return deadline, and never push the cumulative returned
//!   quantity past what was sold.
//! - Approved requests receive a sequential credit-note number
//!   (`NC-00000001`, ...).
//! - Processing an approved return applies the stock effects (restock for
//!   resellable conditions, replacement-unit deduction for same-product
//!   exchanges) and the terminal COMPLETED status in one transaction.
//!
//! The eligibility messages are end-user facing and surfaced verbatim.

pub mod credit_note;
pub mod eligibility;
pub mod error;
pub mod order;
pub mod ports;
pub mod service;

pub use credit_note::next_credit_note_number;
pub use eligibility::{
    check_eligibility, Eligibility, RequestedItem, SaleLine, SaleRecord,
    DEFAULT_RETURN_DEADLINE_DAYS,
};
pub use error::ReturnError;
pub use order::{
    ProductCondition, RefundMethod, ReturnItem, ReturnOrder, ReturnStatus, ReturnType,
    StockAdjustment,
};
pub use ports::ReturnStore;
pub use service::{CreateReturn, ReturnItemRequest, ReturnService};
