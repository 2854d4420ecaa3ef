//! Cash Register Domain - Session Lifecycle and Movement Ledger
//!
//! This crate owns the cash-register side of the reconciliation core:
//!
//! - A register has at most one OPEN session at any time.
//! - Every cash-affecting event inside a session is an append-only
//!   [`CashMovement`]; the effect on the till is determined by the movement
//!   kind, never by a stored sign.
//! - Closing a session computes the expected balance from the session's own
//!   movements and records the variance against the counted cash. A closed
//!   session is terminal.
//!
//! The arithmetic lives in [`session::summarize`], a pure function, so the
//! close-out math is testable without any store.

pub mod error;
pub mod movement;
pub mod ports;
pub mod register;
pub mod service;
pub mod session;

pub use error::CashError;
pub use movement::{CashMovement, MovementKind};
pub use ports::CashStore;
pub use register::CashRegister;
pub use service::CashSessionService;
pub use session::{summarize, CashSession, SessionStatus, SessionSummary};
