//! Cash session application service
//!
//! Orchestrates the session lifecycle over a [`CashStore`]: every operation
//! reads current state, validates, then performs a single atomic store write.

use std::sync::Arc;

use tracing::info;

use core_kernel::{Money, RegisterId, SaleId, SessionId, UserId};

use crate::error::CashError;
use crate::movement::{CashMovement, MovementKind};
use crate::ports::CashStore;
use crate::session::{summarize, CashSession, SessionSummary};

/// Service owning the register session lifecycle and movement ledger
pub struct CashSessionService {
    store: Arc<dyn CashStore>,
}

impl CashSessionService {
    /// Creates a new service over the given store
    pub fn new(store: Arc<dyn CashStore>) -> Self {
        Self { store }
    }

    /// Opens a session on a register
    ///
    /// Fails with `Conflict` if the register already has an open session.
    /// The session and its OPENING audit movement are inserted together.
    pub async fn open_session(
        &self,
        register_id: RegisterId,
        opening_balance: Money,
        opened_by: UserId,
        opening_notes: Option<String>,
    ) -> Result<CashSession, CashError> {
        if opening_balance.is_negative() {
            return Err(CashError::NegativeOpeningBalance {
                amount: opening_balance,
            });
        }

        let register = self
            .store
            .find_register(register_id)
            .await?
            .ok_or(CashError::RegisterNotFound(register_id))?;
        if !register.is_active {
            return Err(CashError::RegisterInactive(register_id));
        }
        if opening_balance.currency() != register.currency {
            return Err(CashError::CurrencyMismatch {
                given: opening_balance.currency(),
                expected: register.currency,
            });
        }

        if self.store.find_open_session(register_id).await?.is_some() {
            return Err(CashError::SessionAlreadyOpen(register_id));
        }

        let session = CashSession::open(register_id, opening_balance, opened_by, opening_notes);
        let opening = CashMovement::opening(&session);

        self.store
            .insert_session(&session, &opening)
            .await
            .map_err(|e| {
                if e.is_conflict() {
                    CashError::SessionAlreadyOpen(register_id)
                } else {
                    CashError::Storage(e)
                }
            })?;

        info!(
            session_id = %session.id,
            register_id = %register_id,
            opening_balance = %opening_balance,
            "cash session opened"
        );
        Ok(session)
    }

    /// Records a manual movement (EXPENSE, DEPOSIT or WITHDRAWAL)
    ///
    /// SALE entries are created only by [`record_sale`](Self::record_sale);
    /// OPENING/CLOSING entries belong to the session lifecycle.
    pub async fn record_movement(
        &self,
        session_id: SessionId,
        kind: MovementKind,
        amount: Money,
        description: impl Into<String>,
        performed_by: UserId,
        notes: Option<String>,
    ) -> Result<CashMovement, CashError> {
        if !kind.is_manual() {
            return Err(CashError::NotManualMovement { kind });
        }

        let session = self.writable_session(session_id).await?;
        self.check_amount(&session, amount)?;

        let movement = CashMovement::new(session_id, kind, amount, description, performed_by)
            .with_notes(notes);
        self.store.append_movement(&movement).await?;

        info!(
            session_id = %session_id,
            kind = %kind,
            amount = %amount,
            "cash movement recorded"
        );
        Ok(movement)
    }

    /// Records the SALE movement for a completed sale
    ///
    /// Called by the sale-completion flow so the ledger's SALE entries stay
    /// strictly 1:1 with completed sales.
    pub async fn record_sale(
        &self,
        session_id: SessionId,
        amount: Money,
        sale_id: SaleId,
        performed_by: UserId,
    ) -> Result<CashMovement, CashError> {
        let session = self.writable_session(session_id).await?;
        self.check_amount(&session, amount)?;

        let movement = CashMovement::for_sale(session_id, amount, sale_id, performed_by);
        self.store.append_movement(&movement).await?;

        info!(session_id = %session_id, sale_id = %sale_id, amount = %amount, "sale recorded in till");
        Ok(movement)
    }

    /// Closes a session against the physically counted balance
    ///
    /// Computes the expected balance from the session's own movements, sets
    /// the variance and the terminal CLOSED status, and stores the updated
    /// session together with its CLOSING audit movement.
    pub async fn close_session(
        &self,
        session_id: SessionId,
        actual_balance: Money,
        closed_by: UserId,
        closing_notes: Option<String>,
    ) -> Result<CashSession, CashError> {
        if actual_balance.is_negative() {
            return Err(CashError::NegativeActualBalance {
                amount: actual_balance,
            });
        }

        let mut session = self
            .store
            .find_session(session_id)
            .await?
            .ok_or(CashError::SessionNotFound(session_id))?;
        if actual_balance.currency() != session.currency() {
            return Err(CashError::CurrencyMismatch {
                given: actual_balance.currency(),
                expected: session.currency(),
            });
        }

        let movements = self.store.movements_for_session(session_id).await?;
        let summary = summarize(&session, &movements);
        session.close(&summary, actual_balance, closed_by, closing_notes)?;

        let closing = CashMovement::closing(&session, actual_balance, closed_by);
        self.store.store_closed_session(&session, &closing).await?;

        info!(
            session_id = %session_id,
            expected = %summary.expected,
            actual = %actual_balance,
            variance = %(actual_balance - summary.expected),
            "cash session closed"
        );
        Ok(session)
    }

    /// Returns a session with its movements
    pub async fn session(
        &self,
        session_id: SessionId,
    ) -> Result<(CashSession, Vec<CashMovement>), CashError> {
        let session = self
            .store
            .find_session(session_id)
            .await?
            .ok_or(CashError::SessionNotFound(session_id))?;
        let movements = self.store.movements_for_session(session_id).await?;
        Ok((session, movements))
    }

    /// Computes the live summary of a session from its current movements
    pub async fn session_summary(
        &self,
        session_id: SessionId,
    ) -> Result<SessionSummary, CashError> {
        let (session, movements) = self.session(session_id).await?;
        Ok(summarize(&session, &movements))
    }

    /// Returns the register's open session, if any
    pub async fn open_session_for(
        &self,
        register_id: RegisterId,
    ) -> Result<Option<CashSession>, CashError> {
        Ok(self.store.find_open_session(register_id).await?)
    }

    /// Returns all sessions of a register, newest first
    pub async fn sessions_for_register(
        &self,
        register_id: RegisterId,
    ) -> Result<Vec<CashSession>, CashError> {
        Ok(self.store.sessions_for_register(register_id).await?)
    }

    async fn writable_session(&self, session_id: SessionId) -> Result<CashSession, CashError> {
        let session = self
            .store
            .find_session(session_id)
            .await?
            .ok_or(CashError::SessionNotFound(session_id))?;
        if !session.is_open() {
            return Err(CashError::SessionClosed(session_id));
        }
        Ok(session)
    }

    fn check_amount(&self, session: &CashSession, amount: Money) -> Result<(), CashError> {
        if !amount.is_positive() {
            return Err(CashError::NonPositiveAmount { amount });
        }
        if amount.currency() != session.currency() {
            return Err(CashError::CurrencyMismatch {
                given: amount.currency(),
                expected: session.currency(),
            });
        }
        Ok(())
    }
}
