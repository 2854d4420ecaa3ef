//! Cash Domain Ports
//!
//! The [`CashStore`] trait defines everything the cash domain needs from its
//! data source. Adapters implement it over PostgreSQL (`infra_db`) or in
//! memory (the `mock` module here, for tests).
//!
//! Fetch methods return `Option` so the service owns the not-found mapping.
//! Every mutating method is one atomic unit: the adapter applies all of the
//! method's row writes or none of them.

use async_trait::async_trait;

use core_kernel::{DomainPort, PortError, RegisterId, SessionId};

use crate::movement::CashMovement;
use crate::register::CashRegister;
use crate::session::CashSession;

/// Storage port for the cash domain
#[async_trait]
pub trait CashStore: DomainPort {
    /// Looks up a register by id
    async fn find_register(&self, id: RegisterId) -> Result<Option<CashRegister>, PortError>;

    /// Inserts a register (seeding/administration)
    async fn insert_register(&self, register: &CashRegister) -> Result<(), PortError>;

    /// Looks up a session by id
    async fn find_session(&self, id: SessionId) -> Result<Option<CashSession>, PortError>;

    /// Returns the register's OPEN session, if any
    async fn find_open_session(
        &self,
        register_id: RegisterId,
    ) -> Result<Option<CashSession>, PortError>;

    /// Returns all sessions of a register, newest first
    async fn sessions_for_register(
        &self,
        register_id: RegisterId,
    ) -> Result<Vec<CashSession>, PortError>;

    /// Returns a session's movements in creation order
    async fn movements_for_session(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<CashMovement>, PortError>;

    /// Inserts a new session together with its OPENING movement
    ///
    /// Must fail with `Conflict` if the register already has an open session.
    async fn insert_session(
        &self,
        session: &CashSession,
        opening: &CashMovement,
    ) -> Result<(), PortError>;

    /// Appends one movement to an open session's ledger
    async fn append_movement(&self, movement: &CashMovement) -> Result<(), PortError>;

    /// Persists the close-out: the updated session and its CLOSING movement
    async fn store_closed_session(
        &self,
        session: &CashSession,
        closing: &CashMovement,
    ) -> Result<(), PortError>;
}

/// In-memory mock implementation of [`CashStore`] for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use crate::session::SessionStatus;

    /// Mock store backed by `HashMap`s behind an async lock
    #[derive(Debug, Default)]
    pub struct MockCashStore {
        registers: Arc<RwLock<HashMap<RegisterId, CashRegister>>>,
        sessions: Arc<RwLock<HashMap<SessionId, CashSession>>>,
        movements: Arc<RwLock<Vec<CashMovement>>>,
    }

    impl MockCashStore {
        /// Creates an empty mock store
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates with registers for testing
        pub async fn with_registers(registers: Vec<CashRegister>) -> Self {
            let store = Self::new();
            for register in registers {
                store.registers.write().await.insert(register.id, register);
            }
            store
        }

        /// Total number of stored movements, across all sessions
        pub async fn movement_count(&self) -> usize {
            self.movements.read().await.len()
        }
    }

    impl DomainPort for MockCashStore {}

    #[async_trait]
    impl CashStore for MockCashStore {
        async fn find_register(
            &self,
            id: RegisterId,
        ) -> Result<Option<CashRegister>, PortError> {
            Ok(self.registers.read().await.get(&id).cloned())
        }

        async fn insert_register(&self, register: &CashRegister) -> Result<(), PortError> {
            self.registers
                .write()
                .await
                .insert(register.id, register.clone());
            Ok(())
        }

        async fn find_session(&self, id: SessionId) -> Result<Option<CashSession>, PortError> {
            Ok(self.sessions.read().await.get(&id).cloned())
        }

        async fn find_open_session(
            &self,
            register_id: RegisterId,
        ) -> Result<Option<CashSession>, PortError> {
            Ok(self
                .sessions
                .read()
                .await
                .values()
                .find(|s| s.register_id == register_id && s.status == SessionStatus::Open)
                .cloned())
        }

        async fn sessions_for_register(
            &self,
            register_id: RegisterId,
        ) -> Result<Vec<CashSession>, PortError> {
            let mut sessions: Vec<_> = self
                .sessions
                .read()
                .await
                .values()
                .filter(|s| s.register_id == register_id)
                .cloned()
                .collect();
            sessions.sort_by(|a, b| b.opened_at.cmp(&a.opened_at));
            Ok(sessions)
        }

        async fn movements_for_session(
            &self,
            session_id: SessionId,
        ) -> Result<Vec<CashMovement>, PortError> {
            Ok(self
                .movements
                .read()
                .await
                .iter()
                .filter(|m| m.session_id == session_id)
                .cloned()
                .collect())
        }

        async fn insert_session(
            &self,
            session: &CashSession,
            opening: &CashMovement,
        ) -> Result<(), PortError> {
            let mut sessions = self.sessions.write().await;
            // Emulates the partial unique index on (register_id) WHERE status = 'OPEN'.
            let already_open = sessions
                .values()
                .any(|s| s.register_id == session.register_id && s.status == SessionStatus::Open);
            if already_open {
                return Err(PortError::conflict(format!(
                    "register {} already has an open session",
                    session.register_id
                )));
            }
            sessions.insert(session.id, session.clone());
            self.movements.write().await.push(opening.clone());
            Ok(())
        }

        async fn append_movement(&self, movement: &CashMovement) -> Result<(), PortError> {
            if !self.sessions.read().await.contains_key(&movement.session_id) {
                return Err(PortError::not_found("CashSession", movement.session_id));
            }
            self.movements.write().await.push(movement.clone());
            Ok(())
        }

        async fn store_closed_session(
            &self,
            session: &CashSession,
            closing: &CashMovement,
        ) -> Result<(), PortError> {
            let mut sessions = self.sessions.write().await;
            if !sessions.contains_key(&session.id) {
                return Err(PortError::not_found("CashSession", session.id));
            }
            sessions.insert(session.id, session.clone());
            self.movements.write().await.push(closing.clone());
            Ok(())
        }
    }
}
