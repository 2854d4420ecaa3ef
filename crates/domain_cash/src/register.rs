//! Cash registers (tills)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{Currency, RegisterId};

/// A physical or logical till
///
/// Registers are created once through seeding/administration and rarely
/// change afterwards; sessions reference them by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashRegister {
    /// Unique identifier
    pub id: RegisterId,
    /// Display name ("Caja 1", "Mostrador")
    pub name: String,
    /// Currency the till operates in
    pub currency: Currency,
    /// Inactive registers cannot open sessions
    pub is_active: bool,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl CashRegister {
    /// Creates a new active register
    pub fn new(name: impl Into<String>, currency: Currency) -> Self {
        Self {
            id: RegisterId::new_v7(),
            name: name.into(),
            currency,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    /// Deactivates the register
    pub fn deactivate(&mut self) {
        self.is_active = false;
    }
}
