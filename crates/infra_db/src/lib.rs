//! Infrastructure Database Layer
//!
//! PostgreSQL implementations of the domain storage ports, built on SQLx.
//!
//! # Architecture
//!
//! Each repository implements one domain port (`CashStore`,
//! `ReceivableStore`, `ReturnStore`). Every multi-row write the ports
//! declare atomic runs inside an explicit transaction; the schema carries
//! the matching backstops (a partial unique index for the single open
//! session per register, unique invoice and credit-note numbers, and a
//! non-negative stock check), surfaced to the domain as `Conflict`.
//!
//! Queries bind parameters at runtime, so the crate builds without a live
//! database; enums and currencies are stored as TEXT through the domain
//! `as_str`/`FromStr` conversions.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PgCashStore};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/retail")).await?;
//! run_migrations(&pool).await?;
//! let store = PgCashStore::new(pool);
//! ```

pub mod error;
pub mod pool;
pub mod repositories;

pub use error::DatabaseError;
pub use pool::{create_pool, create_pool_from_url, DatabaseConfig, DatabasePool};
pub use repositories::cash::PgCashStore;
pub use repositories::receivables::PgReceivableStore;
pub use repositories::returns::PgReturnStore;

/// Applies the embedded migrations
pub async fn run_migrations(pool: &DatabasePool) -> Result<(), DatabaseError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
}
