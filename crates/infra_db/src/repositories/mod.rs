//! Port implementations over PostgreSQL

pub mod cash;
pub mod receivables;
pub mod returns;

use core_kernel::{Currency, Money, PortError};
use rust_decimal::Decimal;

use crate::error::DatabaseError;

/// Maps a raw SQLx failure into the port error the domains consume
pub(crate) fn db_err(error: sqlx::Error) -> PortError {
    PortError::from(DatabaseError::from(error))
}

/// Rebuilds a Money value from its stored amount and currency code
pub(crate) fn money_from_row(amount: Decimal, currency: &str) -> Result<Money, PortError> {
    let currency: Currency = currency
        .parse()
        .map_err(|_| PortError::internal(format!("unknown stored currency: {currency}")))?;
    Ok(Money::new(amount, currency))
}

/// Parses a stored enum representation through the domain `FromStr`
pub(crate) fn parse_stored<T>(value: &str, what: &str) -> Result<T, PortError>
where
    T: std::str::FromStr,
{
    value
        .parse::<T>()
        .map_err(|_| PortError::internal(format!("unknown stored {what}: {value}")))
}
