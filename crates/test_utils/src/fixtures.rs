//! Test Data Fixtures
//!
//! Pre-built values for the test suites, so individual tests only spell out
//! what they actually care about.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{Currency, Money};

/// Common money values
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// Money in the default test currency (Dominican peso)
    pub fn dop(amount: Decimal) -> Money {
        Money::new(amount, Currency::DOP)
    }

    /// The standard invoice total used across the receivables suite
    pub fn standard_total() -> Money {
        Self::dop(dec!(500))
    }

    /// The standard unit price used across the returns suite
    pub fn unit_price() -> Money {
        Self::dop(dec!(100))
    }
}

/// Common dates and timestamps
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// A due date far in the past (for overdue scenarios)
    pub fn past_due_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, 1).expect("valid date")
    }

    /// A due date 30 days out
    pub fn due_in_30_days() -> NaiveDate {
        Utc::now().date_naive() + Duration::days(30)
    }

    /// A timestamp the given number of days in the past
    pub fn days_ago(days: i64) -> DateTime<Utc> {
        Utc::now() - Duration::days(days)
    }
}
