//! Fixed-point money helpers
//!
//! Amounts are `Decimal` in memory and INTEGER cents in SQLite. Rounding to
//! cents is always half-away-from-zero, so `0.005` becomes `0.01` and
//! `-0.005` becomes `-0.01`.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{Error, Result};

/// Round an amount to cent precision (half away from zero)
pub fn round_cents(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Convert an amount to integer cents for storage
pub fn to_cents(amount: Decimal) -> Result<i64> {
    let rounded = round_cents(amount);
    i64::try_from(rounded.mantissa())
        .map_err(|_| Error::Validation(format!("Amount out of range: {}", amount)))
}

/// Convert stored cents back to a 2-dp decimal
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Convert a float (exchange-rate math) to a cent-rounded decimal
pub fn from_f64(value: f64) -> Result<Decimal> {
    Decimal::try_from(value)
        .map(round_cents)
        .map_err(|_| Error::Validation(format!("Not a finite amount: {}", value)))
}
