//! Transaction identity hashing

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

use crate::money::round_cents;

/// Stable identity of an imported transaction
///
/// SHA-256 over `user|description|amount|date` with the amount at two
/// decimals and the date as `YYYY-MM-DD`. `description` must already be
/// normalized and truncated. Balance is not part of the identity.
pub fn fingerprint(user_id: i64, description: &str, amount: Decimal, date: NaiveDate) -> String {
    let key = format!(
        "{}|{}|{}|{}",
        user_id,
        description,
        round_cents(amount),
        date.format("%Y-%m-%d")
    );
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}
