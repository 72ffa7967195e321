//! Per-row parsing and normalization

use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use csv::StringRecord;
use rust_decimal::Decimal;
use thiserror::Error;

use super::columns::ColumnMap;
use super::fingerprint::fingerprint;
use crate::models::NewTransaction;
use crate::money::{round_cents, to_cents};

pub const MAX_NAME_CHARS: usize = 25;
pub const MAX_DESCRIPTION_CHARS: usize = 225;

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", // 2024-01-15
    "%m/%d/%Y", // 01/15/2024
    "%m/%d/%y", // 01/15/24
    "%d.%m.%Y", // 15.01.2024
    "%Y/%m/%d", // 2024/01/15
    "%m-%d-%Y", // 01-15-2024
    "%d/%m/%Y", // 15/01/2024 (European, only reached when day > 12)
];

/// Why a single row was skipped
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    #[error("missing description")]
    MissingDescription,

    #[error("missing amount")]
    MissingAmount,

    #[error("invalid amount '{0}'")]
    InvalidAmount(String),

    #[error("missing date")]
    MissingDate,

    #[error("invalid date '{0}'")]
    InvalidDate(String),

    #[error("unreadable record: {0}")]
    Unreadable(String),
}

/// Parse an amount, tolerating separators, `$` and accounting negatives
///
/// Values that do not fit the stored cents column are rejected here so a
/// single bad row never reaches the batch writer.
pub fn parse_amount(raw: &str) -> Result<Decimal, RowError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(RowError::MissingAmount);
    }

    let mut cleaned: String = trimmed
        .chars()
        .filter(|c| !matches!(c, ',' | ' ' | '\u{a0}' | '"' | '\''))
        .collect();

    let negative = cleaned.starts_with('(') && cleaned.ends_with(')');
    if negative {
        cleaned = cleaned[1..cleaned.len() - 1].to_string();
    }
    // Currency symbol may sit before or after a minus sign
    let cleaned = match cleaned.strip_prefix('-') {
        Some(rest) => format!("-{}", rest.trim_start_matches('$')),
        None => cleaned.trim_start_matches('$').to_string(),
    };

    let value = Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .map_err(|_| RowError::InvalidAmount(raw.trim().to_string()))?;

    let value = round_cents(if negative { -value } else { value });
    to_cents(value).map_err(|_| RowError::InvalidAmount(raw.trim().to_string()))?;
    Ok(value)
}

/// True for values like `-4,50` or `"1.234,50"`: a comma followed by exactly
/// two trailing digits and no later dot, i.e. a probable decimal comma
pub fn looks_like_decimal_comma(raw: &str) -> bool {
    let s = raw.trim().trim_matches('"').trim_end_matches(')');
    match s.rsplit_once(',') {
        Some((_, cents)) => cents.len() == 2 && cents.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}

/// Parse a calendar date in any supported statement format
pub fn parse_date(raw: &str) -> Result<NaiveDate, RowError> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(RowError::MissingDate);
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| {
            NaiveDate::parse_from_str(s, fmt)
                .ok()
                // %Y happily reads "24" as year 24; leave two-digit years to %y
                .filter(|d| !fmt.contains("%Y") || d.year() >= 1000)
        })
        .ok_or_else(|| RowError::InvalidDate(s.to_string()))
}

/// Trim, collapse whitespace and lowercase
pub fn normalize_description(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// First `max` characters of `s`, never splitting a code point
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Turn one CSV record into a transaction candidate
pub fn parse_row(
    record: &StringRecord,
    columns: &ColumnMap,
    user_id: i64,
    category_id: i64,
) -> Result<NewTransaction, RowError> {
    let field = |idx: usize| record.get(idx).unwrap_or("");

    let normalized = normalize_description(field(columns.description));
    if normalized.is_empty() {
        return Err(RowError::MissingDescription);
    }
    let amount = parse_amount(field(columns.amount))?;
    let transaction_date = parse_date(field(columns.date))?;

    let balance = columns
        .balance
        .and_then(|idx| parse_amount(field(idx)).ok())
        .unwrap_or(Decimal::ZERO);

    let description = truncate_chars(&normalized, MAX_DESCRIPTION_CHARS).to_string();
    let name = truncate_chars(&description, MAX_NAME_CHARS).to_string();
    let fingerprint = fingerprint(user_id, &description, amount, transaction_date);

    Ok(NewTransaction {
        user_id,
        category_id: Some(category_id),
        name,
        amount,
        description: Some(description),
        transaction_date,
        balance: round_cents(balance),
        fingerprint: Some(fingerprint),
    })
}
