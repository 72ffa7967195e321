//! Header resolution and delimiter detection

use csv::StringRecord;

use crate::error::{Error, Result};

const DATE_ALIASES: &[&str] = &["value date", "transaction date", "date", "booking date"];
const DESCRIPTION_ALIASES: &[&str] = &["text", "description", "description text", "details"];
const AMOUNT_ALIASES: &[&str] = &["amount"];
const BALANCE_ALIASES: &[&str] = &["balance", "running balance", "running bal."];

/// Positions of the logical columns within a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub date: usize,
    pub description: usize,
    pub amount: usize,
    pub balance: Option<usize>,
}

/// Lowercase, treat `_`/`-` as spaces and collapse whitespace
pub fn normalize_header(header: &str) -> String {
    header
        .trim_start_matches('\u{feff}')
        .to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn find(headers: &[String], aliases: &[&str]) -> Option<usize> {
    // Alias order is preference order, so "value date" beats a plain "date"
    aliases
        .iter()
        .find_map(|alias| headers.iter().position(|h| h == alias))
}

impl ColumnMap {
    /// Resolve required and optional columns from a header record
    ///
    /// Fails with the canonical names of every missing required column.
    pub fn resolve(headers: &StringRecord) -> Result<Self> {
        let normalized: Vec<String> = headers.iter().map(normalize_header).collect();

        let date = find(&normalized, DATE_ALIASES);
        let description = find(&normalized, DESCRIPTION_ALIASES);
        let amount = find(&normalized, AMOUNT_ALIASES);

        match (date, description, amount) {
            (Some(date), Some(description), Some(amount)) => Ok(Self {
                date,
                description,
                amount,
                balance: find(&normalized, BALANCE_ALIASES),
            }),
            _ => {
                let mut missing = Vec::new();
                if date.is_none() {
                    missing.push("Value date".to_string());
                }
                if description.is_none() {
                    missing.push("Text".to_string());
                }
                if amount.is_none() {
                    missing.push("Amount".to_string());
                }
                Err(Error::MissingColumns(missing))
            }
        }
    }
}

/// Pick the delimiter used by a header line: `,` `;` or tab, comma on ties
pub fn detect_delimiter(header_line: &str) -> u8 {
    let mut best = (b',', header_line.matches(',').count());
    for candidate in [b';', b'\t'] {
        let count = header_line.matches(candidate as char).count();
        if count > best.1 {
            best = (candidate, count);
        }
    }
    best.0
}
