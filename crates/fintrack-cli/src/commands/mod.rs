//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Init and shared utilities (open_db)
//! - `users` - Register, login, profile and password changes
//! - `accounts` - Account management, deposits and transfers
//! - `categories` - Category management
//! - `transactions` - Transaction commands (list, add, show, update, delete)
//! - `import` - Bank statement CSV import
//! - `budgets` - Monthly budgets and budget status
//! - `reports` - Report generation commands
//! - `rates` - Currency conversion

pub mod accounts;
pub mod budgets;
pub mod categories;
pub mod core;
pub mod import;
pub mod rates;
pub mod reports;
pub mod transactions;
pub mod users;

// Re-export command functions for main.rs
pub use accounts::*;
pub use budgets::*;
pub use categories::*;
pub use core::*;
pub use import::*;
pub use rates::*;
pub use reports::*;
pub use transactions::*;
pub use users::*;

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Local};
use fintrack_core::{db::Database, models::User};
use rust_decimal::Decimal;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Look up the user a command acts for
pub fn resolve_user(db: &Database, email: &str) -> Result<User> {
    let email = email.trim().to_lowercase();
    db.get_user_by_email(&email)?
        .ok_or_else(|| anyhow::anyhow!("No user registered with email {}", email))
}

/// Parse a `YYYY-MM` month argument
pub fn parse_month(s: &str) -> Result<(i32, u32)> {
    let (year, month) = s
        .trim()
        .split_once('-')
        .with_context(|| format!("Invalid month '{}', expected YYYY-MM", s))?;
    let year: i32 = year
        .parse()
        .with_context(|| format!("Invalid year in '{}'", s))?;
    let month: u32 = month
        .parse()
        .with_context(|| format!("Invalid month in '{}'", s))?;
    if !(1..=12).contains(&month) {
        bail!("Month must be between 01 and 12, got {}", month);
    }
    Ok((year, month))
}

/// `YYYY-MM` argument, or the current month when absent
pub fn month_or_current(s: Option<&str>) -> Result<(i32, u32)> {
    match s {
        Some(s) => parse_month(s),
        None => {
            let today = Local::now().date_naive();
            Ok((today.year(), today.month()))
        }
    }
}

/// Colored signed amount: red for money out, green for money in
pub fn format_amount(amount: Decimal) -> String {
    if amount < Decimal::ZERO {
        format!("\x1b[31m-{:.2}\x1b[0m", amount.abs())
    } else {
        format!("\x1b[32m+{:.2}\x1b[0m", amount)
    }
}
