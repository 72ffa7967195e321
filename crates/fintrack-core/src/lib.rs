//! Fintrack Core Library
//!
//! Shared functionality for the fintrack personal finance tracker:
//! - Database access and migrations
//! - Bank statement CSV import with fingerprint dedup and batched writes
//! - User registration, password hashing and login throttling
//! - Monthly budgets and report data
//! - Currency conversion with a cached exchange-rate source

pub mod auth;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod import;
pub mod models;
pub mod money;
pub mod rates;
pub mod reports;

/// Test utilities (in-memory transaction store)
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use auth::LoginLimiter;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use db::Database;
pub use error::{Error, Result};
pub use import::{
    CancelFlag, ImportOptions, ImportSummary, Importer, InsertOutcome, TransactionStore,
};
pub use rates::{AccountsTotal, HttpRateSource, RateCache, RateSource};
pub use reports::MonthlyReport;
