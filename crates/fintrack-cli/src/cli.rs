//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

/// Fintrack - Personal finance tracker
#[derive(Parser)]
#[command(name = "fintrack")]
#[command(about = "Track accounts, budgets and bank statement imports", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "fintrack.db", global = true)]
    pub db: PathBuf,

    /// Config file (defaults to the data-dir override, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set FINTRACK_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Register, log in and manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Manage accounts
    Accounts {
        #[command(subcommand)]
        action: AccountsAction,
    },

    /// Manage categories
    Categories {
        #[command(subcommand)]
        action: CategoriesAction,
    },

    /// Manage transactions
    Transactions {
        #[command(subcommand)]
        action: TransactionsAction,
    },

    /// Import a bank statement CSV
    ///
    /// Requires the columns "Value date", "Text" and "Amount" (common aliases
    /// are accepted). Re-importing the same statement is safe: rows already
    /// stored are counted as duplicates.
    Import {
        /// CSV file to import
        #[arg(short, long)]
        file: PathBuf,

        /// Email of the user who owns the statement
        #[arg(short, long)]
        user: String,

        /// Category for imported rows (defaults to import.default_category_id)
        #[arg(short, long)]
        category: Option<i64>,

        /// Rows per database batch
        #[arg(long)]
        batch_size: Option<usize>,

        /// Print the import summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage monthly budgets
    Budgets {
        #[command(subcommand)]
        action: BudgetsAction,
    },

    /// Generate reports
    Report {
        #[command(subcommand)]
        report_type: ReportType,
    },

    /// Currency conversion
    Rates {
        #[command(subcommand)]
        action: RatesAction,
    },
}

#[derive(Subcommand)]
pub enum UserAction {
    /// Create a new user
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Check credentials
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Change name and/or email
    Update {
        /// Current email
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        new_email: Option<String>,
    },

    /// Change password
    Password {
        #[arg(long)]
        email: String,
        #[arg(long)]
        old: String,
        #[arg(long)]
        new: String,
        #[arg(long)]
        confirm: String,
    },
}

#[derive(Subcommand)]
pub enum AccountsAction {
    /// List a user's accounts
    List {
        #[arg(short, long)]
        user: String,
    },

    /// Open an account
    Add {
        #[arg(short, long)]
        user: String,
        #[arg(long)]
        name: String,
        /// savings, current, fixed deposit, recurring deposit, joint, student,
        /// basic/zero-balance, stocks, crypto
        #[arg(long = "type", default_value = "savings")]
        account_type: String,
        #[arg(long, default_value = "0")]
        balance: Decimal,
        #[arg(long, default_value = "USD")]
        currency: String,
        /// Bank or broker holding the account
        #[arg(long)]
        platform: Option<String>,
    },

    /// Change account details
    Update {
        #[arg(short, long)]
        user: String,
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long = "type")]
        account_type: Option<String>,
        #[arg(long)]
        balance: Option<Decimal>,
        #[arg(long)]
        currency: Option<String>,
        #[arg(long)]
        platform: Option<String>,
    },

    /// Delete an account (requires the owner's password)
    Delete {
        #[arg(short, long)]
        user: String,
        id: i64,
        #[arg(long)]
        password: String,
    },

    /// Add money to an account
    Deposit {
        #[arg(short, long)]
        user: String,
        id: i64,
        amount: Decimal,
    },

    /// Move money between two of the user's accounts
    Transfer {
        #[arg(short, long)]
        user: String,
        #[arg(long)]
        from: i64,
        #[arg(long)]
        to: i64,
        amount: Decimal,
    },
}

#[derive(Subcommand)]
pub enum CategoriesAction {
    /// List a user's categories
    List {
        #[arg(short, long)]
        user: String,
    },

    /// Create a category
    Add {
        #[arg(short, long)]
        user: String,
        name: String,
        /// income or expense
        #[arg(long, default_value = "expense")]
        kind: String,
    },

    /// Rename or re-kind a category
    Update {
        #[arg(short, long)]
        user: String,
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        kind: Option<String>,
    },

    /// Delete a category (its transactions become uncategorized)
    Delete {
        #[arg(short, long)]
        user: String,
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum TransactionsAction {
    /// List recent transactions
    List {
        #[arg(short, long)]
        user: String,
        /// Maximum number of transactions to show
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },

    /// Record a transaction by hand
    Add {
        #[arg(short, long)]
        user: String,
        #[arg(long)]
        name: String,
        /// Negative for money out
        #[arg(long, allow_hyphen_values = true)]
        amount: Decimal,
        /// Transaction date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        category: Option<i64>,
        #[arg(long)]
        description: Option<String>,
    },

    /// Show one transaction
    Show {
        #[arg(short, long)]
        user: String,
        id: i64,
    },

    /// Change a transaction
    Update {
        #[arg(short, long)]
        user: String,
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        amount: Option<Decimal>,
        #[arg(long)]
        category: Option<i64>,
        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a transaction
    Delete {
        #[arg(short, long)]
        user: String,
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum BudgetsAction {
    /// Set the budget for one category and month
    Set {
        #[arg(short, long)]
        user: String,
        #[arg(long)]
        category: i64,
        #[arg(long)]
        amount: Decimal,
        /// Month (YYYY-MM)
        #[arg(long)]
        month: String,
    },

    /// Set the same budget for several consecutive months
    Repeat {
        #[arg(short, long)]
        user: String,
        #[arg(long)]
        category: i64,
        #[arg(long)]
        amount: Decimal,
        /// First month (YYYY-MM)
        #[arg(long)]
        start: String,
        /// Number of months
        #[arg(long, default_value = "12")]
        months: u32,
    },

    /// Budget vs. spending for a month
    Status {
        #[arg(short, long)]
        user: String,
        /// Month (YYYY-MM, defaults to the current month)
        #[arg(long)]
        month: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ReportType {
    /// Monthly summary: totals, daily series, categories
    Monthly {
        #[arg(short, long)]
        user: String,
        /// Month (YYYY-MM, defaults to the current month)
        #[arg(long)]
        month: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum RatesAction {
    /// Convert an amount between currencies
    Convert {
        amount: Decimal,
        from: String,
        to: String,
    },

    /// Total of all a user's account balances in one currency
    Total {
        #[arg(short, long)]
        user: String,
        #[arg(long, default_value = "USD")]
        base: String,
    },
}
