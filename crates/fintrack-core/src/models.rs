//! Domain models for fintrack

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Kinds of account a user can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Savings,
    Current,
    FixedDeposit,
    RecurringDeposit,
    Joint,
    Student,
    BasicZeroBalance,
    Stocks,
    Crypto,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Savings => "savings",
            Self::Current => "current",
            Self::FixedDeposit => "fixed deposit",
            Self::RecurringDeposit => "recurring deposit",
            Self::Joint => "joint",
            Self::Student => "student",
            Self::BasicZeroBalance => "basic/zero-balance",
            Self::Stocks => "stocks",
            Self::Crypto => "crypto",
        }
    }

    pub fn all() -> &'static [AccountType] {
        &[
            Self::Savings,
            Self::Current,
            Self::FixedDeposit,
            Self::RecurringDeposit,
            Self::Joint,
            Self::Student,
            Self::BasicZeroBalance,
            Self::Stocks,
            Self::Crypto,
        ]
    }
}

impl std::str::FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::all()
            .iter()
            .find(|t| t.as_str() == wanted)
            .copied()
            .ok_or_else(|| {
                let names: Vec<&str> = Self::all().iter().map(|t| t.as_str()).collect();
                format!(
                    "Invalid account type '{}'. Must be one of: {}",
                    s,
                    names.join(", ")
                )
            })
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A bank-style account owned by a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub account_type: AccountType,
    pub balance: Decimal,
    /// ISO 4217 code, stored uppercase
    pub currency: String,
    /// Bank or broker the account lives at
    pub platform_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A new account (before DB insertion)
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub account_type: AccountType,
    pub balance: Decimal,
    pub currency: String,
    pub platform_name: Option<String>,
}

/// Partial account update; `None` leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub name: Option<String>,
    pub account_type: Option<AccountType>,
    pub balance: Option<Decimal>,
    pub currency: Option<String>,
    pub platform_name: Option<String>,
}

impl AccountUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.account_type.is_none()
            && self.balance.is_none()
            && self.currency.is_none()
            && self.platform_name.is_none()
    }
}

/// Whether a category collects money in or out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Income,
    Expense,
}

impl CategoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl std::str::FromStr for CategoryKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Unknown category kind: {}", s)),
        }
    }
}

impl std::fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user-defined spending/income category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub kind: CategoryKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A stored transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub category_id: Option<i64>,
    /// Short display name (at most 25 characters for imported rows)
    pub name: String,
    /// Negative = expense, positive = income
    pub amount: Decimal,
    pub description: Option<String>,
    pub transaction_date: NaiveDate,
    /// Statement balance after this transaction, 0 when unknown
    pub balance: Decimal,
    /// Dedup fingerprint; `None` for manually entered rows
    pub fingerprint: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A new transaction (before DB insertion)
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub user_id: i64,
    pub category_id: Option<i64>,
    pub name: String,
    pub amount: Decimal,
    pub description: Option<String>,
    pub transaction_date: NaiveDate,
    pub balance: Decimal,
    pub fingerprint: Option<String>,
}

/// Partial transaction update; `None` leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct TransactionUpdate {
    pub category_id: Option<i64>,
    pub name: Option<String>,
    pub amount: Option<Decimal>,
    pub description: Option<String>,
}

impl TransactionUpdate {
    pub fn is_empty(&self) -> bool {
        self.category_id.is_none()
            && self.name.is_none()
            && self.amount.is_none()
            && self.description.is_none()
    }
}

/// A monthly budget for one category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub user_id: i64,
    pub category_id: i64,
    pub amount: Decimal,
    pub month: u32,
    pub year: i32,
}

/// Budget vs. actual spending for one category in a month
#[derive(Debug, Clone, Serialize)]
pub struct BudgetStatus {
    pub category_id: i64,
    pub category_name: String,
    pub budget: Decimal,
    /// Outflow for the month as a positive number
    pub spent: Decimal,
    /// `budget - spent`, negative when over budget
    pub remaining: Decimal,
}

impl BudgetStatus {
    pub fn is_over(&self) -> bool {
        self.remaining < Decimal::ZERO
    }
}
