//! Account operations

use rust_decimal::Decimal;
use rusqlite::{params, OptionalExtension, Row};
use tracing::info;

use super::{parse_datetime, Database};
use crate::auth::verify_password;
use crate::error::{Error, Result};
use crate::models::{Account, AccountUpdate, NewAccount};
use crate::money::{from_cents, round_cents, to_cents};

/// Largest balance or single deposit an account accepts
pub const MAX_ACCOUNT_AMOUNT: Decimal = Decimal::from_parts(10_000_000, 0, 0, false, 0);

const ACCOUNT_COLUMNS: &str =
    "id, user_id, name, account_type, balance_cents, currency, platform_name, created_at";

fn row_to_account(row: &Row) -> rusqlite::Result<Account> {
    let account_type: String = row.get(3)?;
    let created_at: String = row.get(7)?;
    Ok(Account {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        account_type: account_type.parse().map_err(|e: String| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Text,
                e.into(),
            )
        })?,
        balance: from_cents(row.get(4)?),
        currency: row.get(5)?,
        platform_name: row.get(6)?,
        created_at: parse_datetime(&created_at),
    })
}

fn validate_balance(balance: Decimal) -> Result<()> {
    if balance < Decimal::ZERO || balance > MAX_ACCOUNT_AMOUNT {
        return Err(Error::Validation(format!(
            "Balance must be between 0 and {}",
            MAX_ACCOUNT_AMOUNT
        )));
    }
    Ok(())
}

fn normalize_currency(currency: &str) -> Result<String> {
    let code = currency.trim().to_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(Error::Validation(format!(
            "Currency must be a 3-letter code: {}",
            currency
        )));
    }
    Ok(code)
}

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation("Account name cannot be empty".into()));
    }
    Ok(name.to_string())
}

impl Database {
    /// Create an account for a user
    pub fn add_account(&self, user_id: i64, account: &NewAccount) -> Result<i64> {
        let name = validate_name(&account.name)?;
        validate_balance(account.balance)?;
        let currency = normalize_currency(&account.currency)?;

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO accounts (user_id, name, account_type, balance_cents, currency, platform_name)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                name,
                account.account_type.as_str(),
                to_cents(account.balance)?,
                currency,
                account.platform_name,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// List a user's accounts
    pub fn list_accounts(&self, user_id: i64) -> Result<Vec<Account>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM accounts WHERE user_id = ? ORDER BY name",
            ACCOUNT_COLUMNS
        ))?;

        let accounts = stmt
            .query_map(params![user_id], row_to_account)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(accounts)
    }

    /// Get an account, only if it belongs to the user
    pub fn get_account(&self, user_id: i64, id: i64) -> Result<Option<Account>> {
        let conn = self.conn()?;
        let account = conn
            .query_row(
                &format!(
                    "SELECT {} FROM accounts WHERE id = ? AND user_id = ?",
                    ACCOUNT_COLUMNS
                ),
                params![id, user_id],
                row_to_account,
            )
            .optional()?;
        Ok(account)
    }

    fn require_account(&self, user_id: i64, id: i64) -> Result<Account> {
        self.get_account(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("account {}", id)))
    }

    /// Apply a partial update to an account
    pub fn update_account(&self, user_id: i64, id: i64, update: &AccountUpdate) -> Result<Account> {
        if update.is_empty() {
            return Err(Error::Validation("No changes were provided".into()));
        }
        self.require_account(user_id, id)?;

        let name = update.name.as_deref().map(validate_name).transpose()?;
        if let Some(balance) = update.balance {
            validate_balance(balance)?;
        }
        let currency = update
            .currency
            .as_deref()
            .map(normalize_currency)
            .transpose()?;
        let balance_cents = update.balance.map(to_cents).transpose()?;

        let conn = self.conn()?;
        conn.execute(
            r#"
            UPDATE accounts SET
                name = COALESCE(?, name),
                account_type = COALESCE(?, account_type),
                balance_cents = COALESCE(?, balance_cents),
                currency = COALESCE(?, currency),
                platform_name = COALESCE(?, platform_name)
            WHERE id = ? AND user_id = ?
            "#,
            params![
                name,
                update.account_type.map(|t| t.as_str()),
                balance_cents,
                currency,
                update.platform_name,
                id,
                user_id,
            ],
        )?;

        self.require_account(user_id, id)
    }

    /// Delete an account after re-checking the owner's password
    pub fn delete_account(&self, user_id: i64, id: i64, password: &str) -> Result<()> {
        self.require_account(user_id, id)?;

        let conn = self.conn()?;
        let stored: Option<String> = conn
            .query_row(
                "SELECT password_hash FROM users WHERE id = ?",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;

        match stored {
            Some(hash) if verify_password(password, &hash) => {}
            _ => return Err(Error::Unauthorized),
        }

        conn.execute(
            "DELETE FROM accounts WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;
        info!("Deleted account {} for user {}", id, user_id);
        Ok(())
    }

    /// Deposit money into an account
    pub fn add_money(&self, user_id: i64, id: i64, amount: Decimal) -> Result<Account> {
        let amount = round_cents(amount);
        if amount <= Decimal::ZERO || amount > MAX_ACCOUNT_AMOUNT {
            return Err(Error::Validation(format!(
                "Deposit must be greater than 0 and at most {}",
                MAX_ACCOUNT_AMOUNT
            )));
        }
        self.require_account(user_id, id)?;

        let conn = self.conn()?;
        conn.execute(
            "UPDATE accounts SET balance_cents = balance_cents + ? WHERE id = ? AND user_id = ?",
            params![to_cents(amount)?, id, user_id],
        )?;

        self.require_account(user_id, id)
    }

    /// Move money between two of the user's accounts atomically
    pub fn transfer(&self, user_id: i64, from_id: i64, to_id: i64, amount: Decimal) -> Result<()> {
        let amount = round_cents(amount);
        if amount <= Decimal::ZERO {
            return Err(Error::Validation("Transfer amount must be positive".into()));
        }
        if from_id == to_id {
            return Err(Error::Validation(
                "Cannot transfer to the same account".into(),
            ));
        }
        let cents = to_cents(amount)?;

        let conn = self.conn()?;
        conn.execute("BEGIN IMMEDIATE", [])?;

        let result: Result<()> = (|| {
            let balance_of = |id: i64| -> Result<i64> {
                conn.query_row(
                    "SELECT balance_cents FROM accounts WHERE id = ? AND user_id = ?",
                    params![id, user_id],
                    |row| row.get(0),
                )
                .optional()?
                .ok_or_else(|| Error::NotFound(format!("account {}", id)))
            };

            let from_balance = balance_of(from_id)?;
            balance_of(to_id)?;

            if from_balance < cents {
                return Err(Error::InsufficientFunds {
                    balance: from_cents(from_balance).to_string(),
                    required: amount.to_string(),
                });
            }

            conn.execute(
                "UPDATE accounts SET balance_cents = balance_cents - ? WHERE id = ?",
                params![cents, from_id],
            )?;
            conn.execute(
                "UPDATE accounts SET balance_cents = balance_cents + ? WHERE id = ?",
                params![cents, to_id],
            )?;
            Ok(())
        })();

        match result {
            Ok(()) => {
                super::commit(&conn)?;
                info!(
                    "Transferred {} from account {} to {} (user {})",
                    amount, from_id, to_id, user_id
                );
                Ok(())
            }
            Err(e) => {
                let _ = conn.execute("ROLLBACK", []);
                Err(e)
            }
        }
    }
}
