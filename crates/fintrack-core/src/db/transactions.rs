//! Transaction operations

use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use super::{parse_date, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::import::{InsertOutcome, TransactionStore};
use crate::models::{NewTransaction, Transaction, TransactionUpdate};
use crate::money::{from_cents, to_cents};

pub(crate) const TRANSACTION_COLUMNS: &str = "id, user_id, category_id, name, amount_cents, \
     description, transaction_date, balance_cents, fingerprint, created_at";

pub(crate) fn row_to_transaction(row: &Row) -> rusqlite::Result<Transaction> {
    let date: String = row.get(6)?;
    let created_at: String = row.get(9)?;
    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        category_id: row.get(2)?,
        name: row.get(3)?,
        amount: from_cents(row.get(4)?),
        description: row.get(5)?,
        transaction_date: parse_date(6, &date)?,
        balance: from_cents(row.get(7)?),
        fingerprint: row.get(8)?,
        created_at: parse_datetime(&created_at),
    })
}

/// Insert one row, absorbing only a conflict on the dedup key
///
/// Returns the number of rows written (0 or 1). Any other failure, such as
/// an unknown category, is returned as an error.
fn insert_row(conn: &Connection, tx: &NewTransaction) -> Result<usize> {
    let written = conn.execute(
        r#"
        INSERT INTO transactions
            (user_id, category_id, name, amount_cents, description, transaction_date, balance_cents, fingerprint)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(user_id, fingerprint) DO NOTHING
        "#,
        params![
            tx.user_id,
            tx.category_id,
            tx.name,
            to_cents(tx.amount)?,
            tx.description,
            tx.transaction_date.format("%Y-%m-%d").to_string(),
            to_cents(tx.balance)?,
            tx.fingerprint,
        ],
    )?;
    Ok(written)
}

impl Database {
    /// Record a manually entered transaction (no fingerprint, never deduplicated)
    pub fn register_transaction(&self, tx: &NewTransaction) -> Result<i64> {
        if tx.name.trim().is_empty() {
            return Err(Error::Validation("Transaction name cannot be empty".into()));
        }
        let manual = NewTransaction {
            fingerprint: None,
            ..tx.clone()
        };

        let conn = self.conn()?;
        insert_row(&conn, &manual)?;
        Ok(conn.last_insert_rowid())
    }

    /// List a user's transactions, newest first
    pub fn list_transactions(&self, user_id: i64, limit: Option<i64>) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions WHERE user_id = ? \
             ORDER BY transaction_date DESC, id DESC LIMIT ?",
            TRANSACTION_COLUMNS
        ))?;

        let transactions = stmt
            .query_map(params![user_id, limit.unwrap_or(-1)], row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    pub fn get_transaction(&self, user_id: i64, id: i64) -> Result<Option<Transaction>> {
        let conn = self.conn()?;
        let tx = conn
            .query_row(
                &format!(
                    "SELECT {} FROM transactions WHERE id = ? AND user_id = ?",
                    TRANSACTION_COLUMNS
                ),
                params![id, user_id],
                row_to_transaction,
            )
            .optional()?;
        Ok(tx)
    }

    /// Apply a partial update (category, name, amount, description)
    pub fn update_transaction(
        &self,
        user_id: i64,
        id: i64,
        update: &TransactionUpdate,
    ) -> Result<Transaction> {
        if update.is_empty() {
            return Err(Error::Validation("No changes were provided".into()));
        }
        if matches!(update.name.as_deref(), Some(n) if n.trim().is_empty()) {
            return Err(Error::Validation("Transaction name cannot be empty".into()));
        }
        let amount_cents = update.amount.map(to_cents).transpose()?;

        let conn = self.conn()?;
        let changed = conn.execute(
            r#"
            UPDATE transactions SET
                category_id = COALESCE(?, category_id),
                name = COALESCE(?, name),
                amount_cents = COALESCE(?, amount_cents),
                description = COALESCE(?, description)
            WHERE id = ? AND user_id = ?
            "#,
            params![
                update.category_id,
                update.name.as_deref().map(str::trim),
                amount_cents,
                update.description,
                id,
                user_id,
            ],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("transaction {}", id)));
        }

        self.get_transaction(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("transaction {}", id)))
    }

    pub fn delete_transaction(&self, user_id: i64, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "DELETE FROM transactions WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("transaction {}", id)));
        }
        Ok(())
    }

    /// Count a user's stored transactions
    pub fn count_transactions(&self, user_id: i64) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE user_id = ?",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

impl TransactionStore for Database {
    fn insert_transaction(&self, tx: &NewTransaction) -> Result<InsertOutcome> {
        let conn = self.conn()?;
        if insert_row(&conn, tx)? == 0 {
            return Ok(InsertOutcome::Duplicate);
        }
        Ok(InsertOutcome::Inserted(conn.last_insert_rowid()))
    }

    fn insert_batch(&self, txs: &[NewTransaction]) -> Result<usize> {
        if txs.is_empty() {
            return Ok(0);
        }

        let conn = self.conn()?;
        conn.execute("BEGIN IMMEDIATE", [])?;

        let result: Result<usize> = (|| {
            let mut inserted = 0;
            for tx in txs {
                inserted += insert_row(&conn, tx)?;
            }
            Ok(inserted)
        })();

        match result {
            Ok(inserted) => {
                super::commit(&conn)?;
                debug!("Batch of {} rows stored, {} new", txs.len(), inserted);
                Ok(inserted)
            }
            Err(e) => {
                let _ = conn.execute("ROLLBACK", []);
                Err(e)
            }
        }
    }
}
