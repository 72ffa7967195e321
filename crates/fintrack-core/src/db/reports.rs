//! Report queries

use rust_decimal::Decimal;
use rusqlite::params;

use super::budgets::month_bounds;
use super::transactions::{row_to_transaction, TRANSACTION_COLUMNS};
use super::Database;
use crate::error::Result;
use crate::models::Transaction;
use crate::money::from_cents;

impl Database {
    /// A user's transactions within one calendar month, oldest first
    pub fn transactions_in_month(
        &self,
        user_id: i64,
        year: i32,
        month: u32,
    ) -> Result<Vec<Transaction>> {
        let (start, end) = month_bounds(year, month)?;
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions \
             WHERE user_id = ? AND transaction_date >= ? AND transaction_date < ? \
             ORDER BY transaction_date, id",
            TRANSACTION_COLUMNS
        ))?;

        let transactions = stmt
            .query_map(
                params![
                    user_id,
                    start.format("%Y-%m-%d").to_string(),
                    end.format("%Y-%m-%d").to_string()
                ],
                row_to_transaction,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    /// Net amount per category for a month; uncategorized rows come back as `None`
    pub fn category_totals(
        &self,
        user_id: i64,
        year: i32,
        month: u32,
    ) -> Result<Vec<(Option<String>, Decimal)>> {
        let (start, end) = month_bounds(year, month)?;
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT c.name, SUM(t.amount_cents) AS total
            FROM transactions t
            LEFT JOIN categories c ON c.id = t.category_id
            WHERE t.user_id = ? AND t.transaction_date >= ? AND t.transaction_date < ?
            GROUP BY t.category_id
            ORDER BY total
            "#,
        )?;

        let totals = stmt
            .query_map(
                params![
                    user_id,
                    start.format("%Y-%m-%d").to_string(),
                    end.format("%Y-%m-%d").to_string()
                ],
                |row| Ok((row.get::<_, Option<String>>(0)?, from_cents(row.get(1)?))),
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(totals)
    }
}
