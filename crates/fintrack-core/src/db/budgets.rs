//! Budget operations

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rusqlite::{params, OptionalExtension, Row};

use super::Database;
use crate::error::{Error, Result};
use crate::models::{Budget, BudgetStatus};
use crate::money::{from_cents, to_cents};

fn row_to_budget(row: &Row) -> rusqlite::Result<Budget> {
    Ok(Budget {
        id: row.get(0)?,
        user_id: row.get(1)?,
        category_id: row.get(2)?,
        amount: from_cents(row.get(3)?),
        month: row.get(4)?,
        year: row.get(5)?,
    })
}

/// First day of the month and first day of the following month
pub(crate) fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| Error::Validation(format!("Invalid month: {}-{}", year, month)))?;
    let (next_year, next_month) = next_month(year, month);
    let end = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .ok_or_else(|| Error::Validation(format!("Invalid month: {}-{}", year, month)))?;
    Ok((start, end))
}

/// The month after `(year, month)`, rolling December into January
pub fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month >= 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

fn validate(amount: Decimal, month: u32) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(Error::Validation("Budget amount must be positive".into()));
    }
    if !(1..=12).contains(&month) {
        return Err(Error::Validation(format!(
            "Month must be between 1 and 12, got {}",
            month
        )));
    }
    Ok(())
}

impl Database {
    fn require_user_category(&self, user_id: i64, category_id: i64) -> Result<()> {
        if self.get_category(user_id, category_id)?.is_none() {
            return Err(Error::NotFound(format!("category {}", category_id)));
        }
        Ok(())
    }

    /// Set (or replace) the budget for one category and month
    pub fn set_budget(
        &self,
        user_id: i64,
        category_id: i64,
        amount: Decimal,
        month: u32,
        year: i32,
    ) -> Result<i64> {
        validate(amount, month)?;
        self.require_user_category(user_id, category_id)?;

        let conn = self.conn()?;
        let id = conn.query_row(
            r#"
            INSERT INTO budgets (user_id, category_id, amount_cents, month, year)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(user_id, category_id, year, month)
                DO UPDATE SET amount_cents = excluded.amount_cents
            RETURNING id
            "#,
            params![user_id, category_id, to_cents(amount)?, month, year],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Set the same budget for `months` consecutive months starting at the given one
    pub fn repeat_budget(
        &self,
        user_id: i64,
        category_id: i64,
        amount: Decimal,
        start_month: u32,
        start_year: i32,
        months: u32,
    ) -> Result<Vec<i64>> {
        validate(amount, start_month)?;
        if months == 0 {
            return Err(Error::Validation("Repeat count must be at least 1".into()));
        }

        let mut ids = Vec::with_capacity(months as usize);
        let (mut year, mut month) = (start_year, start_month);
        for _ in 0..months {
            ids.push(self.set_budget(user_id, category_id, amount, month, year)?);
            (year, month) = next_month(year, month);
        }
        Ok(ids)
    }

    pub fn get_budget(
        &self,
        user_id: i64,
        category_id: i64,
        year: i32,
        month: u32,
    ) -> Result<Option<Budget>> {
        let conn = self.conn()?;
        let budget = conn
            .query_row(
                r#"
                SELECT id, user_id, category_id, amount_cents, month, year FROM budgets
                WHERE user_id = ? AND category_id = ? AND year = ? AND month = ?
                "#,
                params![user_id, category_id, year, month],
                row_to_budget,
            )
            .optional()?;
        Ok(budget)
    }

    pub fn list_budgets(&self, user_id: i64, year: i32, month: u32) -> Result<Vec<Budget>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, user_id, category_id, amount_cents, month, year FROM budgets
            WHERE user_id = ? AND year = ? AND month = ?
            ORDER BY category_id
            "#,
        )?;
        let budgets = stmt
            .query_map(params![user_id, year, month], row_to_budget)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(budgets)
    }

    /// Budget vs. spending for every budgeted category in a month
    pub fn budget_status(&self, user_id: i64, year: i32, month: u32) -> Result<Vec<BudgetStatus>> {
        let (start, end) = month_bounds(year, month)?;
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT b.category_id, c.name, b.amount_cents,
                   COALESCE((
                       SELECT -SUM(t.amount_cents) FROM transactions t
                       WHERE t.user_id = b.user_id
                         AND t.category_id = b.category_id
                         AND t.amount_cents < 0
                         AND t.transaction_date >= ? AND t.transaction_date < ?
                   ), 0)
            FROM budgets b
            JOIN categories c ON c.id = b.category_id
            WHERE b.user_id = ? AND b.year = ? AND b.month = ?
            ORDER BY c.name
            "#,
        )?;

        let statuses = stmt
            .query_map(
                params![
                    start.format("%Y-%m-%d").to_string(),
                    end.format("%Y-%m-%d").to_string(),
                    user_id,
                    year,
                    month
                ],
                |row| {
                    let budget = from_cents(row.get(2)?);
                    let spent = from_cents(row.get(3)?);
                    Ok(BudgetStatus {
                        category_id: row.get(0)?,
                        category_name: row.get(1)?,
                        budget,
                        spent,
                        remaining: budget - spent,
                    })
                },
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(statuses)
    }
}
