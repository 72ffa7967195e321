//! Monthly report data
//!
//! Everything a monthly statement shows, as numbers: the transactions, a
//! summary, a per-day series and per-category totals. Rendering is left to
//! the caller.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::db::Database;
use crate::error::Result;
use crate::models::Transaction;
use crate::money::round_cents;

/// Headline numbers for a month
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MonthlySummary {
    pub total: Decimal,
    pub average: Decimal,
    pub count: usize,
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
}

/// Net movement on one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    /// `None` for uncategorized transactions
    pub category: Option<String>,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyReport {
    pub user_id: i64,
    pub year: i32,
    pub month: u32,
    pub transactions: Vec<Transaction>,
    pub summary: MonthlySummary,
    pub daily: Vec<DailyTotal>,
    /// Day with the largest absolute net movement
    pub busiest_day: Option<DailyTotal>,
    pub categories: Vec<CategoryTotal>,
}

impl MonthlyReport {
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

/// Summary statistics over a set of transactions
pub fn summarize(transactions: &[Transaction]) -> MonthlySummary {
    if transactions.is_empty() {
        return MonthlySummary::default();
    }

    let amounts: Vec<Decimal> = transactions.iter().map(|t| t.amount).collect();
    let total: Decimal = amounts.iter().sum();
    let count = amounts.len();

    MonthlySummary {
        total: round_cents(total),
        average: round_cents(total / Decimal::from(count)),
        count,
        min: amounts.iter().min().copied(),
        max: amounts.iter().max().copied(),
    }
}

/// Net amount per day, in date order
pub fn daily_totals(transactions: &[Transaction]) -> Vec<DailyTotal> {
    let mut by_day: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for tx in transactions {
        *by_day.entry(tx.transaction_date).or_default() += tx.amount;
    }
    by_day
        .into_iter()
        .map(|(date, total)| DailyTotal {
            date,
            total: round_cents(total),
        })
        .collect()
}

/// The day whose net movement is largest in absolute terms; earliest wins ties
pub fn busiest_day(daily: &[DailyTotal]) -> Option<DailyTotal> {
    daily
        .iter()
        .fold(None::<&DailyTotal>, |best, day| match best {
            Some(b) if b.total.abs() >= day.total.abs() => Some(b),
            _ => Some(day),
        })
        .cloned()
}

/// Build the report for one user and month
pub fn monthly_report(db: &Database, user_id: i64, year: i32, month: u32) -> Result<MonthlyReport> {
    let transactions = db.transactions_in_month(user_id, year, month)?;
    let categories = db
        .category_totals(user_id, year, month)?
        .into_iter()
        .map(|(category, total)| CategoryTotal { category, total })
        .collect();

    let summary = summarize(&transactions);
    let daily = daily_totals(&transactions);
    let busiest_day = busiest_day(&daily);

    Ok(MonthlyReport {
        user_id,
        year,
        month,
        transactions,
        summary,
        daily,
        busiest_day,
        categories,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryKind, NewTransaction};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn tx(day: u32, amount: &str) -> Transaction {
        Transaction {
            id: 0,
            user_id: 1,
            category_id: None,
            name: "t".into(),
            amount: dec(amount),
            description: None,
            transaction_date: date(day),
            balance: Decimal::ZERO,
            fingerprint: None,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_summarize() {
        let txs = vec![tx(1, "-10.00"), tx(2, "100.00"), tx(2, "-25.00")];
        let summary = summarize(&txs);

        assert_eq!(summary.total, dec("65.00"));
        assert_eq!(summary.average, dec("21.67"));
        assert_eq!(summary.count, 3);
        assert_eq!(summary.min, Some(dec("-25.00")));
        assert_eq!(summary.max, Some(dec("100.00")));
    }

    #[test]
    fn test_summarize_empty() {
        assert_eq!(summarize(&[]), MonthlySummary::default());
    }

    #[test]
    fn test_daily_totals_and_busiest_day() {
        let txs = vec![tx(3, "-10.00"), tx(1, "50.00"), tx(3, "-80.00"), tx(2, "5.00")];
        let daily = daily_totals(&txs);

        assert_eq!(
            daily,
            vec![
                DailyTotal { date: date(1), total: dec("50.00") },
                DailyTotal { date: date(2), total: dec("5.00") },
                DailyTotal { date: date(3), total: dec("-90.00") },
            ]
        );
        assert_eq!(busiest_day(&daily).map(|d| d.date), Some(date(3)));
        assert_eq!(busiest_day(&[]), None);
    }

    #[test]
    fn test_monthly_report_from_db() {
        let db = Database::in_memory().unwrap();
        let user = db.create_user("Alice Smith", "alice@example.com", "x").unwrap();
        let food = db.create_category(user, "Food", CategoryKind::Expense).unwrap();

        let add = |day: u32, amount: &str, category: Option<i64>| {
            db.register_transaction(&NewTransaction {
                user_id: user,
                category_id: category,
                name: "entry".into(),
                amount: dec(amount),
                description: None,
                transaction_date: date(day),
                balance: Decimal::ZERO,
                fingerprint: None,
            })
            .unwrap();
        };
        add(5, "-20.00", Some(food));
        add(6, "-30.00", Some(food));
        add(7, "1000.00", None);
        // Outside the month
        db.register_transaction(&NewTransaction {
            user_id: user,
            category_id: Some(food),
            name: "april".into(),
            amount: dec("-99.00"),
            description: None,
            transaction_date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            balance: Decimal::ZERO,
            fingerprint: None,
        })
        .unwrap();

        let report = monthly_report(&db, user, 2024, 3).unwrap();
        assert_eq!(report.transactions.len(), 3);
        assert_eq!(report.summary.total, dec("950.00"));
        assert_eq!(report.busiest_day.map(|d| d.date), Some(date(7)));
        assert_eq!(
            report.categories,
            vec![
                CategoryTotal { category: Some("Food".into()), total: dec("-50.00") },
                CategoryTotal { category: None, total: dec("1000.00") },
            ]
        );
    }
}
