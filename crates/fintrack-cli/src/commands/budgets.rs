//! Budget command implementations

use anyhow::Result;
use fintrack_core::db::Database;
use rust_decimal::Decimal;

use super::{month_or_current, parse_month, resolve_user, truncate};

pub fn cmd_budgets_set(
    db: &Database,
    user: &str,
    category: i64,
    amount: Decimal,
    month: &str,
) -> Result<i64> {
    let user = resolve_user(db, user)?;
    let (year, month) = parse_month(month)?;
    let id = db.set_budget(user.id, category, amount, month, year)?;
    println!(
        "✅ Budget for category {} in {}-{:02} set to {:.2}",
        category, year, month, amount
    );
    Ok(id)
}

pub fn cmd_budgets_repeat(
    db: &Database,
    user: &str,
    category: i64,
    amount: Decimal,
    start: &str,
    months: u32,
) -> Result<()> {
    let user = resolve_user(db, user)?;
    let (year, month) = parse_month(start)?;
    let ids = db.repeat_budget(user.id, category, amount, month, year, months)?;
    println!(
        "✅ Budget of {:.2} set for {} months starting {}-{:02}",
        amount,
        ids.len(),
        year,
        month
    );
    Ok(())
}

pub fn cmd_budgets_status(db: &Database, user: &str, month: Option<&str>) -> Result<()> {
    let user = resolve_user(db, user)?;
    let (year, month) = month_or_current(month)?;
    let statuses = db.budget_status(user.id, year, month)?;

    if statuses.is_empty() {
        println!("No budgets set for {}-{:02}.", year, month);
        return Ok(());
    }

    println!();
    println!("📊 Budgets for {}-{:02}", year, month);
    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   {:20} │ {:>10} │ {:>10} │ {:>10}",
        "Category", "Budget", "Spent", "Remaining"
    );

    let mut over = 0;
    for status in &statuses {
        let flag = if status.is_over() {
            over += 1;
            " ⚠️"
        } else {
            ""
        };
        println!(
            "   {:20} │ {:>10.2} │ {:>10.2} │ {:>10.2}{}",
            truncate(&status.category_name, 20),
            status.budget,
            status.spent,
            status.remaining,
            flag
        );
    }

    if over > 0 {
        println!();
        println!("   {} categor{} over budget", over, if over == 1 { "y" } else { "ies" });
    }

    Ok(())
}
