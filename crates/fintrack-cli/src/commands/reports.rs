//! Report command implementations

use anyhow::Result;
use fintrack_core::{db::Database, reports::monthly_report};

use super::{format_amount, month_or_current, resolve_user};

pub fn cmd_report_monthly(db: &Database, user: &str, month: Option<&str>, json: bool) -> Result<()> {
    let user = resolve_user(db, user)?;
    let (year, month) = month_or_current(month)?;
    let report = monthly_report(db, user.id, year, month)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    println!("📅 Monthly Report: {}-{:02}", year, month);
    println!("   ─────────────────────────────────────────────────────────────");

    if report.is_empty() {
        println!("   No transactions this month.");
        return Ok(());
    }

    let summary = &report.summary;
    println!("   Transactions: {}", summary.count);
    println!("   Net total:    {}", format_amount(summary.total));
    println!("   Average:      {}", format_amount(summary.average));
    if let (Some(min), Some(max)) = (summary.min, summary.max) {
        println!("   Largest out:  {}", format_amount(min));
        println!("   Largest in:   {}", format_amount(max));
    }
    if let Some(day) = &report.busiest_day {
        println!("   Busiest day:  {} ({})", day.date, format_amount(day.total));
    }

    println!();
    println!("   By category:");
    for category in &report.categories {
        println!(
            "   {:24} │ {:>20}",
            category.category.as_deref().unwrap_or("(uncategorized)"),
            format_amount(category.total)
        );
    }

    println!();
    println!("   Daily:");
    for day in &report.daily {
        println!("   {} │ {:>20}", day.date, format_amount(day.total));
    }

    Ok(())
}
