//! Transaction command implementations

use anyhow::{bail, Result};
use chrono::{Local, NaiveDate};
use fintrack_core::{
    db::Database,
    models::{NewTransaction, TransactionUpdate},
};
use rust_decimal::Decimal;

use super::{format_amount, resolve_user, truncate};

pub fn cmd_transactions_list(db: &Database, user: &str, limit: i64) -> Result<()> {
    let user = resolve_user(db, user)?;
    let transactions = db.list_transactions(user.id, Some(limit))?;

    if transactions.is_empty() {
        println!("No transactions found. Import some with:");
        println!("  fintrack import --user {} --file statement.csv", user.email);
        return Ok(());
    }

    println!();
    println!("📝 Recent Transactions");
    println!("   ─────────────────────────────────────────────────────────────");

    for tx in transactions {
        println!(
            "   [{}] {} │ {:>20} │ {}",
            tx.id,
            tx.transaction_date,
            format_amount(tx.amount),
            truncate(tx.description.as_deref().unwrap_or(&tx.name), 40)
        );
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_transactions_add(
    db: &Database,
    user: &str,
    name: &str,
    amount: Decimal,
    date: Option<NaiveDate>,
    category: Option<i64>,
    description: Option<String>,
) -> Result<i64> {
    let user = resolve_user(db, user)?;
    if let Some(id) = category {
        if db.get_category(user.id, id)?.is_none() {
            bail!("Category {} not found", id);
        }
    }

    let id = db.register_transaction(&NewTransaction {
        user_id: user.id,
        category_id: category,
        name: name.trim().to_string(),
        amount,
        description,
        transaction_date: date.unwrap_or_else(|| Local::now().date_naive()),
        balance: Decimal::ZERO,
        fingerprint: None,
    })?;

    println!("✅ Recorded transaction {} ({})", id, format_amount(amount));
    Ok(id)
}

pub fn cmd_transactions_show(db: &Database, user: &str, id: i64) -> Result<()> {
    let user = resolve_user(db, user)?;
    let tx = db
        .get_transaction(user.id, id)?
        .ok_or_else(|| anyhow::anyhow!("Transaction {} not found", id))?;

    let category = match tx.category_id {
        Some(cid) => db
            .get_category(user.id, cid)?
            .map(|c| c.name)
            .unwrap_or_else(|| cid.to_string()),
        None => "-".to_string(),
    };

    println!();
    println!("📄 Transaction {}", tx.id);
    println!("   Date:        {}", tx.transaction_date);
    println!("   Name:        {}", tx.name);
    println!("   Amount:      {}", format_amount(tx.amount));
    println!("   Description: {}", tx.description.as_deref().unwrap_or("-"));
    println!("   Category:    {}", category);
    println!("   Balance:     {:.2}", tx.balance);
    println!(
        "   Source:      {}",
        if tx.fingerprint.is_some() { "import" } else { "manual" }
    );
    Ok(())
}

pub fn cmd_transactions_update(
    db: &Database,
    user: &str,
    id: i64,
    update: TransactionUpdate,
) -> Result<()> {
    let user = resolve_user(db, user)?;
    if let Some(cid) = update.category_id {
        if db.get_category(user.id, cid)?.is_none() {
            bail!("Category {} not found", cid);
        }
    }

    let tx = db.update_transaction(user.id, id, &update)?;
    println!(
        "✅ Updated transaction {} │ {} │ {}",
        tx.id,
        tx.name,
        format_amount(tx.amount)
    );
    Ok(())
}

pub fn cmd_transactions_delete(db: &Database, user: &str, id: i64) -> Result<()> {
    let user = resolve_user(db, user)?;
    db.delete_transaction(user.id, id)?;
    println!("🗑️  Deleted transaction {}", id);
    Ok(())
}
