//! Currency conversion commands

use anyhow::Result;
use fintrack_core::{db::Database, RateCache, RateSource};
use rust_decimal::Decimal;

use super::{resolve_user, truncate};

pub async fn cmd_rates_convert<S: RateSource>(
    rates: &RateCache<S>,
    amount: Decimal,
    from: &str,
    to: &str,
) -> Result<Decimal> {
    let converted = rates.convert(amount, from, to).await?;
    println!(
        "💱 {:.2} {} = {:.2} {}",
        amount,
        from.to_uppercase(),
        converted,
        to.to_uppercase()
    );
    Ok(converted)
}

pub async fn cmd_rates_total<S: RateSource>(
    db: &Database,
    rates: &RateCache<S>,
    user: &str,
    base: &str,
) -> Result<Decimal> {
    let user = resolve_user(db, user)?;
    let accounts = db.list_accounts(user.id)?;
    if accounts.is_empty() {
        println!("No accounts found.");
        return Ok(Decimal::ZERO);
    }

    let total = rates.convert_accounts(&accounts, base).await?;

    println!();
    println!("💱 Account balances in {}", total.base);
    println!("   ─────────────────────────────────────────────────────────────");
    for account in &total.accounts {
        println!(
            "   [{}] {:24} │ {:>14.2} {} │ {:>14.2} {}",
            account.account_id,
            truncate(&account.name, 24),
            account.balance,
            account.currency,
            account.converted,
            total.base
        );
    }
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Total: {:.2} {}", total.total, total.base);

    Ok(total.total)
}
