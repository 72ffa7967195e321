//! Account command implementations

use anyhow::Result;
use fintrack_core::{
    db::Database,
    models::{AccountType, AccountUpdate, NewAccount},
};
use rust_decimal::Decimal;

use super::{resolve_user, truncate};

fn parse_type(s: &str) -> Result<AccountType> {
    s.parse().map_err(|e: String| anyhow::anyhow!(e))
}

pub fn cmd_accounts_list(db: &Database, user: &str) -> Result<()> {
    let user = resolve_user(db, user)?;
    let accounts = db.list_accounts(user.id)?;

    if accounts.is_empty() {
        println!("No accounts found. Add one with:");
        println!("  fintrack accounts add --user {} --name Checking", user.email);
        return Ok(());
    }

    println!();
    println!("🏦 Accounts");
    println!("   ─────────────────────────────────────────────────────────────");

    for account in accounts {
        println!(
            "   [{}] {:24} │ {:18} │ {:>14.2} {} {}",
            account.id,
            truncate(&account.name, 24),
            account.account_type,
            account.balance,
            account.currency,
            account
                .platform_name
                .map(|p| format!("({})", p))
                .unwrap_or_default()
        );
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_accounts_add(
    db: &Database,
    user: &str,
    name: &str,
    account_type: &str,
    balance: Decimal,
    currency: &str,
    platform: Option<&str>,
) -> Result<i64> {
    let user = resolve_user(db, user)?;
    let account = NewAccount {
        name: name.to_string(),
        account_type: parse_type(account_type)?,
        balance,
        currency: currency.to_string(),
        platform_name: platform.map(str::to_string),
    };

    let id = db.add_account(user.id, &account)?;
    println!("✅ Added account '{}' (id {})", name.trim(), id);
    Ok(id)
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_accounts_update(
    db: &Database,
    user: &str,
    id: i64,
    name: Option<String>,
    account_type: Option<&str>,
    balance: Option<Decimal>,
    currency: Option<String>,
    platform: Option<String>,
) -> Result<()> {
    let user = resolve_user(db, user)?;
    let update = AccountUpdate {
        name,
        account_type: account_type.map(parse_type).transpose()?,
        balance,
        currency,
        platform_name: platform,
    };

    let account = db.update_account(user.id, id, &update)?;
    println!(
        "✅ Updated account [{}] {} │ {} │ {:.2} {}",
        account.id, account.name, account.account_type, account.balance, account.currency
    );
    Ok(())
}

pub fn cmd_accounts_delete(db: &Database, user: &str, id: i64, password: &str) -> Result<()> {
    let user = resolve_user(db, user)?;
    db.delete_account(user.id, id, password)?;
    println!("🗑️  Deleted account {}", id);
    Ok(())
}

pub fn cmd_accounts_deposit(db: &Database, user: &str, id: i64, amount: Decimal) -> Result<()> {
    let user = resolve_user(db, user)?;
    let account = db.add_money(user.id, id, amount)?;
    println!(
        "💰 Deposited {:.2} into '{}'. New balance: {:.2} {}",
        amount, account.name, account.balance, account.currency
    );
    Ok(())
}

pub fn cmd_accounts_transfer(
    db: &Database,
    user: &str,
    from: i64,
    to: i64,
    amount: Decimal,
) -> Result<()> {
    let user = resolve_user(db, user)?;
    db.transfer(user.id, from, to, amount)?;
    println!("🔁 Transferred {:.2} from account {} to account {}", amount, from, to);
    Ok(())
}
