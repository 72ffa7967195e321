//! Fintrack CLI - Personal finance tracker
//!
//! Usage:
//!   fintrack init                                   Initialize database
//!   fintrack user register --name .. --email ..     Create a user
//!   fintrack import --user EMAIL --file CSV         Import a bank statement
//!   fintrack budgets status --user EMAIL            Budget vs. spending
//!   fintrack report monthly --user EMAIL            Monthly summary

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use fintrack_core::{models::TransactionUpdate, Config, HttpRateSource, RateCache};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = Config::load(cli.config.as_deref())?;

    if let Commands::Init = cli.command {
        return commands::cmd_init(&cli.db, cli.no_encrypt);
    }

    // Conversions need no database
    if let Commands::Rates {
        action: RatesAction::Convert { amount, from, to },
    } = &cli.command
    {
        let rates = RateCache::new(HttpRateSource::new(&config.rates)?, &config.rates);
        commands::cmd_rates_convert(&rates, *amount, from, to).await?;
        return Ok(());
    }

    let db = commands::open_db(&cli.db, cli.no_encrypt)?;

    match cli.command {
        Commands::Init => Ok(()),
        Commands::User { action } => match action {
            UserAction::Register {
                name,
                email,
                password,
            } => commands::cmd_user_register(&db, &name, &email, &password),
            UserAction::Login { email, password } => {
                commands::cmd_user_login(&db, &config.auth, &email, &password)
            }
            UserAction::Update {
                email,
                name,
                new_email,
            } => commands::cmd_user_update(&db, &email, name.as_deref(), new_email.as_deref()),
            UserAction::Password {
                email,
                old,
                new,
                confirm,
            } => commands::cmd_user_password(&db, &email, &old, &new, &confirm),
        },
        Commands::Accounts { action } => match action {
            AccountsAction::List { user } => commands::cmd_accounts_list(&db, &user),
            AccountsAction::Add {
                user,
                name,
                account_type,
                balance,
                currency,
                platform,
            } => commands::cmd_accounts_add(
                &db,
                &user,
                &name,
                &account_type,
                balance,
                &currency,
                platform.as_deref(),
            )
            .map(|_| ()),
            AccountsAction::Update {
                user,
                id,
                name,
                account_type,
                balance,
                currency,
                platform,
            } => commands::cmd_accounts_update(
                &db,
                &user,
                id,
                name,
                account_type.as_deref(),
                balance,
                currency,
                platform,
            ),
            AccountsAction::Delete { user, id, password } => {
                commands::cmd_accounts_delete(&db, &user, id, &password)
            }
            AccountsAction::Deposit { user, id, amount } => {
                commands::cmd_accounts_deposit(&db, &user, id, amount)
            }
            AccountsAction::Transfer {
                user,
                from,
                to,
                amount,
            } => commands::cmd_accounts_transfer(&db, &user, from, to, amount),
        },
        Commands::Categories { action } => match action {
            CategoriesAction::List { user } => commands::cmd_categories_list(&db, &user),
            CategoriesAction::Add { user, name, kind } => {
                commands::cmd_categories_add(&db, &user, &name, &kind).map(|_| ())
            }
            CategoriesAction::Update {
                user,
                id,
                name,
                kind,
            } => commands::cmd_categories_update(&db, &user, id, name.as_deref(), kind.as_deref()),
            CategoriesAction::Delete { user, id } => {
                commands::cmd_categories_delete(&db, &user, id)
            }
        },
        Commands::Transactions { action } => match action {
            TransactionsAction::List { user, limit } => {
                commands::cmd_transactions_list(&db, &user, limit)
            }
            TransactionsAction::Add {
                user,
                name,
                amount,
                date,
                category,
                description,
            } => commands::cmd_transactions_add(
                &db,
                &user,
                &name,
                amount,
                date,
                category,
                description,
            )
            .map(|_| ()),
            TransactionsAction::Show { user, id } => {
                commands::cmd_transactions_show(&db, &user, id)
            }
            TransactionsAction::Update {
                user,
                id,
                name,
                amount,
                category,
                description,
            } => commands::cmd_transactions_update(
                &db,
                &user,
                id,
                TransactionUpdate {
                    category_id: category,
                    name,
                    amount,
                    description,
                },
            ),
            TransactionsAction::Delete { user, id } => {
                commands::cmd_transactions_delete(&db, &user, id)
            }
        },
        Commands::Import {
            file,
            user,
            category,
            batch_size,
            json,
        } => commands::cmd_import(&db, &config, &file, &user, category, batch_size, json)
            .map(|_| ()),
        Commands::Budgets { action } => match action {
            BudgetsAction::Set {
                user,
                category,
                amount,
                month,
            } => commands::cmd_budgets_set(&db, &user, category, amount, &month).map(|_| ()),
            BudgetsAction::Repeat {
                user,
                category,
                amount,
                start,
                months,
            } => commands::cmd_budgets_repeat(&db, &user, category, amount, &start, months),
            BudgetsAction::Status { user, month } => {
                commands::cmd_budgets_status(&db, &user, month.as_deref())
            }
        },
        Commands::Report { report_type } => match report_type {
            ReportType::Monthly { user, month, json } => {
                commands::cmd_report_monthly(&db, &user, month.as_deref(), json)
            }
        },
        Commands::Rates { action } => match action {
            RatesAction::Convert { .. } => Ok(()),
            RatesAction::Total { user, base } => {
                let rates = RateCache::new(HttpRateSource::new(&config.rates)?, &config.rates);
                commands::cmd_rates_total(&db, &rates, &user, &base)
                    .await
                    .map(|_| ())
            }
        },
    }
}
