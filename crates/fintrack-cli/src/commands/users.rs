//! User command implementations

use anyhow::Result;
use fintrack_core::{auth, config::AuthConfig, db::Database, LoginLimiter};

pub fn cmd_user_register(db: &Database, name: &str, email: &str, password: &str) -> Result<()> {
    let user = auth::register(db, name, email, password)?;
    println!("✅ Registered {} <{}> (id {})", user.name, user.email, user.id);
    Ok(())
}

pub fn cmd_user_login(
    db: &Database,
    config: &AuthConfig,
    email: &str,
    password: &str,
) -> Result<()> {
    let limiter = LoginLimiter::new(config);
    let user = auth::login(db, &limiter, email, password)?;
    println!("✅ Welcome back, {}!", user.name);
    println!("   Member since {}", user.created_at.format("%Y-%m-%d"));
    Ok(())
}

pub fn cmd_user_update(
    db: &Database,
    email: &str,
    name: Option<&str>,
    new_email: Option<&str>,
) -> Result<()> {
    let user = auth::update_user_info(db, email, name, new_email)?;
    println!("✅ Updated profile: {} <{}>", user.name, user.email);
    Ok(())
}

pub fn cmd_user_password(
    db: &Database,
    email: &str,
    old: &str,
    new: &str,
    confirm: &str,
) -> Result<()> {
    auth::update_password(db, email, old, new, confirm)?;
    println!("🔑 Password updated");
    Ok(())
}
