//! Category command implementations

use anyhow::Result;
use fintrack_core::{db::Database, models::CategoryKind};

use super::resolve_user;

fn parse_kind(s: &str) -> Result<CategoryKind> {
    s.parse().map_err(|e: String| anyhow::anyhow!(e))
}

pub fn cmd_categories_list(db: &Database, user: &str) -> Result<()> {
    let user = resolve_user(db, user)?;
    let categories = db.list_categories(user.id)?;

    if categories.is_empty() {
        println!("No categories yet. Add one with:");
        println!("  fintrack categories add --user {} Groceries", user.email);
        return Ok(());
    }

    println!();
    println!("🏷️  Categories");
    println!("   ─────────────────────────────────────────────────────────────");
    for category in categories {
        println!("   [{}] {:30} {}", category.id, category.name, category.kind);
    }
    Ok(())
}

pub fn cmd_categories_add(db: &Database, user: &str, name: &str, kind: &str) -> Result<i64> {
    let user = resolve_user(db, user)?;
    let id = db.create_category(user.id, name, parse_kind(kind)?)?;
    println!("✅ Created category '{}' (id {})", name.trim(), id);
    Ok(id)
}

pub fn cmd_categories_update(
    db: &Database,
    user: &str,
    id: i64,
    name: Option<&str>,
    kind: Option<&str>,
) -> Result<()> {
    let user = resolve_user(db, user)?;
    let kind = kind.map(parse_kind).transpose()?;
    let category = db.update_category(user.id, id, name, kind)?;
    println!(
        "✅ Updated category [{}] {} ({})",
        category.id, category.name, category.kind
    );
    Ok(())
}

pub fn cmd_categories_delete(db: &Database, user: &str, id: i64) -> Result<()> {
    let user = resolve_user(db, user)?;
    db.delete_category(user.id, id)?;
    println!("🗑️  Deleted category {}", id);
    Ok(())
}
