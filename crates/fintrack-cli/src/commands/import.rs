//! Statement import command

use std::path::Path;

use anyhow::{bail, Context, Result};
use fintrack_core::{
    config::Config,
    db::Database,
    import::{read_upload, ImportOptions, ImportSummary, Importer},
};
use tracing::info;

use super::resolve_user;

/// `--json` rendering of an import summary
pub fn summary_json(summary: &ImportSummary) -> Result<String> {
    Ok(serde_json::to_string_pretty(summary)?)
}

pub fn cmd_import(
    db: &Database,
    config: &Config,
    file: &Path,
    user: &str,
    category: Option<i64>,
    batch_size: Option<usize>,
    json: bool,
) -> Result<ImportSummary> {
    let user = resolve_user(db, user)?;
    let category_id = category.unwrap_or(config.import.default_category_id);
    if db.get_category(user.id, category_id)?.is_none() {
        bail!(
            "Category {} not found for {}. Create one with: fintrack categories add --user {} <name>",
            category_id,
            user.email,
            user.email
        );
    }

    let content = read_upload(file, config.import.max_upload_bytes)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let mut options = ImportOptions::from(&config.import);
    if let Some(size) = batch_size {
        options.batch_size = size;
    }

    if !json {
        println!("📥 Importing {} for {}...", file.display(), user.email);
    }

    let summary = Importer::new(db, options).import(content.as_bytes(), user.id, category_id)?;
    info!(
        imported = summary.imported,
        duplicates = summary.duplicates,
        errors = summary.errors,
        "Import finished"
    );

    if json {
        println!("{}", summary_json(&summary)?);
        return Ok(summary);
    }

    println!();
    println!("✅ Import complete!");
    println!("   Imported:   {} new transactions", summary.imported);
    println!("   Duplicates: {} already stored", summary.duplicates);
    println!("   Total:      {} rows accepted", summary.total);
    if summary.errors > 0 {
        println!("   Errors:     {} rows skipped", summary.errors);
        for message in &summary.error_messages {
            println!("      • {}", message);
        }
        if summary.errors_truncated {
            println!(
                "      ... and {} more",
                summary.errors - summary.error_messages.len()
            );
        }
    }
    if summary.cancelled {
        println!("   ⚠️  Import stopped early; re-run to pick up the remaining rows");
    }

    Ok(summary)
}
