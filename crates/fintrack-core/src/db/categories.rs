//! Category operations

use rusqlite::{params, OptionalExtension, Row};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{Category, CategoryKind};

const CATEGORY_COLUMNS: &str = "id, user_id, name, kind, created_at, updated_at";

fn row_to_category(row: &Row) -> rusqlite::Result<Category> {
    let kind: String = row.get(3)?;
    let created_at: String = row.get(4)?;
    let updated_at: Option<String> = row.get(5)?;
    Ok(Category {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        kind: kind.parse().unwrap_or(CategoryKind::Expense),
        created_at: parse_datetime(&created_at),
        updated_at: updated_at.as_deref().map(parse_datetime),
    })
}

fn clean_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation("Category name cannot be empty".into()));
    }
    Ok(name.to_string())
}

impl Database {
    pub fn create_category(&self, user_id: i64, name: &str, kind: CategoryKind) -> Result<i64> {
        let name = clean_name(name)?;
        let conn = self.conn()?;

        let exists: Option<i64> = conn
            .query_row(
                "SELECT id FROM categories WHERE user_id = ? AND name = ?",
                params![user_id, name],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_some() {
            return Err(Error::Validation(format!(
                "Category '{}' already exists",
                name
            )));
        }

        conn.execute(
            "INSERT INTO categories (user_id, name, kind) VALUES (?, ?, ?)",
            params![user_id, name, kind.as_str()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn list_categories(&self, user_id: i64) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM categories WHERE user_id = ? ORDER BY kind, name",
            CATEGORY_COLUMNS
        ))?;

        let categories = stmt
            .query_map(params![user_id], row_to_category)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(categories)
    }

    pub fn get_category(&self, user_id: i64, id: i64) -> Result<Option<Category>> {
        let conn = self.conn()?;
        let category = conn
            .query_row(
                &format!(
                    "SELECT {} FROM categories WHERE id = ? AND user_id = ?",
                    CATEGORY_COLUMNS
                ),
                params![id, user_id],
                row_to_category,
            )
            .optional()?;
        Ok(category)
    }

    /// Rename and/or re-kind a category; stamps `updated_at`
    pub fn update_category(
        &self,
        user_id: i64,
        id: i64,
        name: Option<&str>,
        kind: Option<CategoryKind>,
    ) -> Result<Category> {
        if name.is_none() && kind.is_none() {
            return Err(Error::Validation("No changes were provided".into()));
        }
        let name = name.map(clean_name).transpose()?;

        let conn = self.conn()?;
        let changed = conn.execute(
            r#"
            UPDATE categories SET
                name = COALESCE(?, name),
                kind = COALESCE(?, kind),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ? AND user_id = ?
            "#,
            params![name, kind.map(|k| k.as_str()), id, user_id],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("category {}", id)));
        }

        self.get_category(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("category {}", id)))
    }

    /// Delete a category; its transactions keep their rows with no category
    pub fn delete_category(&self, user_id: i64, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "DELETE FROM categories WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("category {}", id)));
        }
        Ok(())
    }
}
