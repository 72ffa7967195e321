//! User operations

use rusqlite::{params, OptionalExtension, Row};

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::User;

const USER_COLUMNS: &str = "id, name, email, created_at";

fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    let created_at: String = row.get(3)?;
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        created_at: parse_datetime(&created_at),
    })
}

impl Database {
    /// Insert a user row; the caller validates fields and hashes the password
    pub fn create_user(&self, name: &str, email: &str, password_hash: &str) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users (name, email, password_hash) VALUES (?, ?, ?)",
            params![name, email, password_hash],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
                params![id],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS),
                params![email],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    /// User plus stored password hash, for credential checks
    pub fn get_user_credentials(&self, email: &str) -> Result<Option<(User, String)>> {
        let conn = self.conn()?;
        let found = conn
            .query_row(
                &format!(
                    "SELECT {}, password_hash FROM users WHERE email = ?",
                    USER_COLUMNS
                ),
                params![email],
                |row| Ok((row_to_user(row)?, row.get::<_, String>(4)?)),
            )
            .optional()?;
        Ok(found)
    }

    /// Update name and/or email (`None` keeps the current value)
    pub fn update_user(&self, id: i64, name: Option<&str>, email: Option<&str>) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE users SET name = COALESCE(?, name), email = COALESCE(?, email) WHERE id = ?",
            params![name, email, id],
        )?;
        Ok(())
    }

    pub fn set_password_hash(&self, id: i64, password_hash: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE users SET password_hash = ? WHERE id = ?",
            params![password_hash, id],
        )?;
        Ok(())
    }
}
