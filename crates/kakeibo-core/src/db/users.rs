//! User provisioning operations
//!
//! Profiles are owned by the external identity provider; this module only
//! keeps a local row per user so writes can be attributed. Provisioning is
//! lazy: the row is created on the first authenticated action.

use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::User;

impl Database {
    /// Get a user by ID
    pub fn get_user(&self, id: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT id, email, name, provider, created_at FROM users WHERE id = ?")?;

        let user = stmt.query_row(params![id], Self::row_to_user).optional()?;

        Ok(user)
    }

    /// Return the user row, creating a placeholder profile if absent.
    ///
    /// The real profile (email, display name) comes from the identity
    /// provider; until session integration lands, absent rows get a
    /// provisional profile derived from the id.
    pub fn ensure_user(&self, user_id: &str) -> Result<User> {
        if let Some(existing) = self.get_user(user_id)? {
            return Ok(existing);
        }

        let conn = self.conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO users (id, email, name, provider, created_at) VALUES (?, ?, ?, 'password', ?)",
            params![
                user_id,
                format!("{}@example.com", user_id),
                format!("Test User {}", user_id),
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;

        self.get_user(user_id)?.ok_or_else(|| {
            crate::error::Error::NotFound(format!("User with ID {} not found", user_id))
        })
    }

    fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
        let created_at_str: String = row.get(4)?;
        Ok(User {
            id: row.get(0)?,
            email: row.get(1)?,
            name: row.get(2)?,
            provider: row.get(3)?,
            created_at: parse_datetime(&created_at_str),
        })
    }
}
