//! Category resolution operations
//!
//! Maps user-scoped category names to stable ids, creating on demand.
//! Categories are never updated or deleted here; hiding is the only
//! retirement path and hidden rows stay out of lookups.

use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{new_id, Category};

/// Default display colors for well-known category names; anything else
/// falls back to neutral gray.
fn default_color_for(name: &str) -> &'static str {
    match name {
        "食費" => "#FF6B6B",
        "交通費" => "#4ECDC4",
        "住居費" => "#45B7D1",
        "娯楽" => "#F9CA24",
        "日用品" => "#6C5CE7",
        "医療費" => "#A0E7E5",
        "その他" => "#95A5A6",
        _ => "#95A5A6",
    }
}

const CATEGORY_COLUMNS: &str =
    "id, user_id, name, color, sort_order, hidden, created_at, updated_at";

impl Database {
    /// Find a visible category by name; a miss is `None`, not an error
    pub fn get_category_by_name(&self, user_id: &str, name: &str) -> Result<Option<Category>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM categories WHERE user_id = ? AND name = ? AND hidden = 0",
            CATEGORY_COLUMNS
        ))?;

        let category = stmt
            .query_row(params![user_id, name], Self::row_to_category)
            .optional()?;

        Ok(category)
    }

    /// Get a category by ID (hidden or not)
    pub fn get_category(&self, id: &str) -> Result<Option<Category>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM categories WHERE id = ?",
            CATEGORY_COLUMNS
        ))?;

        let category = stmt
            .query_row(params![id], Self::row_to_category)
            .optional()?;

        Ok(category)
    }

    /// List a user's visible categories in manual sort order
    pub fn list_categories(&self, user_id: &str) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM categories WHERE user_id = ? AND hidden = 0 ORDER BY sort_order ASC",
            CATEGORY_COLUMNS
        ))?;

        let categories = stmt
            .query_map(params![user_id], Self::row_to_category)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(categories)
    }

    /// Return the category with this name, creating it if absent.
    ///
    /// New categories get a color from the fixed name lookup and the next
    /// sort_order slot for the user. Two concurrent creators can both miss
    /// the lookup; the unique index on (user_id, name) rejects the loser,
    /// which then fetches and returns the winner's row.
    pub fn get_or_create_category(&self, user_id: &str, name: &str) -> Result<Category> {
        if let Some(existing) = self.get_category_by_name(user_id, name)? {
            return Ok(existing);
        }

        let id = new_id();
        let sort_order = self.next_sort_order(user_id)?;
        let now = chrono::Utc::now().to_rfc3339();

        let conn = self.conn()?;
        let inserted = conn.execute(
            r#"
            INSERT INTO categories (id, user_id, name, color, sort_order, hidden, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, 0, ?, ?)
            "#,
            params![id, user_id, name, default_color_for(name), sort_order, now, now],
        );

        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                // Lost the race; the winner's row is the one we want
                if let Some(existing) = self.get_category_by_name(user_id, name)? {
                    return Ok(existing);
                }
                return Err(rusqlite::Error::SqliteFailure(e, None).into());
            }
            Err(e) => return Err(e.into()),
        }

        self.get_category(&id)?.ok_or_else(|| {
            crate::error::Error::NotFound(format!("Category with ID {} not found", id))
        })
    }

    /// Next sort_order slot for a user (max existing + 1, or 1 if none)
    fn next_sort_order(&self, user_id: &str) -> Result<i64> {
        let conn = self.conn()?;
        let max: i64 = conn.query_row(
            "SELECT COALESCE(MAX(sort_order), 0) FROM categories WHERE user_id = ?",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(max + 1)
    }

    /// Count all category rows (hidden included)
    pub fn count_categories(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
        Ok(count)
    }

    pub(crate) fn row_to_category(row: &rusqlite::Row) -> rusqlite::Result<Category> {
        let hidden_int: i64 = row.get(5)?;
        let created_at_str: String = row.get(6)?;
        let updated_at_str: String = row.get(7)?;
        Ok(Category {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            color: row.get(3)?,
            sort_order: row.get(4)?,
            hidden: hidden_int != 0,
            created_at: parse_datetime(&created_at_str),
            updated_at: parse_datetime(&updated_at_str),
        })
    }
}
