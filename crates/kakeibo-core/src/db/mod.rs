//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `expenses` - Expense CRUD and aggregation
//! - `categories` - Category resolution (get-or-create)
//! - `users` - Lazy user provisioning
//!
//! The hosted backend of the original deployment is modeled here by an
//! embedded SQLite store; the row schema matches it column for column.

use chrono::{DateTime, NaiveDate, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;

use crate::error::{Error, Result};

mod categories;
mod expense_filter;
mod expenses;
mod users;

#[cfg(test)]
mod tests;

pub use expense_filter::{ExpenseFilter, FilterResult};
pub use expenses::ExpensePatch;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Parse a stored timestamp into a `DateTime<Utc>`
///
/// Timestamps are written as RFC 3339; the SQLite `CURRENT_TIMESTAMP`
/// format is accepted as a fallback.
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|dt| dt.and_utc())
        })
        .unwrap_or_else(|_| Utc::now())
}

/// Parse a stored `YYYY-MM-DD` date column
pub(crate) fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap_or_default()
}

/// Expand a `YYYY-MM` month into its inclusive first..last day range,
/// accounting for variable month length and leap years.
pub fn month_range(month: &str) -> Result<(NaiveDate, NaiveDate)> {
    let invalid = || Error::Validation("Invalid month format. Use YYYY-MM format.".to_string());

    let (year_str, month_str) = month.split_once('-').ok_or_else(invalid)?;
    if year_str.len() != 4 || month_str.len() != 2 {
        return Err(invalid());
    }
    let year: i32 = year_str.parse().map_err(|_| invalid())?;
    let month_num: u32 = month_str.parse().map_err(|_| invalid())?;

    let first = NaiveDate::from_ymd_opt(year, month_num, 1).ok_or_else(invalid)?;
    let next_month = if month_num == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month_num + 1, 1)
    }
    .ok_or_else(invalid)?;
    let last = next_month.pred_opt().ok_or_else(invalid)?;

    Ok((first, last))
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
}

impl Database {
    /// Open (or create) a database at the given path and run migrations
    pub fn new(path: &str) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder().max_size(10).build(manager)?;

        let db = Self {
            pool,
            db_path: path.to_string(),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create a throwaway database (for testing)
    ///
    /// Note: Uses a temporary file rather than `:memory:` because every
    /// pooled connection to `:memory:` would get its own private database.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = format!(
            "{}/kakeibo_test_{}_{}.db",
            std::env::temp_dir().display(),
            std::process::id(),
            id
        );

        // Remove any existing file
        let _ = std::fs::remove_file(&path);

        Self::new(&path)
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- Enable foreign keys
            PRAGMA foreign_keys = ON;

            -- WAL mode: better concurrency, readers don't block writers
            PRAGMA journal_mode = WAL;

            -- Synchronous NORMAL: good balance of safety and performance
            PRAGMA synchronous = NORMAL;

            -- Users (profile rows; the identity provider is the source of truth)
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL,
                name TEXT NOT NULL,
                provider TEXT NOT NULL DEFAULT 'password',
                created_at TEXT NOT NULL
            );

            -- Categories (user-scoped labels with display color and manual order)
            CREATE TABLE IF NOT EXISTS categories (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                color TEXT NOT NULL,
                sort_order INTEGER NOT NULL,
                hidden BOOLEAN NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            -- One visible category per (user, name); hidden rows keep their name
            CREATE UNIQUE INDEX IF NOT EXISTS idx_categories_user_name
                ON categories(user_id, name) WHERE hidden = 0;
            CREATE INDEX IF NOT EXISTS idx_categories_user ON categories(user_id);

            -- Expenses
            CREATE TABLE IF NOT EXISTS expenses (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                receipt_id TEXT,                 -- captured receipt reference (unmodeled)
                date DATE NOT NULL,
                store TEXT,
                memo TEXT,
                twd_amount REAL,                 -- original amount when entered in TWD
                jpy_amount REAL NOT NULL,        -- canonical amount for aggregation
                fx_rate_used REAL,               -- set exactly when twd_amount is
                category_id TEXT REFERENCES categories(id),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            -- Indexes for common queries
            CREATE INDEX IF NOT EXISTS idx_expenses_user ON expenses(user_id);
            CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date);
            CREATE INDEX IF NOT EXISTS idx_expenses_category ON expenses(category_id);
            CREATE INDEX IF NOT EXISTS idx_expenses_created ON expenses(created_at);
            "#,
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod month_range_tests {
    use super::*;

    #[test]
    fn test_month_range_regular_month() {
        let (first, last) = month_range("2024-12").unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2024, 12, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
    }

    #[test]
    fn test_month_range_leap_february() {
        let (first, last) = month_range("2024-02").unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn test_month_range_non_leap_february() {
        let (_, last) = month_range("2023-02").unwrap();
        assert_eq!(last, NaiveDate::from_ymd_opt(2023, 2, 28).unwrap());
    }

    #[test]
    fn test_month_range_rejects_malformed_input() {
        assert!(month_range("2024").is_err());
        assert!(month_range("2024-13").is_err());
        assert!(month_range("2024-1").is_err());
        assert!(month_range("24-01").is_err());
        assert!(month_range("2024-02-01").is_err());
    }
}
