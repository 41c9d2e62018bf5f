//! Expense persistence operations
//!
//! Pure shape translation and filtering; business rules live in the
//! service layer. The only rule enforced here is that a record must pass
//! its own validation before any write.

use rusqlite::{params, OptionalExtension};

use super::expense_filter::ExpenseFilter;
use super::{parse_date, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{CategoryTotal, Expense, Record, UNCATEGORIZED};

/// Columns of the `expenses` table in mapping order
const EXPENSE_COLUMNS: &str = "id, user_id, receipt_id, date, store, memo, \
     twd_amount, jpy_amount, fx_rate_used, category_id, created_at, updated_at";

/// Partial update of an expense row; `None` fields are left untouched.
///
/// The TWD pair is double-optional so a currency switch to JPY can clear
/// it (`Some(None)` writes NULL).
#[derive(Debug, Clone, Default)]
pub struct ExpensePatch {
    pub date: Option<chrono::NaiveDate>,
    pub store: Option<String>,
    pub memo: Option<String>,
    pub twd_amount: Option<Option<f64>>,
    pub jpy_amount: Option<f64>,
    pub fx_rate_used: Option<Option<f64>>,
    pub category_id: Option<String>,
}

impl Database {
    /// Insert an expense, rejecting invalid records before any write.
    ///
    /// Returns the stored row mapped back to the domain shape, so the
    /// round trip is lossless for every modeled field.
    pub fn create_expense(&self, expense: &Expense) -> Result<Expense> {
        let violations = expense.validate();
        if !violations.is_empty() {
            return Err(Error::Validation(violations.join(", ")));
        }

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO expenses (id, user_id, receipt_id, date, store, memo,
                                  twd_amount, jpy_amount, fx_rate_used, category_id,
                                  created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                expense.id,
                expense.user_id,
                expense.receipt_id,
                expense.date.to_string(),
                expense.store,
                expense.memo,
                expense.twd_amount,
                expense.jpy_amount,
                expense.fx_rate_used,
                expense.category_id,
                expense.created_at.to_rfc3339(),
                expense.updated_at.to_rfc3339(),
            ],
        )?;

        self.get_expense(&expense.id)?
            .ok_or_else(|| Error::NotFound(format!("Expense with ID {} not found", expense.id)))
    }

    /// Get a single expense by ID; a missing row is `None`, not an error
    pub fn get_expense(&self, id: &str) -> Result<Option<Expense>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM expenses WHERE id = ?",
            EXPENSE_COLUMNS
        ))?;

        let expense = stmt
            .query_row(params![id], Self::row_to_expense)
            .optional()?;

        Ok(expense)
    }

    /// List expenses matching the filter, newest first
    pub fn list_expenses(&self, filter: ExpenseFilter) -> Result<Vec<Expense>> {
        let built = filter.build()?;
        let conn = self.conn()?;

        let sql = format!(
            "SELECT {} FROM expenses {} ORDER BY created_at DESC, id DESC {}",
            EXPENSE_COLUMNS, built.where_clause, built.limit_clause
        );

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> =
            built.params.iter().map(|p| p.as_ref()).collect();

        let expenses = stmt
            .query_map(params_refs.as_slice(), Self::row_to_expense)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(expenses)
    }

    /// Apply a partial update, always refreshing `updated_at`.
    ///
    /// Fails with NotFound when the id does not exist; returns the full
    /// updated entity otherwise.
    pub fn update_expense(&self, id: &str, patch: &ExpensePatch) -> Result<Expense> {
        if self.get_expense(id)?.is_none() {
            return Err(Error::NotFound(format!("Expense with ID {} not found", id)));
        }

        let mut sets: Vec<&str> = vec!["updated_at = ?"];
        let mut params: Vec<Box<dyn rusqlite::ToSql>> =
            vec![Box::new(chrono::Utc::now().to_rfc3339())];

        if let Some(date) = patch.date {
            sets.push("date = ?");
            params.push(Box::new(date.to_string()));
        }
        if let Some(ref store) = patch.store {
            sets.push("store = ?");
            params.push(Box::new(store.clone()));
        }
        if let Some(ref memo) = patch.memo {
            sets.push("memo = ?");
            params.push(Box::new(memo.clone()));
        }
        if let Some(twd) = patch.twd_amount {
            sets.push("twd_amount = ?");
            params.push(Box::new(twd));
        }
        if let Some(jpy) = patch.jpy_amount {
            sets.push("jpy_amount = ?");
            params.push(Box::new(jpy));
        }
        if let Some(rate) = patch.fx_rate_used {
            sets.push("fx_rate_used = ?");
            params.push(Box::new(rate));
        }
        if let Some(ref category_id) = patch.category_id {
            sets.push("category_id = ?");
            params.push(Box::new(category_id.clone()));
        }

        params.push(Box::new(id.to_string()));

        let conn = self.conn()?;
        let sql = format!("UPDATE expenses SET {} WHERE id = ?", sets.join(", "));
        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        self.get_expense(id)?
            .ok_or_else(|| Error::NotFound(format!("Expense with ID {} not found", id)))
    }

    /// Delete an expense by ID; deleting an absent row is not an error
    pub fn delete_expense(&self, id: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM expenses WHERE id = ?", params![id])?;
        Ok(())
    }

    /// Sum canonical amounts per category over a user's (optionally
    /// month-restricted) expenses, with NULL categories grouped under
    /// the uncategorized label
    pub fn total_by_category(
        &self,
        user_id: &str,
        month: Option<&str>,
    ) -> Result<Vec<CategoryTotal>> {
        let built = ExpenseFilter::new().user_id(user_id).month(month).build()?;
        let conn = self.conn()?;

        let sql = format!(
            "SELECT COALESCE(category_id, '{}') AS category,
                    SUM(jpy_amount) AS total,
                    COUNT(*) AS count
             FROM expenses {}
             GROUP BY category
             ORDER BY total DESC",
            UNCATEGORIZED, built.where_clause
        );

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> =
            built.params.iter().map(|p| p.as_ref()).collect();

        let totals = stmt
            .query_map(params_refs.as_slice(), |row| {
                Ok(CategoryTotal {
                    category: row.get(0)?,
                    total: row.get(1)?,
                    count: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(totals)
    }

    /// Sum canonical amounts over a user's (optionally month-restricted)
    /// expenses
    pub fn total_amount(&self, user_id: &str, month: Option<&str>) -> Result<f64> {
        let built = ExpenseFilter::new().user_id(user_id).month(month).build()?;
        let conn = self.conn()?;

        let sql = format!(
            "SELECT COALESCE(SUM(jpy_amount), 0) FROM expenses {}",
            built.where_clause
        );

        let params_refs: Vec<&dyn rusqlite::ToSql> =
            built.params.iter().map(|p| p.as_ref()).collect();
        let total: f64 = conn.query_row(&sql, params_refs.as_slice(), |row| row.get(0))?;

        Ok(total)
    }

    /// Count all expense rows
    pub fn count_expenses(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM expenses", [], |row| row.get(0))?;
        Ok(count)
    }

    pub(crate) fn row_to_expense(row: &rusqlite::Row) -> rusqlite::Result<Expense> {
        let date_str: String = row.get(3)?;
        let created_at_str: String = row.get(10)?;
        let updated_at_str: String = row.get(11)?;
        Ok(Expense {
            id: row.get(0)?,
            user_id: row.get(1)?,
            receipt_id: row.get(2)?,
            date: parse_date(&date_str),
            store: row.get(4)?,
            memo: row.get(5)?,
            twd_amount: row.get(6)?,
            jpy_amount: row.get(7)?,
            fx_rate_used: row.get(8)?,
            category_id: row.get(9)?,
            created_at: parse_datetime(&created_at_str),
            updated_at: parse_datetime(&updated_at_str),
        })
    }
}
