//! Expense filter builder for constructing dynamic SQL queries
//!
//! Builds the WHERE clause and parameter list shared by the expense list
//! and aggregation queries, plus the pagination clause for list queries.

use chrono::NaiveDate;

use super::month_range;
use crate::error::Result;

/// Builder for constructing expense query filters
///
/// The lifetime `'query` represents how long the filter parameters
/// (user id, category id, month) must remain valid.
#[derive(Default)]
pub struct ExpenseFilter<'query> {
    pub user_id: Option<&'query str>,
    pub category_id: Option<&'query str>,
    pub month: Option<&'query str>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Result of building a filter - contains SQL components and parameters
pub struct FilterResult {
    /// WHERE clause including "WHERE" keyword (empty if no conditions)
    pub where_clause: String,
    /// Parameters for the query (boxed for rusqlite compatibility)
    pub params: Vec<Box<dyn rusqlite::ToSql>>,
    /// LIMIT/OFFSET clause (empty if unpaginated); values are inlined
    /// integers, so no parameters are needed
    pub limit_clause: String,
}

/// Page size assumed when an offset is given without a limit
const DEFAULT_PAGE_SIZE: i64 = 50;

impl<'query> ExpenseFilter<'query> {
    /// Create a new filter builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to a single user
    pub fn user_id(mut self, id: &'query str) -> Self {
        self.user_id = Some(id);
        self
    }

    /// Restrict to a category id
    pub fn category_id(mut self, id: Option<&'query str>) -> Self {
        self.category_id = id;
        self
    }

    /// Restrict to a calendar month ("YYYY-MM"), expanded to an inclusive
    /// first..last day range at build time
    pub fn month(mut self, month: Option<&'query str>) -> Self {
        self.month = month;
        self
    }

    /// Lower date bound (inclusive)
    pub fn start_date(mut self, date: Option<NaiveDate>) -> Self {
        self.start_date = date;
        self
    }

    /// Upper date bound (inclusive)
    pub fn end_date(mut self, date: Option<NaiveDate>) -> Self {
        self.end_date = date;
        self
    }

    /// Maximum rows to return
    pub fn limit(mut self, limit: Option<i64>) -> Self {
        self.limit = limit;
        self
    }

    /// Rows to skip before the first returned row
    pub fn offset(mut self, offset: Option<i64>) -> Self {
        self.offset = offset;
        self
    }

    /// Build the filter components
    ///
    /// Fails only when the month string is malformed.
    pub fn build(self) -> Result<FilterResult> {
        let mut conditions: Vec<String> = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(user_id) = self.user_id {
            conditions.push("user_id = ?".to_string());
            params.push(Box::new(user_id.to_string()));
        }

        if let Some(category_id) = self.category_id {
            conditions.push("category_id = ?".to_string());
            params.push(Box::new(category_id.to_string()));
        }

        if let Some(month) = self.month {
            let (first, last) = month_range(month)?;
            conditions.push("date >= ?".to_string());
            params.push(Box::new(first.to_string()));
            conditions.push("date <= ?".to_string());
            params.push(Box::new(last.to_string()));
        }

        if let Some(start) = self.start_date {
            conditions.push("date >= ?".to_string());
            params.push(Box::new(start.to_string()));
        }

        if let Some(end) = self.end_date {
            conditions.push("date <= ?".to_string());
            params.push(Box::new(end.to_string()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        // Pagination: limit alone caps rows; offset without a limit assumes
        // a page size of 50; neither means all rows.
        let limit_clause = match (self.limit, self.offset) {
            (Some(limit), Some(offset)) => {
                format!("LIMIT {} OFFSET {}", limit.max(0), offset.max(0))
            }
            (Some(limit), None) => format!("LIMIT {}", limit.max(0)),
            (None, Some(offset)) => {
                format!("LIMIT {} OFFSET {}", DEFAULT_PAGE_SIZE, offset.max(0))
            }
            (None, None) => String::new(),
        };

        Ok(FilterResult {
            where_clause,
            params,
            limit_clause,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_has_no_clauses() {
        let result = ExpenseFilter::new().build().unwrap();
        assert_eq!(result.where_clause, "");
        assert_eq!(result.limit_clause, "");
        assert!(result.params.is_empty());
    }

    #[test]
    fn test_month_expands_to_inclusive_range() {
        let result = ExpenseFilter::new()
            .user_id("u1")
            .month(Some("2024-02"))
            .build()
            .unwrap();
        assert_eq!(
            result.where_clause,
            "WHERE user_id = ? AND date >= ? AND date <= ?"
        );
        assert_eq!(result.params.len(), 3);
    }

    #[test]
    fn test_invalid_month_is_rejected() {
        assert!(ExpenseFilter::new().month(Some("2024/02")).build().is_err());
    }

    #[test]
    fn test_offset_without_limit_uses_default_page_size() {
        let result = ExpenseFilter::new().offset(Some(10)).build().unwrap();
        assert_eq!(result.limit_clause, "LIMIT 50 OFFSET 10");

        let result = ExpenseFilter::new().limit(Some(5)).build().unwrap();
        assert_eq!(result.limit_clause, "LIMIT 5");

        let result = ExpenseFilter::new()
            .limit(Some(5))
            .offset(Some(20))
            .build()
            .unwrap();
        assert_eq!(result.limit_clause, "LIMIT 5 OFFSET 20");
    }
}
