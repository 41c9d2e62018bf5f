//! Expense service orchestration
//!
//! The only entry point controllers call. Combines business-rule
//! validation, user provisioning, category resolution, entity
//! construction, and persistence; shapes the aggregate reports.

use chrono::{Duration, NaiveDate, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::db::{month_range, Database, ExpenseFilter, ExpensePatch};
use crate::error::{Error, Result};
use crate::export::expenses_to_csv;
use crate::models::{
    Category, CategoryStat, Currency, Expense, ExpenseInput, MonthlyReport,
    DEFAULT_EXCHANGE_RATE, EXPENSIVE_THRESHOLD,
};

/// Hard ceiling on a single expense amount (input currency units)
const MAX_AMOUNT: f64 = 1_000_000.0;

/// Clock-skew allowance for future-dated expenses
const FUTURE_WINDOW_DAYS: i64 = 3;

/// Request body for creating an expense
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpenseDto {
    pub amount: f64,
    pub currency: Currency,
    /// Category name; resolved (or created) per user before persisting
    pub category: String,
    /// ISO date string (YYYY-MM-DD)
    pub date: String,
    pub store_name: Option<String>,
    pub memo: Option<String>,
}

/// Request body for updating an expense; omitted fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExpenseDto {
    /// Must be supplied together with `currency`; recomputes the stored
    /// monetary fields the same way creation does
    pub amount: Option<f64>,
    pub currency: Option<Currency>,
    pub category: Option<String>,
    pub date: Option<String>,
    pub store_name: Option<String>,
    pub memo: Option<String>,
}

/// Filters for listing/exporting expenses
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseFilters {
    /// Calendar month ("YYYY-MM")
    pub month: Option<String>,
    /// Category id
    pub category: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ExpenseFilters {
    fn to_filter<'a>(&'a self, user_id: &'a str) -> ExpenseFilter<'a> {
        ExpenseFilter::new()
            .user_id(user_id)
            .category_id(self.category.as_deref())
            .month(self.month.as_deref())
            .start_date(self.start_date)
            .end_date(self.end_date)
            .limit(self.limit)
            .offset(self.offset)
    }
}

/// Round to 2 decimal places
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Orchestrates validation, enrichment, and persistence for expenses
#[derive(Clone)]
pub struct ExpenseService {
    db: Database,
}

impl ExpenseService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create an expense from user input.
    ///
    /// Business rules run before anything is touched: the amount ceiling
    /// and the future-date window (up to 3 days ahead is allowed for
    /// clock skew). The category name is then resolved to an id, the
    /// entity built and persisted, and the post-create hook fired.
    pub async fn create_expense(&self, user_id: &str, dto: CreateExpenseDto) -> Result<Expense> {
        validate_amount_ceiling(dto.amount)?;
        let date = parse_iso_date(&dto.date)?;
        validate_date_window(date)?;

        self.db.ensure_user(user_id)?;
        let category = self.db.get_or_create_category(user_id, &dto.category)?;

        let expense = Expense::create_from_input(ExpenseInput {
            user_id: user_id.to_string(),
            amount: dto.amount,
            currency: dto.currency,
            date,
            store: dto.store_name,
            memo: dto.memo,
            category_id: Some(category.id),
            exchange_rate: None,
        });

        let created = self.db.create_expense(&expense)?;
        self.notify_expense_created(&created);

        Ok(created)
    }

    /// Get an expense, enforcing ownership.
    ///
    /// A row owned by another user fails with the same error as a row
    /// that does not exist, so ids cannot be probed.
    pub async fn get_expense(&self, id: &str, user_id: &str) -> Result<Expense> {
        let expense = self
            .db
            .get_expense(id)?
            .ok_or_else(|| Error::NotFound(format!("Expense with ID {} not found", id)))?;

        if expense.user_id != user_id {
            return Err(Error::NotFound(format!("Expense with ID {} not found", id)));
        }

        Ok(expense)
    }

    /// List a user's expenses with optional filters
    pub async fn list_expenses(
        &self,
        user_id: &str,
        filters: &ExpenseFilters,
    ) -> Result<Vec<Expense>> {
        self.db.list_expenses(filters.to_filter(user_id))
    }

    /// Apply a partial update after re-running the ownership check
    pub async fn update_expense(
        &self,
        id: &str,
        user_id: &str,
        dto: UpdateExpenseDto,
    ) -> Result<Expense> {
        self.get_expense(id, user_id).await?;

        let mut patch = ExpensePatch::default();

        match (dto.amount, dto.currency) {
            (Some(amount), Some(currency)) => {
                validate_amount_ceiling(amount)?;
                match currency {
                    Currency::Twd => {
                        patch.twd_amount = Some(Some(amount));
                        patch.jpy_amount = Some((amount * DEFAULT_EXCHANGE_RATE).round());
                        patch.fx_rate_used = Some(Some(DEFAULT_EXCHANGE_RATE));
                    }
                    Currency::Jpy => {
                        patch.jpy_amount = Some(amount);
                        patch.twd_amount = Some(None);
                        patch.fx_rate_used = Some(None);
                    }
                }
            }
            (None, None) => {}
            _ => {
                return Err(Error::Validation(
                    "Amount and currency must be provided together".to_string(),
                ))
            }
        }

        if let Some(ref name) = dto.category {
            let category = self.db.get_or_create_category(user_id, name)?;
            patch.category_id = Some(category.id);
        }

        if let Some(ref date) = dto.date {
            patch.date = Some(parse_iso_date(date)?);
        }
        patch.store = dto.store_name;
        patch.memo = dto.memo;

        let updated = self.db.update_expense(id, &patch)?;
        self.notify_expense_updated(&updated);

        Ok(updated)
    }

    /// Delete an expense after the ownership check
    pub async fn delete_expense(&self, id: &str, user_id: &str) -> Result<()> {
        self.get_expense(id, user_id).await?;
        self.db.delete_expense(id)?;
        self.notify_expense_deleted(id, user_id);
        Ok(())
    }

    /// Monthly report: the expense list and the category totals are
    /// fetched concurrently; either failure aborts the report.
    pub async fn monthly_report(&self, user_id: &str, month: &str) -> Result<MonthlyReport> {
        month_range(month)?;

        let expenses_task = {
            let db = self.db.clone();
            let user = user_id.to_string();
            let month = month.to_string();
            tokio::task::spawn_blocking(move || {
                db.list_expenses(ExpenseFilter::new().user_id(&user).month(Some(month.as_str())))
            })
        };
        let totals_task = {
            let db = self.db.clone();
            let user = user_id.to_string();
            let month = month.to_string();
            tokio::task::spawn_blocking(move || db.total_by_category(&user, Some(month.as_str())))
        };

        let (expenses, category_totals) = tokio::try_join!(expenses_task, totals_task)?;
        let expenses = expenses?;
        let category_totals = category_totals?;

        let total_amount: f64 = expenses.iter().map(|e| e.jpy_amount).sum();
        let count = expenses.len() as i64;
        let average_amount = if count > 0 {
            round2(total_amount / count as f64)
        } else {
            0.0
        };

        Ok(MonthlyReport {
            expenses,
            category_totals,
            total_amount,
            count,
            average_amount,
        })
    }

    /// Category totals as percentages of the grand total, largest first
    pub async fn category_stats(
        &self,
        user_id: &str,
        month: Option<&str>,
    ) -> Result<Vec<CategoryStat>> {
        let totals = self.db.total_by_category(user_id, month)?;
        let grand_total: f64 = totals.iter().map(|t| t.total).sum();

        let mut stats: Vec<CategoryStat> = totals
            .into_iter()
            .map(|t| {
                let percentage = if grand_total > 0.0 {
                    round2(t.total / grand_total * 100.0)
                } else {
                    0.0
                };
                CategoryStat {
                    category: t.category,
                    total: t.total,
                    count: t.count,
                    percentage,
                }
            })
            .collect();
        stats.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(std::cmp::Ordering::Equal));

        Ok(stats)
    }

    /// Expenses above the threshold (default 10,000 JPY) for the month
    pub async fn expensive_purchases(
        &self,
        user_id: &str,
        threshold: Option<f64>,
        month: Option<&str>,
    ) -> Result<Vec<Expense>> {
        let threshold = threshold.unwrap_or(EXPENSIVE_THRESHOLD);
        let expenses = self
            .db
            .list_expenses(ExpenseFilter::new().user_id(user_id).month(month))?;

        Ok(expenses
            .into_iter()
            .filter(|e| e.is_expensive(threshold))
            .collect())
    }

    /// A user's visible categories in manual sort order
    pub async fn categories(&self, user_id: &str) -> Result<Vec<Category>> {
        self.db.list_categories(user_id)
    }

    /// Render a user's (filtered) expenses as CSV
    pub async fn export_csv(&self, user_id: &str, filters: &ExpenseFilters) -> Result<String> {
        let expenses = self.list_expenses(user_id, filters).await?;
        expenses_to_csv(&expenses)
    }

    // Post-mutation hooks. Notifications (mail, push) hang off these; for
    // now they only trace.

    fn notify_expense_created(&self, expense: &Expense) {
        debug!(id = %expense.id, user = %expense.user_id, "expense created");
    }

    fn notify_expense_updated(&self, expense: &Expense) {
        debug!(id = %expense.id, user = %expense.user_id, "expense updated");
    }

    fn notify_expense_deleted(&self, id: &str, user_id: &str) {
        debug!(id = %id, user = %user_id, "expense deleted");
    }
}

/// Parse an ISO date, accepting a bare date or a full RFC 3339 timestamp
fn parse_iso_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.date_naive())
        })
        .ok_or_else(|| Error::Validation(format!("Invalid date: {}", s)))
}

fn validate_amount_ceiling(amount: f64) -> Result<()> {
    if amount > MAX_AMOUNT {
        return Err(Error::Validation(
            "Amount cannot exceed 1,000,000".to_string(),
        ));
    }
    Ok(())
}

/// Reject dates more than the skew window into the future; a rule against
/// bad input, not against future dates as such.
fn validate_date_window(date: NaiveDate) -> Result<()> {
    let horizon = Utc::now().date_naive() + Duration::days(FUTURE_WINDOW_DAYS);
    if date > horizon {
        return Err(Error::Validation(
            "Expense date cannot be more than 3 days in the future".to_string(),
        ));
    }
    Ok(())
}
