//! Kakeibo Core Library
//!
//! Shared functionality for the Kakeibo expense tracker:
//! - Domain models with self-validation (expenses, categories, users)
//! - Persistence layer over pooled SQLite (shape translation + filtering)
//! - Category resolution (get-or-create with stable per-user names)
//! - Expense service orchestration (business rules, reports, hooks)
//! - CSV export

pub mod db;
pub mod error;
pub mod export;
pub mod models;
pub mod service;

pub use db::{month_range, Database, ExpenseFilter, ExpensePatch};
pub use error::{Error, Result};
pub use export::expenses_to_csv;
pub use models::{
    Category, CategoryStat, CategoryTotal, Currency, Expense, ExpenseInput, MonthlyReport, Record,
    User, DEFAULT_EXCHANGE_RATE, EXPENSIVE_THRESHOLD, UNCATEGORIZED,
};
pub use service::{
    CreateExpenseDto, ExpenseFilters, ExpenseService, UpdateExpenseDto,
};
