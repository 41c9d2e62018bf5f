//! HTTP request handlers
//!
//! One module per resource. Handlers extract the (mocked) identity,
//! delegate to the expense service, and wrap results in the response
//! envelope.

mod auth;
mod categories;
mod expenses;
mod export;
mod reports;

pub use auth::get_me;
pub use categories::list_categories;
pub use expenses::{
    bulk_delete_expenses, create_expense, delete_expense, expensive_purchases, get_expense,
    list_expenses, update_expense,
};
pub use export::export_expenses;
pub use reports::{category_stats, monthly_report};
