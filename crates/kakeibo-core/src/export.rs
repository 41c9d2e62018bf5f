//! CSV export of expenses

use crate::error::{Error, Result};
use crate::models::{Expense, UNCATEGORIZED};

/// Render expenses as CSV with the legacy column set consumed by
/// spreadsheet users (input-currency amount, derived currency tag).
pub fn expenses_to_csv(expenses: &[Expense]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record([
        "ID",
        "Amount",
        "Currency",
        "Category",
        "Date",
        "Store Name",
        "Memo",
        "Created At",
    ])?;

    for expense in expenses {
        let amount = format_amount(expense.input_amount());
        let date = expense.date.format("%Y-%m-%d").to_string();
        let created = expense.created_at.format("%Y-%m-%d").to_string();
        writer.write_record([
            expense.id.as_str(),
            amount.as_str(),
            expense.input_currency().as_str(),
            expense.category_id.as_deref().unwrap_or(UNCATEGORIZED),
            date.as_str(),
            expense.store.as_deref().unwrap_or(""),
            expense.memo.as_deref().unwrap_or(""),
            created.as_str(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::InvalidData(format!("CSV buffer error: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| Error::InvalidData(format!("CSV encoding error: {}", e)))
}

/// Integer amounts render without a trailing ".0"
fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{}", amount as i64)
    } else {
        format!("{}", amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Currency, ExpenseInput};
    use chrono::NaiveDate;

    #[test]
    fn test_empty_export_has_header_only() {
        let csv = expenses_to_csv(&[]).unwrap();
        assert_eq!(
            csv.trim_end(),
            "ID,Amount,Currency,Category,Date,Store Name,Memo,Created At"
        );
    }

    #[test]
    fn test_export_rows() {
        let expense = Expense::create_from_input(ExpenseInput {
            user_id: "u1".to_string(),
            amount: 1500.0,
            currency: Currency::Jpy,
            date: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
            store: Some("コンビニ".to_string()),
            memo: None,
            category_id: None,
            exchange_rate: None,
        });

        let csv = expenses_to_csv(&[expense.clone()]).unwrap();
        let row = csv.lines().nth(1).unwrap();
        assert!(row.starts_with(&expense.id));
        assert!(row.contains("1500,JPY"));
        assert!(row.contains(UNCATEGORIZED));
        assert!(row.contains("2024-03-09"));
    }
}
