//! Database tests

use super::*;
use crate::models::*;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rusqlite::params;

    const USER: &str = "550e8400-e29b-41d4-a716-446655440000";

    fn make_expense(db: &Database, date: &str, jpy: f64) -> Expense {
        let expense = Expense::create_from_input(ExpenseInput {
            user_id: USER.to_string(),
            amount: jpy,
            currency: Currency::Jpy,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            store: None,
            memo: None,
            category_id: None,
            exchange_rate: None,
        });
        db.create_expense(&expense).unwrap()
    }

    #[test]
    fn test_in_memory_db() {
        let db = Database::in_memory().unwrap();
        let expenses = db.list_expenses(ExpenseFilter::new()).unwrap();
        assert!(expenses.is_empty());
    }

    #[test]
    fn test_expense_round_trip() {
        let db = Database::in_memory().unwrap();

        let mut expense = Expense::create_from_input(ExpenseInput {
            user_id: USER.to_string(),
            amount: 100.0,
            currency: Currency::Twd,
            date: NaiveDate::from_ymd_opt(2024, 12, 15).unwrap(),
            store: Some("全家".to_string()),
            memo: Some("coffee".to_string()),
            category_id: None,
            exchange_rate: None,
        });
        expense.receipt_id = Some("receipt-1".to_string());

        let stored = db.create_expense(&expense).unwrap();

        assert_eq!(stored.id, expense.id);
        assert_eq!(stored.user_id, expense.user_id);
        assert_eq!(stored.receipt_id, expense.receipt_id);
        assert_eq!(stored.date, expense.date);
        assert_eq!(stored.store, expense.store);
        assert_eq!(stored.memo, expense.memo);
        assert_eq!(stored.twd_amount, Some(100.0));
        assert_eq!(stored.jpy_amount, 450.0);
        assert_eq!(stored.fx_rate_used, Some(4.5));
        assert_eq!(stored.category_id, None);

        let fetched = db.get_expense(&expense.id).unwrap().unwrap();
        assert_eq!(fetched.date, expense.date);
        assert_eq!(fetched.jpy_amount, 450.0);
    }

    #[test]
    fn test_create_rejects_invalid_expense() {
        let db = Database::in_memory().unwrap();

        let mut expense = Expense::create_from_input(ExpenseInput {
            user_id: USER.to_string(),
            amount: 100.0,
            currency: Currency::Jpy,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            store: None,
            memo: None,
            category_id: None,
            exchange_rate: None,
        });
        expense.jpy_amount = 0.0;

        let result = db.create_expense(&expense);
        assert!(matches!(result, Err(crate::Error::Validation(_))));

        // Nothing was written
        assert!(db.list_expenses(ExpenseFilter::new()).unwrap().is_empty());
    }

    #[test]
    fn test_get_expense_missing_is_none() {
        let db = Database::in_memory().unwrap();
        assert!(db.get_expense("no-such-id").unwrap().is_none());
    }

    #[test]
    fn test_month_filter_boundaries() {
        let db = Database::in_memory().unwrap();

        make_expense(&db, "2024-01-31", 100.0);
        let feb1 = make_expense(&db, "2024-02-01", 200.0);
        let feb29 = make_expense(&db, "2024-02-29", 300.0);
        make_expense(&db, "2024-03-01", 400.0);

        let expenses = db
            .list_expenses(ExpenseFilter::new().user_id(USER).month(Some("2024-02")))
            .unwrap();

        let mut ids: Vec<&str> = expenses.iter().map(|e| e.id.as_str()).collect();
        ids.sort();
        let mut expected = vec![feb1.id.as_str(), feb29.id.as_str()];
        expected.sort();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_date_range_filter() {
        let db = Database::in_memory().unwrap();

        make_expense(&db, "2024-06-01", 100.0);
        make_expense(&db, "2024-06-15", 200.0);
        make_expense(&db, "2024-07-01", 300.0);

        let expenses = db
            .list_expenses(
                ExpenseFilter::new()
                    .user_id(USER)
                    .start_date(NaiveDate::from_ymd_opt(2024, 6, 10))
                    .end_date(NaiveDate::from_ymd_opt(2024, 6, 30)),
            )
            .unwrap();
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].jpy_amount, 200.0);
    }

    #[test]
    fn test_list_orders_newest_first() {
        let db = Database::in_memory().unwrap();

        let mut first = Expense::create_from_input(ExpenseInput {
            user_id: USER.to_string(),
            amount: 100.0,
            currency: Currency::Jpy,
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            store: None,
            memo: None,
            category_id: None,
            exchange_rate: None,
        });
        first.created_at = chrono::DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        let mut second = first.clone();
        second.id = "later".to_string();
        second.created_at = chrono::DateTime::parse_from_rfc3339("2024-05-02T10:00:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc);

        db.create_expense(&first).unwrap();
        db.create_expense(&second).unwrap();

        let expenses = db.list_expenses(ExpenseFilter::new().user_id(USER)).unwrap();
        assert_eq!(expenses[0].id, "later");
        assert_eq!(expenses[1].id, first.id);
    }

    #[test]
    fn test_pagination() {
        let db = Database::in_memory().unwrap();
        for day in 1..=5 {
            make_expense(&db, &format!("2024-06-{:02}", day), day as f64 * 100.0);
        }

        let page = db
            .list_expenses(ExpenseFilter::new().user_id(USER).limit(Some(2)))
            .unwrap();
        assert_eq!(page.len(), 2);

        let rest = db
            .list_expenses(ExpenseFilter::new().user_id(USER).offset(Some(3)))
            .unwrap();
        // Offset without limit falls back to the default page size
        assert_eq!(rest.len(), 2);

        let window = db
            .list_expenses(
                ExpenseFilter::new()
                    .user_id(USER)
                    .limit(Some(2))
                    .offset(Some(2)),
            )
            .unwrap();
        assert_eq!(window.len(), 2);
    }

    #[test]
    fn test_update_expense() {
        let db = Database::in_memory().unwrap();
        let expense = make_expense(&db, "2024-06-01", 500.0);

        let patch = ExpensePatch {
            memo: Some("updated memo".to_string()),
            jpy_amount: Some(800.0),
            ..Default::default()
        };
        let updated = db.update_expense(&expense.id, &patch).unwrap();

        assert_eq!(updated.memo.as_deref(), Some("updated memo"));
        assert_eq!(updated.jpy_amount, 800.0);
        // Untouched fields survive
        assert_eq!(updated.date, expense.date);
        assert_eq!(updated.user_id, expense.user_id);
        assert!(updated.updated_at >= expense.updated_at);
    }

    #[test]
    fn test_update_missing_expense_is_not_found() {
        let db = Database::in_memory().unwrap();
        let result = db.update_expense("no-such-id", &ExpensePatch::default());
        assert!(matches!(result, Err(crate::Error::NotFound(_))));
    }

    #[test]
    fn test_delete_expense_is_idempotent() {
        let db = Database::in_memory().unwrap();
        let expense = make_expense(&db, "2024-06-01", 500.0);

        db.delete_expense(&expense.id).unwrap();
        assert!(db.get_expense(&expense.id).unwrap().is_none());

        // Second delete is a no-op, not an error
        db.delete_expense(&expense.id).unwrap();
    }

    #[test]
    fn test_total_by_category_groups_and_falls_back() {
        let db = Database::in_memory().unwrap();
        let food = db.get_or_create_category(USER, "食費").unwrap();

        let mut categorized = Expense::create_from_input(ExpenseInput {
            user_id: USER.to_string(),
            amount: 1000.0,
            currency: Currency::Jpy,
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            store: None,
            memo: None,
            category_id: Some(food.id.clone()),
            exchange_rate: None,
        });
        db.create_expense(&categorized).unwrap();
        categorized.id = new_id();
        categorized.jpy_amount = 500.0;
        db.create_expense(&categorized).unwrap();
        make_expense(&db, "2024-06-02", 300.0);

        let totals = db.total_by_category(USER, Some("2024-06")).unwrap();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].category, food.id);
        assert_eq!(totals[0].total, 1500.0);
        assert_eq!(totals[0].count, 2);
        assert_eq!(totals[1].category, UNCATEGORIZED);
        assert_eq!(totals[1].total, 300.0);
    }

    #[test]
    fn test_total_amount_respects_month() {
        let db = Database::in_memory().unwrap();
        make_expense(&db, "2024-06-01", 100.0);
        make_expense(&db, "2024-06-15", 200.0);
        make_expense(&db, "2024-07-01", 400.0);

        assert_eq!(db.total_amount(USER, Some("2024-06")).unwrap(), 300.0);
        assert_eq!(db.total_amount(USER, None).unwrap(), 700.0);
        assert_eq!(db.total_amount("someone-else", None).unwrap(), 0.0);
    }

    #[test]
    fn test_get_or_create_category_assigns_defaults() {
        let db = Database::in_memory().unwrap();

        let food = db.get_or_create_category(USER, "食費").unwrap();
        assert_eq!(food.color, "#FF6B6B");
        assert_eq!(food.sort_order, 1);
        assert!(!food.hidden);

        let unknown = db.get_or_create_category(USER, "サブスク").unwrap();
        assert_eq!(unknown.color, "#95A5A6");
        assert_eq!(unknown.sort_order, 2);
    }

    #[test]
    fn test_get_or_create_category_is_idempotent() {
        let db = Database::in_memory().unwrap();

        let first = db.get_or_create_category(USER, "交通費").unwrap();
        let second = db.get_or_create_category(USER, "交通費").unwrap();
        assert_eq!(first.id, second.id);

        let conn = db.conn().unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM categories WHERE user_id = ? AND name = ?",
                params![USER, "交通費"],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1, "second call must not insert");
    }

    #[test]
    fn test_category_unique_index_blocks_duplicates() {
        let db = Database::in_memory().unwrap();
        db.get_or_create_category(USER, "娯楽").unwrap();

        let conn = db.conn().unwrap();
        let result = conn.execute(
            "INSERT INTO categories (id, user_id, name, color, sort_order, hidden, created_at, updated_at)
             VALUES ('dup', ?, '娯楽', '#000000', 9, 0, '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')",
            params![USER],
        );
        assert!(result.is_err(), "duplicate visible name must be rejected");
    }

    #[test]
    fn test_hidden_category_excluded_from_lookup_and_listing() {
        let db = Database::in_memory().unwrap();
        let category = db.get_or_create_category(USER, "医療費").unwrap();

        let conn = db.conn().unwrap();
        conn.execute(
            "UPDATE categories SET hidden = 1 WHERE id = ?",
            params![category.id],
        )
        .unwrap();
        drop(conn);

        assert!(db.get_category_by_name(USER, "医療費").unwrap().is_none());
        assert!(db.list_categories(USER).unwrap().is_empty());

        // But a fresh get-or-create may mint a new visible row
        let replacement = db.get_or_create_category(USER, "医療費").unwrap();
        assert_ne!(replacement.id, category.id);
    }

    #[test]
    fn test_list_categories_sorted_by_sort_order() {
        let db = Database::in_memory().unwrap();
        db.get_or_create_category(USER, "食費").unwrap();
        db.get_or_create_category(USER, "交通費").unwrap();
        db.get_or_create_category(USER, "日用品").unwrap();

        let categories = db.list_categories(USER).unwrap();
        let orders: Vec<i64> = categories.iter().map(|c| c.sort_order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
    }

    #[test]
    fn test_ensure_user_is_lazy_and_idempotent() {
        let db = Database::in_memory().unwrap();
        assert!(db.get_user(USER).unwrap().is_none());

        let created = db.ensure_user(USER).unwrap();
        assert_eq!(created.id, USER);
        assert_eq!(created.provider, "password");

        let again = db.ensure_user(USER).unwrap();
        assert_eq!(again.created_at, created.created_at);
    }
}
