//! CLI tests

use crate::commands;

#[test]
fn test_init_creates_database_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.db");

    commands::cmd_init(&path).unwrap();
    assert!(path.exists());

    // Re-opening an existing database is fine (migrations are idempotent)
    let db = commands::open_db(&path).unwrap();
    assert_eq!(db.count_expenses().unwrap(), 0);
    assert_eq!(db.count_categories().unwrap(), 0);
}

#[tokio::test]
async fn test_export_writes_csv_file() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test.db");
    let out_path = dir.path().join("expenses.csv");

    commands::cmd_init(&db_path).unwrap();
    commands::cmd_export(&db_path, None, Some(out_path.clone()), None)
        .await
        .unwrap();

    let csv = std::fs::read_to_string(&out_path).unwrap();
    assert!(csv.starts_with("ID,Amount,Currency,Category,Date,Store Name,Memo,Created At"));
}
