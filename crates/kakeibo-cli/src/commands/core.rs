//! Core commands: init, status

use std::path::Path;

use anyhow::Result;
use kakeibo_core::Database;

/// Open the database at the given path, running migrations
pub fn open_db(path: &Path) -> Result<Database> {
    let path_str = path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid database path: {}", path.display()))?;
    Ok(Database::new(path_str)?)
}

/// Initialize the database (create file and schema)
pub fn cmd_init(path: &Path) -> Result<()> {
    let db = open_db(path)?;
    println!("Database initialized at {}", db.path());
    Ok(())
}

/// Show database status
pub fn cmd_status(path: &Path) -> Result<()> {
    let db = open_db(path)?;

    println!("Database: {}", db.path());
    println!("  Expenses:   {}", db.count_expenses()?);
    println!("  Categories: {}", db.count_categories()?);

    Ok(())
}
