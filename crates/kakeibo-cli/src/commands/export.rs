//! Export command

use std::path::{Path, PathBuf};

use anyhow::Result;

use kakeibo_core::{ExpenseFilters, ExpenseService};
use kakeibo_server::PLACEHOLDER_USER_ID;

use super::core::open_db;

/// Export expenses as CSV to a file or stdout
pub async fn cmd_export(
    db_path: &Path,
    month: Option<String>,
    output: Option<PathBuf>,
    user: Option<String>,
) -> Result<()> {
    let db = open_db(db_path)?;
    let service = ExpenseService::new(db);
    let user_id = user.unwrap_or_else(|| PLACEHOLDER_USER_ID.to_string());

    let filters = ExpenseFilters {
        month,
        ..Default::default()
    };
    let csv = service.export_csv(&user_id, &filters).await?;

    match output {
        Some(path) => {
            std::fs::write(&path, &csv)?;
            eprintln!("Exported to {}", path.display());
        }
        None => print!("{}", csv),
    }

    Ok(())
}
