//! Serve command

use std::path::Path;

use anyhow::Result;

use kakeibo_server::{ServerConfig, PLACEHOLDER_USER_ID};

use super::core::open_db;

/// Start the web server
pub async fn cmd_serve(
    db_path: &Path,
    host: &str,
    port: u16,
    cors_origins: Vec<String>,
    user: Option<String>,
) -> Result<()> {
    let db = open_db(db_path)?;

    let config = ServerConfig {
        default_user_id: user.unwrap_or_else(|| PLACEHOLDER_USER_ID.to_string()),
        allowed_origins: cors_origins,
    };

    kakeibo_server::serve(db, host, port, config).await
}
