//! CLI argument definitions using clap
//!
//! This module contains the clap structs and enums for parsing CLI
//! arguments. The command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Kakeibo - Personal expense tracker
#[derive(Parser)]
#[command(name = "kakeibo")]
#[command(about = "Self-hosted personal expense tracker", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "kakeibo.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Allowed CORS origin (repeatable; default is same-origin only)
        #[arg(long = "cors-origin")]
        cors_origins: Vec<String>,

        /// User id attributed to requests
        ///
        /// Stand-in for the session-derived identity; defaults to the
        /// documented placeholder user.
        #[arg(long)]
        user: Option<String>,
    },

    /// Export expenses as CSV
    Export {
        /// Restrict to a month (YYYY-MM)
        #[arg(short, long)]
        month: Option<String>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// User whose expenses to export
        #[arg(long)]
        user: Option<String>,
    },

    /// Show database status (path, row counts)
    Status,
}
