//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Default directory for `migrate add`.
pub const DEFAULT_MIGRATIONS_DIR: &str = "migrations/sqlite";

#[derive(Debug, Parser)]
#[command(name = "storefront")]
#[command(about = "Storefront catalogue tool")]
#[command(version)]
#[command(after_help = "Logging: RUST_LOG (default: info,storefront=debug,storefront_db=debug,sqlx=warn)")]
pub struct Cli {
    /// Database file (default: $STOREFRONT_DB_PATH or ./storefront.db)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Show, apply or create migrations (default: status)
    Migrate {
        #[command(subcommand)]
        action: Option<MigrateAction>,
    },

    /// Insert the demo catalogue (idempotent)
    Seed,

    /// Walk through loading strategies and a concurrency conflict
    /// (in-memory unless --db is given)
    Tour,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum MigrateAction {
    /// Show applied / total migrations
    Status,

    /// Apply pending migrations
    Run,

    /// Create the next numbered migration file
    Add {
        /// Migration description (e.g. "add loyalty points")
        name: String,

        /// Directory holding the migration files
        #[arg(long, value_name = "DIR", default_value = DEFAULT_MIGRATIONS_DIR)]
        dir: PathBuf,
    },
}
