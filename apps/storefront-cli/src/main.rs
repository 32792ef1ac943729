//! # storefront: Catalogue Command-Line Tool
//!
//! Entry point for the `storefront` binary.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  main()                                                                 │
//! │    │                                                                    │
//! │    ├── init_tracing()         RUST_LOG or default filter, to stderr     │
//! │    ├── Cli::parse()           clap; usage errors exit with code 2       │
//! │    ├── resolve_config()       --db, then STOREFRONT_DB_* variables      │
//! │    └── commands::*            migrate / seed / tour → stdout report     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, MigrateAction};
use crate::commands::resolve_config;
use storefront_db::{DbConfig, DbResult};

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    // Prints help/version and exits 0, or the usage error and exits 2
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "Command failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> DbResult<()> {
    match cli.command {
        Command::Migrate { action } => match action.unwrap_or(MigrateAction::Status) {
            MigrateAction::Add { name, dir } => commands::migrate::add(&dir, &name),
            MigrateAction::Status => {
                commands::migrate::status(resolve_config(cli.db.as_deref())?).await
            }
            MigrateAction::Run => commands::migrate::run(resolve_config(cli.db.as_deref())?).await,
        },
        Command::Seed => {
            commands::seed::run(resolve_config(cli.db.as_deref())?).await?;
            Ok(())
        }
        Command::Tour => {
            // The tour mutates rows, so it stays in memory unless pointed at a file
            let config = match cli.db.as_deref() {
                Some(path) => resolve_config(Some(path))?,
                None => DbConfig::in_memory(),
            };
            info!(in_memory = config.is_in_memory(), "Starting tour");
            commands::tour::run(config).await
        }
    }
}

/// Initializes the tracing subscriber for logging.
///
/// ## Log Levels
/// - ERROR: Failed commands
/// - WARN: Rejected stale updates, rolled-back saves
/// - INFO: Migrations, seeding, pool lifecycle
/// - DEBUG: Staged changes, generated SQL counts
///
/// Set `RUST_LOG` to override, e.g. `RUST_LOG=storefront_db=trace`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,storefront=debug,storefront_db=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
