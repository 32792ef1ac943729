//! # Database Migrations
//!
//! Embedded SQL migrations for the catalogue schema.
//!
//! ## How Migrations Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Migration Process                                  │
//! │                                                                         │
//! │  Database::new(config)                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Check _sqlx_migrations table (create if missing)                       │
//! │       │                                                                 │
//! │       ├── 001_initial_schema.sql  ✓ (already applied)                   │
//! │       └── 002_add_customers.sql   ⬜ (NEW - needs to run)                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Run pending migrations in order, record each in _sqlx_migrations       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Adding New Migrations
//!
//! 1. `storefront migrate add <description>` creates the next numbered file
//!    in `migrations/sqlite/` (see [`scaffold_migration`])
//! 2. Write the SQL
//! 3. **NEVER** modify existing migrations - always add new ones

use std::fs;
use std::path::{Path, PathBuf};

use sqlx::SqlitePool;
use tracing::info;

use crate::error::{DbError, DbResult};

/// Embedded migrations from the workspace `migrations/sqlite` directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs all pending database migrations.
///
/// ## Safety
/// - Idempotent: safe to run multiple times
/// - Transactional: each migration runs in a transaction
/// - Ordered: migrations run in filename order (001, 002, ...)
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Returns `(total_migrations, applied_migrations)`.
///
/// A database that has never been migrated reports zero applied.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let has_table: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'",
    )
    .fetch_one(pool)
    .await?;

    if has_table == 0 {
        return Ok((total, 0));
    }

    let applied: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await?;

    Ok((total, applied as usize))
}

/// Creates an empty migration file named after the next free sequence number.
///
/// ## Naming
/// `"Add Loyalty Points"` in a directory holding `001_...` and `002_...`
/// becomes `003_add_loyalty_points.sql`.
///
/// ## Returns
/// * `Ok(PathBuf)` - Path of the new file
/// * `Err(DbError::InvalidConfig)` - Name has no usable characters
pub fn scaffold_migration(dir: &Path, name: &str) -> DbResult<PathBuf> {
    let description = normalize_name(name);
    if description.is_empty() {
        return Err(DbError::invalid_config(
            "migration name",
            "must contain letters or digits",
        ));
    }

    fs::create_dir_all(dir)?;

    let mut highest = 0u32;
    for entry in fs::read_dir(dir)? {
        let file_name = entry?.file_name();
        let file_name = file_name.to_string_lossy();
        if let Some(version) = sequence_number(&file_name) {
            highest = highest.max(version);
        }
    }

    let path = dir.join(format!("{:03}_{}.sql", highest + 1, description));
    fs::write(&path, format!("-- {}\n", name.trim()))?;

    info!(path = %path.display(), "Created migration");
    Ok(path)
}

/// `"Add Loyalty-Points!"` → `"add_loyalty_points"`.
fn normalize_name(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Leading number of `NNN_description.sql`.
fn sequence_number(file_name: &str) -> Option<u32> {
    if !file_name.ends_with(".sql") {
        return None;
    }
    let (number, _) = file_name.split_once('_')?;
    number.parse().ok()
}
