//! `storefront migrate status|run|add`.

use std::path::Path;

use storefront_db::migrations::scaffold_migration;
use storefront_db::{Database, DbConfig, DbResult};
use tracing::info;

/// Prints applied / total migrations without applying anything.
pub async fn status(config: DbConfig) -> DbResult<()> {
    let db = Database::new(config.run_migrations(false)).await?;
    let (total, applied) = db.migration_status().await?;
    db.close().await;

    println!("Migrations: {applied}/{total} applied");
    if applied < total {
        println!("{} pending - run `storefront migrate run`", total - applied);
    }
    Ok(())
}

/// Applies every pending migration.
pub async fn run(config: DbConfig) -> DbResult<()> {
    let db = Database::new(config.run_migrations(false)).await?;
    let (total, before) = db.migration_status().await?;

    db.run_migrations().await?;
    let (_, after) = db.migration_status().await?;
    db.close().await;

    info!(applied = after - before, "Migration run finished");
    println!("Applied {} migration(s); {after}/{total} now applied", after - before);
    Ok(())
}

/// Creates the next numbered migration file in `dir`.
pub fn add(dir: &Path, name: &str) -> DbResult<()> {
    let path = scaffold_migration(dir, name)?;
    println!("Created {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_then_status() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shop.db");

        run(DbConfig::new(&path)).await.unwrap();
        status(DbConfig::new(&path)).await.unwrap();

        let db = Database::new(DbConfig::new(&path).run_migrations(false))
            .await
            .unwrap();
        let (total, applied) = db.migration_status().await.unwrap();
        assert_eq!(total, applied);
    }

    #[test]
    fn test_add_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        add(dir.path(), "loyalty points").unwrap();
        assert!(dir.path().join("001_loyalty_points.sql").exists());
    }
}
