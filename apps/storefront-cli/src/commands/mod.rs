//! Command implementations.
//!
//! Each command opens its own [`Database`] and prints a short report to
//! stdout; diagnostics go through `tracing`.

pub mod migrate;
pub mod seed;
pub mod tour;

use std::path::Path;

use storefront_db::{DbConfig, DbResult};

/// Builds the connection config: `--db` wins over `STOREFRONT_DB_PATH`,
/// other `STOREFRONT_DB_*` settings still apply.
pub fn resolve_config(db_path: Option<&Path>) -> DbResult<DbConfig> {
    resolve_with(db_path, DbConfig::from_env)
}

fn resolve_with<F>(db_path: Option<&Path>, from_env: F) -> DbResult<DbConfig>
where
    F: FnOnce() -> DbResult<DbConfig>,
{
    let config = from_env()?;
    Ok(match db_path {
        Some(path) => {
            let mut overridden = DbConfig::new(path).run_migrations(config.run_migrations);
            if !overridden.is_in_memory() && !config.is_in_memory() {
                overridden = overridden
                    .max_connections(config.max_connections)
                    .min_connections(config.min_connections);
            }
            overridden
        }
        None => config,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_db_flag_overrides_path() {
        let config = resolve_with(Some(Path::new("shop.db")), || {
            Ok(DbConfig::new("env.db").max_connections(3).run_migrations(false))
        })
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("shop.db"));
        assert_eq!(config.max_connections, 3);
        assert!(!config.run_migrations);
    }

    #[test]
    fn test_env_used_without_flag() {
        let config = resolve_with(None, || Ok(DbConfig::in_memory())).unwrap();
        assert!(config.is_in_memory());
    }

    #[test]
    fn test_env_error_propagates() {
        let result = resolve_with(None, || {
            Err(storefront_db::DbError::invalid_config("KEY", "bad"))
        });
        assert!(result.is_err());
    }
}
