//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)      ValidationError (storefront-core)      │
//! │       │                                │                                │
//! │       ▼                                ▼                                │
//! │  DbError (this module) ← Adds context and categorization                │
//! │       │                                                                 │
//! │       ├── ConcurrencyConflict  → caller reloads and retries             │
//! │       └── everything else      → persistence failure, reported as-is    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use storefront_core::ValidationError;
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The row was changed by someone else since it was read.
    ///
    /// ## When This Occurs
    /// - An update carries a `version` older than the stored one
    ///
    /// The save that raised it has been rolled back; reload the row
    /// (see [`crate::concurrency`]) and apply the change again.
    #[error("{entity} {id} was modified concurrently (expected version {expected_version})")]
    ConcurrencyConflict {
        entity: String,
        id: i64,
        expected_version: i64,
    },

    /// Unique constraint violation.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Sale referencing a non-existent product_id or customer_id
    /// - Linking a product to a non-existent supplier
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Entity failed its field rules before reaching the database.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed (including CHECK constraint failures).
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// A configuration value could not be parsed.
    #[error("Invalid configuration for {key}: {reason}")]
    InvalidConfig { key: String, reason: String },

    /// Embedded seed data could not be decoded.
    #[error("Invalid seed data: {0}")]
    InvalidSeedData(String),

    /// Filesystem error (migration scaffolding).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Creates a ConcurrencyConflict error.
    pub fn conflict(entity: impl Into<String>, id: i64, expected_version: i64) -> Self {
        DbError::ConcurrencyConflict {
            entity: entity.into(),
            id,
            expected_version,
        }
    }

    /// Creates an InvalidConfig error.
    pub fn invalid_config(key: impl Into<String>, reason: impl Into<String>) -> Self {
        DbError::InvalidConfig {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// True for the optimistic-concurrency category, which callers usually
    /// handle by reloading; every other variant is a plain persistence failure.
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, DbError::ConcurrencyConflict { .. })
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite constraint messages:
                // "UNIQUE constraint failed: <table>.<column>"
                // "FOREIGN KEY constraint failed"
                if let Some(field) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    DbError::UniqueViolation {
                        field: field.to_string(),
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::InvalidSeedData(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_category() {
        let err = DbError::conflict("Product", 4, 2);
        assert!(err.is_concurrency_conflict());
        assert_eq!(
            err.to_string(),
            "Product 4 was modified concurrently (expected version 2)"
        );

        assert!(!DbError::not_found("Product", 4).is_concurrency_conflict());
    }

    #[test]
    fn test_validation_converts() {
        let err: DbError = ValidationError::Required {
            field: "name".to_string(),
        }
        .into();
        assert!(matches!(err, DbError::Validation(_)));
        assert_eq!(err.to_string(), "Validation failed: name is required");
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
