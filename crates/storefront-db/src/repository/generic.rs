//! # Generic Repository
//!
//! [`Repository`] implementation shared by every [`Entity`].
//!
//! ## Save Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  save()                                                                 │
//! │    │                                                                    │
//! │    ├── take staged changes (stage is now empty)                         │
//! │    ├── validate every staged insert/update  ── ValidationError? abort   │
//! │    ├── BEGIN                                                            │
//! │    ├── for each change, in staging order:                               │
//! │    │     Insert  → INSERT, record last_insert_rowid                     │
//! │    │     Update  → UPDATE ... WHERE id = ? [AND version = ?]            │
//! │    │               0 rows: row exists → ConcurrencyConflict             │
//! │    │                       row gone   → NotFound                        │
//! │    │     Delete  → DELETE ... WHERE id = ?   (0 rows is fine)           │
//! │    └── COMMIT   (any error above drops the transaction → ROLLBACK)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{Repository, SaveOutcome};
use crate::entity::{self, Entity};
use crate::error::{DbError, DbResult};

/// A write waiting for [`Repository::save`].
#[derive(Debug, Clone)]
enum PendingChange<T> {
    Insert(T),
    Update(T),
    Delete(i64),
}

/// Repository over any [`Entity`].
///
/// Staged changes belong to this instance; keep the same repository around
/// between `add`/`update`/`delete` and `save`.
///
/// ## Usage
/// ```rust,ignore
/// let suppliers = db.repository::<Supplier>();
/// suppliers.add(Supplier::new("Acme")).await;
/// let outcome = suppliers.save().await?;
/// let acme = suppliers.get_by_id(outcome.inserted_ids[0]).await?;
/// ```
#[derive(Debug)]
pub struct GenericRepository<T: Entity> {
    pool: SqlitePool,
    pending: Mutex<Vec<PendingChange<T>>>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> GenericRepository<T> {
    pub fn new(pool: SqlitePool) -> Self {
        GenericRepository {
            pool,
            pending: Mutex::new(Vec::new()),
            _entity: PhantomData,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Number of changes waiting for `save`.
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Drops every staged change without touching the database.
    pub async fn discard(&self) {
        self.pending.lock().await.clear();
    }

    /// Counts rows in the entity's table.
    pub async fn count(&self) -> DbResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", T::TABLE);
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn stage(&self, change: PendingChange<T>) {
        self.pending.lock().await.push(change);
    }

    async fn apply(&self, changes: &[PendingChange<T>]) -> DbResult<SaveOutcome> {
        let mut tx = self.pool.begin().await?;
        let mut outcome = SaveOutcome::default();

        for change in changes {
            match change {
                PendingChange::Insert(entity) => {
                    let sql = entity::insert_sql::<T>();
                    let result = entity
                        .bind_columns(sqlx::query(&sql))
                        .execute(&mut *tx)
                        .await?;

                    let id = result.last_insert_rowid();
                    debug!(entity = T::NAME, id, "Inserted");
                    outcome.rows_affected += result.rows_affected();
                    outcome.inserted_ids.push(id);
                }

                PendingChange::Update(entity) => {
                    let id = entity.id();
                    let sql = entity::update_sql::<T>();
                    let mut query = entity.bind_columns(sqlx::query(&sql)).bind(id);
                    let expected_version = match T::VERSION_COLUMN {
                        Some(_) => entity.version(),
                        None => None,
                    };
                    if let Some(version) = expected_version {
                        query = query.bind(version);
                    }

                    let result = query.execute(&mut *tx).await?;

                    if result.rows_affected() == 0 {
                        let exists_sql = entity::exists_sql::<T>();
                        let exists: i64 = sqlx::query_scalar(&exists_sql)
                            .bind(id)
                            .fetch_one(&mut *tx)
                            .await?;

                        return Err(match expected_version {
                            Some(version) if exists != 0 => {
                                warn!(entity = T::NAME, id, version, "Stale update rejected");
                                DbError::conflict(T::NAME, id, version)
                            }
                            _ => DbError::not_found(T::NAME, id),
                        });
                    }

                    debug!(entity = T::NAME, id, "Updated");
                    outcome.rows_affected += result.rows_affected();
                }

                PendingChange::Delete(id) => {
                    let sql = entity::delete_sql::<T>();
                    let result = sqlx::query(&sql).bind(*id).execute(&mut *tx).await?;

                    debug!(entity = T::NAME, id, rows = result.rows_affected(), "Deleted");
                    outcome.rows_affected += result.rows_affected();
                }
            }
        }

        tx.commit().await?;
        Ok(outcome)
    }
}

impl<T: Entity> Clone for GenericRepository<T> {
    /// Clones share the pool but start with an empty stage.
    fn clone(&self) -> Self {
        GenericRepository::new(self.pool.clone())
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for GenericRepository<T> {
    async fn get_all(&self) -> DbResult<Vec<T>> {
        let sql = entity::select_all_sql::<T>();
        let rows = sqlx::query_as::<_, T>(&sql).fetch_all(&self.pool).await?;

        debug!(entity = T::NAME, count = rows.len(), "Loaded all");
        Ok(rows)
    }

    async fn get_by_id(&self, id: i64) -> DbResult<Option<T>> {
        let sql = entity::select_by_id_sql::<T>();
        let row = sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn add(&self, entity: T) {
        self.stage(PendingChange::Insert(entity)).await;
    }

    async fn update(&self, entity: T) {
        self.stage(PendingChange::Update(entity)).await;
    }

    async fn delete(&self, id: i64) {
        self.stage(PendingChange::Delete(id)).await;
    }

    async fn save(&self) -> DbResult<SaveOutcome> {
        let changes = std::mem::take(&mut *self.pending.lock().await);
        if changes.is_empty() {
            return Ok(SaveOutcome::default());
        }

        for change in &changes {
            if let PendingChange::Insert(entity) | PendingChange::Update(entity) = change {
                entity.validate()?;
            }
        }

        debug!(entity = T::NAME, changes = changes.len(), "Saving staged changes");
        self.apply(&changes).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
