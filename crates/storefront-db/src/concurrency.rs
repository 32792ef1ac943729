//! # Optimistic Concurrency
//!
//! What to do after a save fails with [`DbError::ConcurrencyConflict`].
//!
//! ## Conflict Workflow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Reader A: get_by_id(1) → version 3      Reader B: get_by_id(1) → v3    │
//! │                                                                         │
//! │  A: update + save  → UPDATE ... WHERE id = 1 AND version = 3   ✓ (v4)   │
//! │  B: update + save  → UPDATE ... WHERE id = 1 AND version = 3   ✗ 0 rows │
//! │                      → DbError::ConcurrencyConflict                     │
//! │                                                                         │
//! │  B: resolve_conflict(repo, &stale, strategy)                            │
//! │       DatabaseWins → A's row as stored (B's edits dropped)              │
//! │       ClientWins   → B's values carrying version 4                      │
//! │  B: update + save again                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::entity::Entity;
use crate::error::{DbError, DbResult};
use crate::repository::Repository;

/// How to reconcile a stale entity with the stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictStrategy {
    /// Discard local edits and continue with the stored row.
    #[default]
    DatabaseWins,
    /// Keep local edits and adopt the stored version so they can be saved.
    ClientWins,
}

/// Reconciles `stale` with the current row.
///
/// ## Returns
/// * `Ok(T)` - Entity to continue with (stage it again for `ClientWins`)
/// * `Err(DbError::NotFound)` - The row was deleted in the meantime
pub async fn resolve_conflict<T, R>(repo: &R, stale: &T, strategy: ConflictStrategy) -> DbResult<T>
where
    T: Entity,
    R: Repository<T> + ?Sized,
{
    let id = stale.id();
    let current = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| DbError::not_found(T::NAME, id))?;

    info!(entity = T::NAME, id, ?strategy, "Resolving concurrency conflict");

    match strategy {
        ConflictStrategy::DatabaseWins => Ok(current),
        ConflictStrategy::ClientWins => {
            let mut merged = stale.clone();
            if let Some(version) = current.version() {
                merged.set_version(version);
            }
            Ok(merged)
        }
    }
}
