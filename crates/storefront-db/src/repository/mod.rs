//! # Repository Module
//!
//! Data access for the catalogue entities.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  let repo = db.repository::<Supplier>();                                │
//! │       │                                                                 │
//! │       │  repo.add(supplier)      ─┐                                     │
//! │       │  repo.update(other)       ├─ staged in memory                   │
//! │       │  repo.delete(7)          ─┘                                     │
//! │       │                                                                 │
//! │       │  repo.save()             ── one transaction, staging order      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! │                                                                         │
//! │  Reads (get_all, get_by_id) always go straight to the database.         │
//! │  A failed save rolls back every staged change and clears the stage.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`GenericRepository`] - The [`Repository`] implementation for any [`Entity`]
//! - [`ProductRepository`] - Generic operations plus eager/lazy loading of sales and suppliers
//! - [`SaleRepository`] - Generic operations plus sales with their product
//! - [`ProductSupplierRepository`] - The composite-key join table
//!
//! [`Entity`]: crate::entity::Entity

use async_trait::async_trait;

use crate::entity::Entity;
use crate::error::DbResult;

pub mod generic;
pub mod product;
pub mod product_supplier;
pub mod sale;

pub use generic::GenericRepository;
pub use product::ProductRepository;
pub use product_supplier::ProductSupplierRepository;
pub use sale::SaleRepository;

/// Result of applying staged changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveOutcome {
    /// Total rows inserted, updated and deleted.
    pub rows_affected: u64,

    /// Ids assigned to staged inserts, in staging order.
    pub inserted_ids: Vec<i64>,
}

/// Generic data-access contract.
///
/// Writes are staged and only reach the database on [`Repository::save`].
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// Returns every row, ordered by id.
    async fn get_all(&self) -> DbResult<Vec<T>>;

    /// Returns the row with `id`, if any.
    async fn get_by_id(&self, id: i64) -> DbResult<Option<T>>;

    /// Stages an insert. The entity's own `id` is ignored.
    async fn add(&self, entity: T);

    /// Stages an update of the row with `entity.id()`.
    async fn update(&self, entity: T);

    /// Stages a delete. A missing id is not an error.
    async fn delete(&self, id: i64);

    /// Applies all staged changes in one transaction.
    async fn save(&self) -> DbResult<SaveOutcome>;
}
