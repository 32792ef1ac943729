//! # storefront-db: Database Layer
//!
//! SQLite persistence for the catalogue entities, built on sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  storefront-cli / library callers                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                  storefront-db (THIS CRATE)                     │    │
//! │  │                                                                 │    │
//! │  │  ┌────────────┐  ┌──────────────┐  ┌────────────┐  ┌─────────┐  │    │
//! │  │  │  Database  │  │ Repositories │  │  Loading   │  │ Migra-  │  │    │
//! │  │  │ (pool.rs)  │◄─│ generic +    │  │ eager /    │  │ tions   │  │    │
//! │  │  │            │  │ per-entity   │  │ explicit / │  │ + seed  │  │    │
//! │  │  │ SqlitePool │  │              │  │ lazy       │  │         │  │    │
//! │  │  └────────────┘  └──────────────┘  └────────────┘  └─────────┘  │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (file or in-memory)                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Configuration and the [`Database`] context
//! - [`entity`] - Entity → table mapping
//! - [`repository`] - The [`Repository`] trait and its implementations
//! - [`loading`] - Relationships and eager/explicit/lazy loading
//! - [`concurrency`] - Reconciling optimistic-concurrency conflicts
//! - [`migrations`] - Embedded migrations and scaffolding
//! - [`seed`] - Embedded demo catalogue
//! - [`error`] - Database error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use storefront_db::{Database, DbConfig, Repository};
//!
//! let db = Database::new(DbConfig::new("storefront.db")).await?;
//!
//! let products = db.products();
//! products.add(Product::new("Laptop", 129_900, 12, date)).await;
//! products.save().await?;
//!
//! let catalogue = products.all_with_sales().await?;
//! ```

pub mod concurrency;
pub mod entity;
pub mod error;
pub mod loading;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod seed;

// =============================================================================
// Re-exports
// =============================================================================

pub use concurrency::{resolve_conflict, ConflictStrategy};
pub use entity::Entity;
pub use error::{DbError, DbResult};
pub use loading::{BelongsTo, LazyCollection, LazyReference, WithChildren, WithParent};
pub use pool::{Database, DbConfig};
pub use repository::{
    GenericRepository, ProductRepository, ProductSupplierRepository, Repository, SaleRepository,
    SaveOutcome,
};
pub use seed::SeedSummary;
