//! # Entity Mapping
//!
//! Maps `storefront-core` entities onto their tables.
//!
//! ## What an Entity Declares
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  impl Entity for Product                                                │
//! │  ├── NAME            "Product"          (error messages, logs)          │
//! │  ├── TABLE           "products"                                         │
//! │  ├── COLUMNS         name, price_cents, stock_quantity, ...             │
//! │  ├── VERSION_COLUMN  Some("version")    (optimistic concurrency)        │
//! │  └── bind_columns()  binds COLUMNS in order                             │
//! │                                                                         │
//! │  From this the generic repository derives every statement:              │
//! │    SELECT * FROM products ORDER BY id                                   │
//! │    INSERT INTO products (name, ...) VALUES (?, ...)                     │
//! │    UPDATE products SET name = ?, ..., version = version + 1             │
//! │        WHERE id = ? AND version = ?                                     │
//! │    DELETE FROM products WHERE id = ?                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `id` column is always `INTEGER PRIMARY KEY` and is never part of
//! `COLUMNS`; the database assigns it on insert.

use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{FromRow, Sqlite};
use storefront_core::{Customer, Product, Sale, Supplier, Validate};

/// A runtime-built SQLite query awaiting binds.
pub type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// Table mapping for an entity with a single integer key.
pub trait Entity:
    for<'r> FromRow<'r, SqliteRow> + Validate + Clone + Send + Sync + Unpin + 'static
{
    /// Human-readable entity name.
    const NAME: &'static str;

    const TABLE: &'static str;

    /// Writable columns, excluding `id` and the version column.
    const COLUMNS: &'static [&'static str];

    /// Concurrency token column, if the entity has one.
    const VERSION_COLUMN: Option<&'static str> = None;

    fn id(&self) -> i64;

    /// Current concurrency token. `None` for unversioned entities.
    fn version(&self) -> Option<i64> {
        None
    }

    /// Overwrites the concurrency token. No-op for unversioned entities.
    fn set_version(&mut self, _version: i64) {}

    /// Binds the values of [`Entity::COLUMNS`], in order.
    fn bind_columns<'q>(&self, query: SqliteQuery<'q>) -> SqliteQuery<'q>;
}

// =============================================================================
// Statement Builders
// =============================================================================

pub(crate) fn select_all_sql<T: Entity>() -> String {
    format!("SELECT * FROM {} ORDER BY id", T::TABLE)
}

pub(crate) fn select_by_id_sql<T: Entity>() -> String {
    format!("SELECT * FROM {} WHERE id = ?", T::TABLE)
}

pub(crate) fn exists_sql<T: Entity>() -> String {
    format!("SELECT EXISTS (SELECT 1 FROM {} WHERE id = ?)", T::TABLE)
}

pub(crate) fn insert_sql<T: Entity>() -> String {
    let placeholders = vec!["?"; T::COLUMNS.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        T::TABLE,
        T::COLUMNS.join(", "),
        placeholders
    )
}

/// `UPDATE` statement. Binds: COLUMNS, then id, then the expected version
/// when the entity is versioned.
pub(crate) fn update_sql<T: Entity>() -> String {
    let mut assignments: Vec<String> = T::COLUMNS.iter().map(|c| format!("{c} = ?")).collect();

    match T::VERSION_COLUMN {
        Some(version) => {
            assignments.push(format!("{version} = {version} + 1"));
            format!(
                "UPDATE {} SET {} WHERE id = ? AND {version} = ?",
                T::TABLE,
                assignments.join(", ")
            )
        }
        None => format!("UPDATE {} SET {} WHERE id = ?", T::TABLE, assignments.join(", ")),
    }
}

pub(crate) fn delete_sql<T: Entity>() -> String {
    format!("DELETE FROM {} WHERE id = ?", T::TABLE)
}

// =============================================================================
// Mappings
// =============================================================================

impl Entity for Product {
    const NAME: &'static str = "Product";
    const TABLE: &'static str = "products";
    const COLUMNS: &'static [&'static str] =
        &["name", "price_cents", "stock_quantity", "manufacture_date"];
    const VERSION_COLUMN: Option<&'static str> = Some("version");

    fn id(&self) -> i64 {
        self.id
    }

    fn version(&self) -> Option<i64> {
        Some(self.version)
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }

    fn bind_columns<'q>(&self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(self.name.clone())
            .bind(self.price_cents)
            .bind(self.stock_quantity)
            .bind(self.manufacture_date)
    }
}

impl Entity for Sale {
    const NAME: &'static str = "Sale";
    const TABLE: &'static str = "sales";
    const COLUMNS: &'static [&'static str] =
        &["product_id", "customer_id", "amount_cents", "sale_date"];

    fn id(&self) -> i64 {
        self.id
    }

    fn bind_columns<'q>(&self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(self.product_id)
            .bind(self.customer_id)
            .bind(self.amount_cents)
            .bind(self.sale_date)
    }
}

impl Entity for Supplier {
    const NAME: &'static str = "Supplier";
    const TABLE: &'static str = "suppliers";
    const COLUMNS: &'static [&'static str] = &["name"];

    fn id(&self) -> i64 {
        self.id
    }

    fn bind_columns<'q>(&self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query.bind(self.name.clone())
    }
}

impl Entity for Customer {
    const NAME: &'static str = "Customer";
    const TABLE: &'static str = "customers";
    const COLUMNS: &'static [&'static str] = &["name"];

    fn id(&self) -> i64 {
        self.id
    }

    fn bind_columns<'q>(&self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query.bind(self.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versioned_update_sql() {
        assert_eq!(
            update_sql::<Product>(),
            "UPDATE products SET name = ?, price_cents = ?, stock_quantity = ?, \
             manufacture_date = ?, version = version + 1 WHERE id = ? AND version = ?"
        );
    }

    #[test]
    fn test_plain_update_sql() {
        assert_eq!(
            update_sql::<Supplier>(),
            "UPDATE suppliers SET name = ? WHERE id = ?"
        );
    }

    #[test]
    fn test_insert_sql() {
        assert_eq!(
            insert_sql::<Sale>(),
            "INSERT INTO sales (product_id, customer_id, amount_cents, sale_date) \
             VALUES (?, ?, ?, ?)"
        );
    }

    #[test]
    fn test_unversioned_entities_have_no_token() {
        let mut supplier = Supplier::new("Acme");
        supplier.set_version(9);
        assert_eq!(supplier.version(), None);
        assert_eq!(Customer::VERSION_COLUMN, None);
    }
}
