//! # Seed Data
//!
//! A small demo catalogue embedded in the binary (`seed/catalog.json`).
//!
//! ## Idempotency
//! Every seed row carries an explicit id and is written with
//! `INSERT OR IGNORE`, so seeding an already-seeded database inserts nothing.
//! Rows are written parents first (products, suppliers, customers), then
//! links and sales, all in one transaction.

use serde::{Deserialize, Serialize};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};

use crate::entity::Entity;
use crate::error::DbResult;
use storefront_core::{Customer, Product, ProductSupplier, Sale, Supplier, Validate};

const CATALOG_JSON: &str = include_str!("../seed/catalog.json");

/// The decoded seed catalogue.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedData {
    pub products: Vec<Product>,
    pub suppliers: Vec<Supplier>,
    pub product_suppliers: Vec<ProductSupplier>,
    pub customers: Vec<Customer>,
    pub sales: Vec<Sale>,
}

/// Rows inserted by one seeding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub products: u64,
    pub suppliers: u64,
    pub product_suppliers: u64,
    pub customers: u64,
    pub sales: u64,
}

impl SeedSummary {
    pub fn total(&self) -> u64 {
        self.products + self.suppliers + self.product_suppliers + self.customers + self.sales
    }
}

impl SeedData {
    /// Decodes the embedded catalogue.
    pub fn embedded() -> DbResult<Self> {
        Ok(serde_json::from_str(CATALOG_JSON)?)
    }
}

/// Writes `data`, skipping rows whose keys already exist.
pub async fn apply(pool: &SqlitePool, data: &SeedData) -> DbResult<SeedSummary> {
    let mut tx = pool.begin().await?;

    let summary = SeedSummary {
        products: insert_all(&mut tx, &data.products).await?,
        suppliers: insert_all(&mut tx, &data.suppliers).await?,
        customers: insert_all(&mut tx, &data.customers).await?,
        product_suppliers: insert_links(&mut tx, &data.product_suppliers).await?,
        sales: insert_all(&mut tx, &data.sales).await?,
    };

    tx.commit().await?;

    info!(inserted = summary.total(), "Seed data applied");
    Ok(summary)
}

async fn insert_all<T: Entity>(tx: &mut Transaction<'_, Sqlite>, rows: &[T]) -> DbResult<u64> {
    let placeholders = vec!["?"; T::COLUMNS.len() + 1].join(", ");
    let sql = format!(
        "INSERT OR IGNORE INTO {} (id, {}) VALUES ({})",
        T::TABLE,
        T::COLUMNS.join(", "),
        placeholders
    );

    let mut inserted = 0;
    for row in rows {
        row.validate()?;
        let result = row
            .bind_columns(sqlx::query(&sql).bind(row.id()))
            .execute(&mut **tx)
            .await?;
        inserted += result.rows_affected();
    }

    debug!(entity = T::NAME, inserted, "Seeded");
    Ok(inserted)
}

async fn insert_links(
    tx: &mut Transaction<'_, Sqlite>,
    links: &[ProductSupplier],
) -> DbResult<u64> {
    let mut inserted = 0;
    for link in links {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO product_suppliers (product_id, supplier_id) VALUES (?1, ?2)",
        )
        .bind(link.product_id)
        .bind(link.supplier_id)
        .execute(&mut **tx)
        .await?;
        inserted += result.rows_affected();
    }

    debug!(inserted, "Seeded product/supplier links");
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::Repository;

    #[test]
    fn test_embedded_catalogue_decodes_and_validates() {
        let data = SeedData::embedded().unwrap();
        assert!(!data.products.is_empty());
        assert!(data.products.iter().all(|p| p.validate().is_ok()));
        assert!(data.sales.iter().all(|s| s.validate().is_ok()));
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let data = SeedData::embedded().unwrap();

        let first = db.seed().await.unwrap();
        assert_eq!(first.products, data.products.len() as u64);
        assert_eq!(first.sales, data.sales.len() as u64);
        assert_eq!(first.product_suppliers, data.product_suppliers.len() as u64);

        let second = db.seed().await.unwrap();
        assert_eq!(second, SeedSummary::default());
        assert_eq!(second.total(), 0);

        assert_eq!(
            db.products().get_all().await.unwrap().len(),
            data.products.len()
        );
    }

    #[tokio::test]
    async fn test_seeded_rows_start_at_version_one() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.seed().await.unwrap();

        let products = db.products().get_all().await.unwrap();
        assert!(products.iter().all(|p| p.version == 1));
    }
}
