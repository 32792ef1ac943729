//! # Product Repository
//!
//! Generic operations for products plus loading of their sales and suppliers.
//!
//! ## Key Operations
//! - Everything on [`GenericRepository<Product>`] (via `Deref`)
//! - Eager: [`ProductRepository::all_with_sales`], [`ProductRepository::get_with_sales`],
//!   [`ProductRepository::get_with_suppliers`]
//! - Lazy: [`ProductRepository::get_lazy`]
//! - Low stock listing

use std::ops::Deref;

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;

use super::{GenericRepository, ProductSupplierRepository, Repository};
use crate::error::DbResult;
use crate::loading::{self, LazyCollection, WithChildren};
use storefront_core::{Money, Product, Sale, Supplier};

/// A product with all of its sales.
pub type ProductWithSales = WithChildren<Product, Sale>;

impl WithChildren<Product, Sale> {
    /// Sum of the loaded sale amounts.
    pub fn total_sales(&self) -> Money {
        self.children.iter().map(Sale::amount).sum()
    }
}

/// A product with all of its suppliers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductWithSuppliers {
    pub product: Product,
    pub suppliers: Vec<Supplier>,
}

/// A product whose sales are fetched on first access.
#[derive(Debug)]
pub struct LazyProduct {
    pub product: Product,
    pub sales: LazyCollection<Product, Sale>,
}

/// Repository for products.
///
/// ## Usage
/// ```rust,ignore
/// let products = db.products();
///
/// // Generic operations
/// products.add(Product::new("Laptop", 99_900, 5, date)).await;
/// products.save().await?;
///
/// // Eager loading
/// let catalogue = products.all_with_sales().await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    inner: GenericRepository<Product>,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository {
            inner: GenericRepository::new(pool),
        }
    }

    /// All products with their sales (include).
    pub async fn all_with_sales(&self) -> DbResult<Vec<ProductWithSales>> {
        let products = self.inner.get_all().await?;
        loading::include(self.inner.pool(), products).await
    }

    /// One product with its sales (include).
    pub async fn get_with_sales(&self, id: i64) -> DbResult<Option<ProductWithSales>> {
        let Some(product) = self.inner.get_by_id(id).await? else {
            return Ok(None);
        };

        let mut included = loading::include(self.inner.pool(), vec![product]).await?;
        Ok(included.pop())
    }

    /// One product with its suppliers, through the join table.
    pub async fn get_with_suppliers(&self, id: i64) -> DbResult<Option<ProductWithSuppliers>> {
        let Some(product) = self.inner.get_by_id(id).await? else {
            return Ok(None);
        };

        let suppliers = ProductSupplierRepository::new(self.inner.pool().clone())
            .suppliers_of(product.id)
            .await?;

        Ok(Some(ProductWithSuppliers { product, suppliers }))
    }

    /// One product whose sales stay unloaded until first accessed.
    pub async fn get_lazy(&self, id: i64) -> DbResult<Option<LazyProduct>> {
        let product = self.inner.get_by_id(id).await?;

        Ok(product.map(|product| LazyProduct {
            sales: LazyCollection::new(self.inner.pool().clone(), &product),
            product,
        }))
    }

    /// Products with fewer than `threshold` units in stock, lowest first.
    pub async fn low_stock(&self, threshold: i64) -> DbResult<Vec<Product>> {
        debug!(threshold, "Listing low-stock products");

        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE stock_quantity < ?1 ORDER BY stock_quantity, id",
        )
        .bind(threshold)
        .fetch_all(self.inner.pool())
        .await?;

        Ok(products)
    }
}

impl Deref for ProductRepository {
    type Target = GenericRepository<Product>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::{NaiveDate, Utc};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 11, 20).unwrap()
    }

    async fn seeded() -> (Database, i64, i64) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let products = db.products();
        products.add(Product::new("Monitor", 24_900, 4, date())).await;
        products.add(Product::new("Cable", 900, 200, date())).await;
        let ids = products.save().await.unwrap().inserted_ids;

        let sales = db.sales();
        sales.add(Sale::new(ids[0], 24_900, Utc::now())).await;
        sales.add(Sale::new(ids[0], 22_000, Utc::now())).await;
        sales.save().await.unwrap();

        (db, ids[0], ids[1])
    }

    #[tokio::test]
    async fn test_all_with_sales() {
        let (db, monitor, _) = seeded().await;
        let catalogue = db.products().all_with_sales().await.unwrap();

        assert_eq!(catalogue.len(), 2);
        assert_eq!(catalogue[0].parent.id, monitor);
        assert_eq!(catalogue[0].children.len(), 2);
        assert_eq!(catalogue[0].total_sales().cents(), 46_900);
        assert!(catalogue[1].children.is_empty());
        assert!(catalogue[1].total_sales().is_zero());
    }

    #[tokio::test]
    async fn test_get_with_sales_missing() {
        let (db, _, _) = seeded().await;
        assert!(db.products().get_with_sales(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_lazy() {
        let (db, monitor, _) = seeded().await;
        let lazy = db.products().get_lazy(monitor).await.unwrap().unwrap();

        assert_eq!(lazy.product.name, "Monitor");
        assert!(!lazy.sales.is_loaded());
        assert_eq!(lazy.sales.get().await.unwrap().len(), 2);
        assert!(lazy.sales.is_loaded());
    }

    #[tokio::test]
    async fn test_get_with_suppliers() {
        let (db, monitor, cable) = seeded().await;
        let suppliers = db.suppliers();
        suppliers.add(Supplier::new("Acme")).await;
        suppliers.add(Supplier::new("Globex")).await;
        let supplier_ids = suppliers.save().await.unwrap().inserted_ids;

        let links = db.product_suppliers();
        links.link(monitor, supplier_ids[0]).await.unwrap();
        links.link(monitor, supplier_ids[1]).await.unwrap();

        let loaded = db.products().get_with_suppliers(monitor).await.unwrap().unwrap();
        let names: Vec<&str> = loaded.suppliers.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Acme", "Globex"]);

        let loaded = db.products().get_with_suppliers(cable).await.unwrap().unwrap();
        assert!(loaded.suppliers.is_empty());
    }

    #[tokio::test]
    async fn test_low_stock() {
        let (db, monitor, _) = seeded().await;
        let low = db.products().low_stock(10).await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].id, monitor);
    }

    #[tokio::test]
    async fn test_deleting_product_cascades_to_sales() {
        let (db, monitor, _) = seeded().await;
        let products = db.products();
        products.delete(monitor).await;
        products.save().await.unwrap();

        assert_eq!(db.sales().count().await.unwrap(), 0);
    }
}
