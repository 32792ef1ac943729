//! # Product ↔ Supplier Repository
//!
//! The many-to-many join table. Rows are keyed by `(product_id, supplier_id)`,
//! so this repository works on pairs rather than going through
//! [`GenericRepository`](super::GenericRepository). Writes apply immediately.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use storefront_core::{Product, ProductSupplier, Supplier};

/// Repository for product/supplier links.
#[derive(Debug, Clone)]
pub struct ProductSupplierRepository {
    pool: SqlitePool,
}

impl ProductSupplierRepository {
    /// Creates a new ProductSupplierRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductSupplierRepository { pool }
    }

    /// All links, ordered by product then supplier.
    pub async fn get_all(&self) -> DbResult<Vec<ProductSupplier>> {
        let links = sqlx::query_as::<_, ProductSupplier>(
            "SELECT product_id, supplier_id FROM product_suppliers ORDER BY product_id, supplier_id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(links)
    }

    /// Links a product to a supplier.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - The pair is already linked
    /// * `Err(DbError::ForeignKeyViolation)` - Either side doesn't exist
    pub async fn link(&self, product_id: i64, supplier_id: i64) -> DbResult<ProductSupplier> {
        debug!(product_id, supplier_id, "Linking product to supplier");

        sqlx::query("INSERT INTO product_suppliers (product_id, supplier_id) VALUES (?1, ?2)")
            .bind(product_id)
            .bind(supplier_id)
            .execute(&self.pool)
            .await?;

        Ok(ProductSupplier {
            product_id,
            supplier_id,
        })
    }

    /// Removes a link. Returns whether a link existed.
    pub async fn unlink(&self, product_id: i64, supplier_id: i64) -> DbResult<bool> {
        debug!(product_id, supplier_id, "Unlinking product from supplier");

        let result =
            sqlx::query("DELETE FROM product_suppliers WHERE product_id = ?1 AND supplier_id = ?2")
                .bind(product_id)
                .bind(supplier_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Suppliers of a product, ordered by id.
    pub async fn suppliers_of(&self, product_id: i64) -> DbResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as::<_, Supplier>(
            r#"
            SELECT s.id, s.name
            FROM suppliers s
            INNER JOIN product_suppliers ps ON ps.supplier_id = s.id
            WHERE ps.product_id = ?1
            ORDER BY s.id
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(suppliers)
    }

    /// Products of a supplier, ordered by id.
    pub async fn products_of(&self, supplier_id: i64) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT p.id, p.name, p.price_cents, p.stock_quantity, p.manufacture_date, p.version
            FROM products p
            INNER JOIN product_suppliers ps ON ps.product_id = p.id
            WHERE ps.supplier_id = ?1
            ORDER BY p.id
            "#,
        )
        .bind(supplier_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::Repository;
    use crate::DbError;
    use chrono::NaiveDate;

    async fn setup() -> (Database, i64, i64) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let products = db.products();
        products
            .add(Product::new("Chair", 7_500, 12, NaiveDate::from_ymd_opt(2022, 8, 8).unwrap()))
            .await;
        let product_id = products.save().await.unwrap().inserted_ids[0];

        let suppliers = db.suppliers();
        suppliers.add(Supplier::new("Initech")).await;
        let supplier_id = suppliers.save().await.unwrap().inserted_ids[0];

        (db, product_id, supplier_id)
    }

    #[tokio::test]
    async fn test_link_both_directions() {
        let (db, product_id, supplier_id) = setup().await;
        let links = db.product_suppliers();

        links.link(product_id, supplier_id).await.unwrap();

        assert_eq!(links.suppliers_of(product_id).await.unwrap()[0].name, "Initech");
        assert_eq!(links.products_of(supplier_id).await.unwrap()[0].name, "Chair");
        assert_eq!(
            links.get_all().await.unwrap(),
            vec![ProductSupplier {
                product_id,
                supplier_id
            }]
        );
    }

    #[tokio::test]
    async fn test_duplicate_link_is_rejected() {
        let (db, product_id, supplier_id) = setup().await;
        let links = db.product_suppliers();

        links.link(product_id, supplier_id).await.unwrap();
        let err = links.link(product_id, supplier_id).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_link_to_missing_supplier() {
        let (db, product_id, supplier_id) = setup().await;
        let err = db
            .product_suppliers()
            .link(product_id, supplier_id + 1)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_unlink_and_cascade() {
        let (db, product_id, supplier_id) = setup().await;
        let links = db.product_suppliers();

        assert!(!links.unlink(product_id, supplier_id).await.unwrap());

        links.link(product_id, supplier_id).await.unwrap();
        assert!(links.unlink(product_id, supplier_id).await.unwrap());

        links.link(product_id, supplier_id).await.unwrap();
        let suppliers = db.suppliers();
        suppliers.delete(supplier_id).await;
        suppliers.save().await.unwrap();
        assert!(links.get_all().await.unwrap().is_empty());
    }
}
