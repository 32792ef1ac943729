//! # Sale Repository
//!
//! Generic operations for sales plus loading of their product and customer.

use std::ops::Deref;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use super::{GenericRepository, Repository};
use crate::error::DbResult;
use crate::loading::{self, LazyReference, WithParent};
use storefront_core::{Customer, Money, Product, Sale};

/// A sale with the product it sold.
pub type SaleWithProduct = WithParent<Sale, Product>;

/// Repository for sales.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    inner: GenericRepository<Sale>,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository {
            inner: GenericRepository::new(pool),
        }
    }

    /// All sales with their product (include).
    pub async fn all_with_product(&self) -> DbResult<Vec<SaleWithProduct>> {
        let sales = self.inner.get_all().await?;
        loading::include_reference(self.inner.pool(), sales).await
    }

    /// Sales attributed to a customer.
    pub async fn for_customer(&self, customer: &Customer) -> DbResult<Vec<Sale>> {
        loading::load_collection::<Customer, Sale>(self.inner.pool(), customer).await
    }

    /// The product of `sale`, fetched on first access.
    pub fn lazy_product(&self, sale: &Sale) -> LazyReference<Sale, Product> {
        LazyReference::new(self.inner.pool().clone(), sale)
    }

    /// Sales with `from <= sale_date < to`, oldest first.
    pub async fn between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> DbResult<Vec<Sale>> {
        debug!(%from, %to, "Listing sales in range");

        let sales = sqlx::query_as::<_, Sale>(
            "SELECT * FROM sales WHERE sale_date >= ?1 AND sale_date < ?2 ORDER BY sale_date, id",
        )
        .bind(from)
        .bind(to)
        .fetch_all(self.inner.pool())
        .await?;

        Ok(sales)
    }

    /// Sum of all sale amounts.
    pub async fn total_amount(&self) -> DbResult<Money> {
        let cents: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(amount_cents), 0) FROM sales")
            .fetch_one(self.inner.pool())
            .await?;

        Ok(Money::from_cents(cents))
    }
}

impl Deref for SaleRepository {
    type Target = GenericRepository<Sale>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
