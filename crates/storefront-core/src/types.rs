//! # Entity Types
//!
//! The catalogue entities persisted by `storefront-db`.
//!
//! ## Relationships
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ┌───────────────┐ 1     * ┌───────────────┐ *     1 ┌──────────────┐   │
//! │  │    Product    │─────────│     Sale      │─────────│   Customer   │   │
//! │  │  id           │         │  id           │ (opt.)  │  id          │   │
//! │  │  name         │         │  product_id   │         │  name        │   │
//! │  │  price_cents  │         │  customer_id  │         └──────────────┘   │
//! │  │  stock_qty    │         │  amount_cents │                            │
//! │  │  mfg_date     │         │  sale_date    │                            │
//! │  │  version      │         └───────────────┘                            │
//! │  └───────┬───────┘                                                      │
//! │          │ *                                                            │
//! │  ┌───────┴─────────┐ *   1 ┌──────────────┐                             │
//! │  │ ProductSupplier │───────│   Supplier   │                             │
//! │  │ (product_id,    │       │  id          │                             │
//! │  │  supplier_id)   │       │  name        │                             │
//! │  └─────────────────┘       └──────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Ids are SQLite `INTEGER PRIMARY KEY` values. An entity that has not been
//! saved yet carries [`UNSAVED_ID`] and receives its id from the database.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

/// Id carried by entities that have not been inserted yet.
pub const UNSAVED_ID: i64 = 0;

// =============================================================================
// Product
// =============================================================================

/// A product in the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,

    /// Display name, at most [`MAX_NAME_LEN`](crate::MAX_NAME_LEN) characters.
    pub name: String,

    /// Unit price in cents.
    pub price_cents: i64,

    /// Units currently in stock.
    pub stock_quantity: i64,

    pub manufacture_date: NaiveDate,

    /// Concurrency token. Incremented by the database on every accepted
    /// update; an update carrying an older value is rejected.
    #[serde(default)]
    pub version: i64,
}

impl Product {
    /// Creates an unsaved product.
    pub fn new(
        name: impl Into<String>,
        price_cents: i64,
        stock_quantity: i64,
        manufacture_date: NaiveDate,
    ) -> Self {
        Product {
            id: UNSAVED_ID,
            name: name.into(),
            price_cents,
            stock_quantity,
            manufacture_date,
            version: 0,
        }
    }

    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Value of the units in stock at the current price.
    pub fn stock_value(&self) -> Money {
        self.price() * self.stock_quantity
    }

    #[inline]
    pub fn is_new(&self) -> bool {
        self.id == UNSAVED_ID
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A sale of a product, optionally attributed to a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: i64,
    pub product_id: i64,
    #[serde(default)]
    pub customer_id: Option<i64>,
    pub amount_cents: i64,
    pub sale_date: DateTime<Utc>,
}

impl Sale {
    /// Creates an unsaved sale.
    pub fn new(product_id: i64, amount_cents: i64, sale_date: DateTime<Utc>) -> Self {
        Sale {
            id: UNSAVED_ID,
            product_id,
            customer_id: None,
            amount_cents,
            sale_date,
        }
    }

    /// Attributes the sale to a customer.
    pub fn for_customer(mut self, customer_id: i64) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Supplier
// =============================================================================

/// A supplier of one or more products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Supplier {
    pub id: i64,
    pub name: String,
}

impl Supplier {
    pub fn new(name: impl Into<String>) -> Self {
        Supplier {
            id: UNSAVED_ID,
            name: name.into(),
        }
    }
}

// =============================================================================
// Product ↔ Supplier
// =============================================================================

/// Association row between a product and a supplier.
/// The pair `(product_id, supplier_id)` is the primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ProductSupplier {
    pub product_id: i64,
    pub supplier_id: i64,
}

// =============================================================================
// Customer
// =============================================================================

/// A customer that sales can be attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: i64,
    pub name: String,
}

impl Customer {
    pub fn new(name: impl Into<String>) -> Self {
        Customer {
            id: UNSAVED_ID,
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn test_new_product_is_unsaved() {
        let product = Product::new("Laptop", 99_900, 5, date());
        assert!(product.is_new());
        assert_eq!(product.version, 0);
        assert_eq!(product.price().to_string(), "$999.00");
        assert_eq!(product.stock_value().cents(), 499_500);
    }

    #[test]
    fn test_sale_for_customer() {
        let sale = Sale::new(7, 1500, Utc::now()).for_customer(3);
        assert_eq!(sale.product_id, 7);
        assert_eq!(sale.customer_id, Some(3));
        assert_eq!(sale.amount().cents(), 1500);
    }

    #[test]
    fn test_product_deserializes_without_version() {
        let json = r#"{
            "id": 1,
            "name": "Laptop",
            "price_cents": 99900,
            "stock_quantity": 5,
            "manufacture_date": "2024-03-01"
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.version, 0);
        assert_eq!(product.manufacture_date, date());
    }
}
