//! # storefront-core: Catalogue Entities
//!
//! Entity definitions and their validation rules. No I/O lives here; the
//! `sqlx` feature only adds `FromRow` derives so `storefront-db` can map
//! rows straight into these types.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  storefront-cli (migrate / seed / tour)                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  storefront-db (context, repositories, loading, migrations)             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ★ storefront-core (THIS CRATE) ★                                       │
//! │    Product · Sale · Supplier · ProductSupplier · Customer               │
//! │    Money · Validate                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entities
//! - [`money`] - Integer-cents money type
//! - [`validation`] - Field rules and the [`Validate`] trait
//! - [`error`] - Validation error type

pub mod error;
pub mod money;
pub mod types;
pub mod validation;

pub use error::ValidationError;
pub use money::Money;
pub use types::*;
pub use validation::{Validate, ValidationResult};

// =============================================================================
// Field Limits
// =============================================================================

/// Maximum length of product, supplier and customer names.
pub const MAX_NAME_LEN: usize = 100;

/// Lowest accepted product price ($0.01).
pub const MIN_PRICE_CENTS: i64 = 1;

/// Highest accepted product price ($10,000.00).
pub const MAX_PRICE_CENTS: i64 = 1_000_000;

/// Highest accepted stock quantity for a single product.
pub const MAX_STOCK_QUANTITY: i64 = 100_000;
