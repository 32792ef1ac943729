//! # Validation Module
//!
//! Field rules for every entity, exposed through the [`Validate`] trait.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: THIS MODULE                                                   │
//! │  ├── Required / max length on names                                     │
//! │  └── Ranges on prices, quantities, amounts                              │
//! │           │   (run by the repository before a save touches SQL)         │
//! │           ▼                                                             │
//! │  Layer 2: Database (SQLite)                                             │
//! │  ├── NOT NULL and CHECK constraints mirroring the rules above           │
//! │  ├── UNIQUE constraints                                                 │
//! │  └── Foreign key constraints                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use chrono::NaiveDate;
//! use storefront_core::{Product, Validate};
//!
//! let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! assert!(Product::new("Laptop", 99_900, 5, date).validate().is_ok());
//! assert!(Product::new("", 99_900, 5, date).validate().is_err());
//! ```

use crate::error::ValidationError;
use crate::types::{Customer, Product, Sale, Supplier};
use crate::{MAX_NAME_LEN, MAX_PRICE_CENTS, MAX_STOCK_QUANTITY, MIN_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Entities that can check their own field rules.
pub trait Validate {
    /// Returns the first rule violation, if any.
    fn validate(&self) -> ValidationResult<()>;
}

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a required name field.
///
/// ## Rules
/// - Must not be blank
/// - At most [`MAX_NAME_LEN`] characters after trimming
///
/// Only ASCII spaces are trimmed, matching SQLite's `trim()` in the
/// `length(trim(name))` CHECK constraints.
pub fn validate_name(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim_matches(' ');

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates that `value` lies within `min..=max`.
pub fn validate_range(field: &str, value: i64, min: i64, max: i64) -> ValidationResult<()> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min,
            max,
        });
    }
    Ok(())
}

/// Validates that `value` is strictly positive.
pub fn validate_positive(field: &str, value: i64) -> ValidationResult<()> {
    if value <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Entity Rules
// =============================================================================

impl Validate for Product {
    fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name)?;
        validate_range("price_cents", self.price_cents, MIN_PRICE_CENTS, MAX_PRICE_CENTS)?;
        validate_range("stock_quantity", self.stock_quantity, 0, MAX_STOCK_QUANTITY)?;
        Ok(())
    }
}

impl Validate for Sale {
    fn validate(&self) -> ValidationResult<()> {
        validate_positive("product_id", self.product_id)?;
        if let Some(customer_id) = self.customer_id {
            validate_positive("customer_id", customer_id)?;
        }
        validate_positive("amount_cents", self.amount_cents)
    }
}

impl Validate for Supplier {
    fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name)
    }
}

impl Validate for Customer {
    fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name)
    }
}
