//! # Input Checks
//!
//! Run at the edge, before a unit of work opens. SQLite CHECK constraints
//! back the numeric rules up, but nothing should ever reach them.
//!
//! ```rust
//! use tienda_core::validation::{validate_id, validate_quantity};
//!
//! assert!(validate_id("productId", "2f1c").is_ok());
//! assert!(validate_quantity(5).is_ok());
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::MAX_ITEM_QUANTITY;

pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_ID_LEN: usize = 64;
const MAX_NAME_LEN: usize = 200;

fn non_blank(field: &str, value: &str, max_len: usize) -> ValidationResult<()> {
    let value = value.trim();
    if value.is_empty() {
        Err(ValidationError::Required {
            field: field.to_string(),
        })
    } else if value.len() > max_len {
        Err(ValidationError::TooLong {
            field: field.to_string(),
            max: max_len,
        })
    } else {
        Ok(())
    }
}

fn non_negative(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Product, order and user ids: non-blank, at most 64 bytes.
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    non_blank(field, id, MAX_ID_LEN)
}

pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    non_blank("name", name, MAX_NAME_LEN)
}

/// A cart line quantity: `1..=MAX_ITEM_QUANTITY`. Zero and negatives are
/// rejected here and never stored.
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    if quantity > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(())
}

/// Zero is a valid price.
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    non_negative("price", cents)
}

pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    non_negative("stock", stock)
}
