//! # Money
//!
//! Amounts are whole cents in an `i64`. An order total must equal the sum
//! of its line totals exactly, which floats cannot promise:
//!
//! ```text
//!   f64:   0.1 + 0.2            = 0.30000000000000004
//!   cents: 2 × 1000 + 1 × 500   = 2500                → "25.00"
//! ```
//!
//! ```rust
//! use tienda_core::money::Money;
//!
//! let line = Money::from_cents(1099).multiply_quantity(2);
//! assert_eq!(line.cents(), 2198);
//! assert_eq!(line.to_decimal_string(), "21.98");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

/// A price, line total or order total in cents.
///
/// ```text
/// Product.price_cents ──► reserve() ──► OrderItem.unit_price_cents (snapshot)
///                                              │
///                                              ▼
///                         OrderItem.line_total() ──► Σ ──► Order.total_cents
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// `units` whole currency units plus `cents` (0-99), e.g. `(12, 99)` is 12.99.
    #[inline]
    pub const fn from_units(units: i64, cents: i64) -> Self {
        Money(units * 100 + cents)
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Line total for `quantity` units at this unit price.
    #[inline]
    pub const fn multiply_quantity(&self, quantity: i64) -> Self {
        Money(self.0 * quantity)
    }

    /// Two-decimal rendering used on the wire (`"25.00"`).
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        format!("{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_decimal_string())
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::default(), |acc, m| acc + m)
    }
}
