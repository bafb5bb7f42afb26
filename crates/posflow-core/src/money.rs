//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Integer Inside, Decimal on the Wire
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  The backend sends prices as JSON numbers:  { "price": 12.5 }          │
//! │  Summing those as floats drifts:  0.1 + 0.2 = 0.30000000000000004      │
//! │                                                                         │
//! │  OUR SOLUTION: convert once at the boundary                            │
//! │    JSON 12.5  ──deserialize──►  Money(1250)  (minor units, i64)        │
//! │    all cart math happens on i64                                        │
//! │    Money(31000) ──serialize──►  JSON 310                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use posflow_core::money::Money;
//!
//! let price = Money::from_minor(1099); // 10.99
//! let doubled = price * 2;             // 21.98
//! let total = price + Money::from_major(5);
//! assert_eq!(total.minor(), 1599);
//! assert_eq!(doubled.to_string(), "21.98");
//! ```

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

/// Minor units per major unit (cents per dollar, cents per shilling, ...).
const MINOR_PER_MAJOR: i64 = 100;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative intermediate values (discount > subtotal)
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Decimal serde**: The REST API speaks major units, so (de)serialization
///   converts at the edge and nothing else ever sees a float
/// - **TypeScript**: fields of this type are exported as `number`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Creates a Money value from whole major units, saturating at the i64
    /// bounds.
    ///
    /// ```rust
    /// use posflow_core::money::Money;
    /// assert_eq!(Money::from_major(150).minor(), 15_000);
    /// ```
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major.saturating_mul(MINOR_PER_MAJOR))
    }

    /// Like [`Money::from_major`] but `None` when the amount does not fit.
    #[inline]
    pub const fn checked_from_major(major: i64) -> Option<Self> {
        match major.checked_mul(MINOR_PER_MAJOR) {
            Some(minor) => Some(Money(minor)),
            None => None,
        }
    }

    /// Converts a decimal major-unit amount, rounding to the nearest minor unit.
    /// Out-of-range amounts saturate.
    ///
    /// This is the only place a float becomes money.
    pub fn from_decimal(amount: f64) -> Self {
        Money((amount * MINOR_PER_MAJOR as f64).round() as i64)
    }

    /// Like [`Money::from_decimal`] but `None` for non-finite or
    /// out-of-range amounts.
    pub fn checked_from_decimal(amount: f64) -> Option<Self> {
        let minor = (amount * MINOR_PER_MAJOR as f64).round();
        // i64::MAX as f64 rounds up to 2^63, which is already out of range.
        if minor.is_finite() && minor >= i64::MIN as f64 && minor < i64::MAX as f64 {
            Some(Money(minor as i64))
        } else {
            None
        }
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns the value as a decimal major-unit amount (for the wire only).
    pub fn to_decimal(&self) -> f64 {
        self.0 as f64 / MINOR_PER_MAJOR as f64
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Clamps negative values to zero.
    #[inline]
    pub const fn floor_zero(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            *self
        }
    }

    /// Returns `rate` percent of this amount, rounded half away from zero.
    ///
    /// ## Example
    /// ```rust
    /// use posflow_core::money::Money;
    ///
    /// let subtotal = Money::from_major(300);
    /// assert_eq!(subtotal.percentage(10.0), Money::from_major(30));
    ///
    /// // 10.99 × 8.25% = 0.9067 → 0.91
    /// assert_eq!(Money::from_minor(1099).percentage(8.25).minor(), 91);
    /// ```
    pub fn percentage(&self, rate: f64) -> Money {
        Money((self.0 as f64 * rate / 100.0).round() as i64)
    }

    /// Multiplies money by a quantity, saturating at the i64 bounds.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows the amount with two decimals and no currency symbol; the verticals
/// each format their own currency.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        write!(
            f,
            "{}{}.{:02}",
            sign,
            abs / MINOR_PER_MAJOR,
            abs % MINOR_PER_MAJOR
        )
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Serde (decimal major units on the wire)
// =============================================================================

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % MINOR_PER_MAJOR == 0 {
            serializer.serialize_i64(self.0 / MINOR_PER_MAJOR)
        } else {
            serializer.serialize_f64(self.to_decimal())
        }
    }
}

struct MoneyVisitor;

impl<'de> Visitor<'de> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal amount as a number or numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        Money::checked_from_major(v).ok_or_else(|| E::custom(format!("amount {} out of range", v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        i64::try_from(v)
            .ok()
            .and_then(Money::checked_from_major)
            .ok_or_else(|| E::custom(format!("amount {} out of range", v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        if !v.is_finite() {
            return Err(E::custom("amount must be finite"));
        }
        Money::checked_from_decimal(v).ok_or_else(|| E::custom(format!("amount {} out of range", v)))
    }

    // Some backends serialize NUMERIC columns as strings ("150.00").
    fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
        let parsed: f64 = v
            .trim()
            .parse()
            .map_err(|_| E::custom(format!("invalid amount '{}'", v)))?;
        self.visit_f64(parsed)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_major_and_minor() {
        assert_eq!(Money::from_major(10).minor(), 1000);
        assert_eq!(Money::from_minor(1099).minor(), 1099);
    }

    #[test]
    fn test_from_decimal_rounds_to_minor_unit() {
        assert_eq!(Money::from_decimal(12.5).minor(), 1250);
        assert_eq!(Money::from_decimal(0.1 + 0.2).minor(), 30);
        assert_eq!(Money::from_decimal(10.999).minor(), 1100);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_minor(1099).to_string(), "10.99");
        assert_eq!(Money::from_minor(500).to_string(), "5.00");
        assert_eq!(Money::from_minor(-550).to_string(), "-5.50");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_minor(1000);
        let b = Money::from_minor(500);

        assert_eq!((a + b).minor(), 1500);
        assert_eq!((a - b).minor(), 500);
        assert_eq!((a * 3).minor(), 3000);
        assert_eq!(vec![a, b, b].into_iter().sum::<Money>().minor(), 2000);
    }

    #[test]
    fn test_floor_zero() {
        assert_eq!(Money::from_minor(-1).floor_zero(), Money::zero());
        assert_eq!(Money::from_minor(7).floor_zero().minor(), 7);
    }

    #[test]
    fn test_serializes_as_major_units() {
        assert_eq!(serde_json::to_string(&Money::from_major(310)).unwrap(), "310");
        assert_eq!(serde_json::to_string(&Money::from_minor(1250)).unwrap(), "12.5");
    }

    #[test]
    fn test_deserializes_numbers_and_numeric_strings() {
        let m: Money = serde_json::from_str("150").unwrap();
        assert_eq!(m, Money::from_major(150));

        let m: Money = serde_json::from_str("12.75").unwrap();
        assert_eq!(m.minor(), 1275);

        let m: Money = serde_json::from_str("\"150.00\"").unwrap();
        assert_eq!(m, Money::from_major(150));

        assert!(serde_json::from_str::<Money>("\"abc\"").is_err());
    }

    #[test]
    fn test_out_of_range_amounts_are_errors() {
        let err = serde_json::from_str::<Money>("100000000000000000").unwrap_err();
        assert!(err.to_string().contains("out of range"));

        assert!(serde_json::from_str::<Money>("18446744073709551615").is_err());
        assert!(serde_json::from_str::<Money>("1e300").is_err());
        assert!(serde_json::from_str::<Money>("\"-1e300\"").is_err());

        let m: Money = serde_json::from_str("92233720368547758").unwrap();
        assert_eq!(m.minor(), 9_223_372_036_854_775_800);
    }

    #[test]
    fn test_arithmetic_saturates() {
        let max = Money::from_minor(i64::MAX);
        assert_eq!(Money::from_major(i64::MAX), max);
        assert_eq!((max * 2).minor(), i64::MAX);
        assert_eq!(max.multiply_quantity(i64::MAX).minor(), i64::MAX);
        assert_eq!((max + Money::from_minor(1)).minor(), i64::MAX);
        assert_eq!((Money::from_minor(i64::MIN) - Money::from_minor(1)).minor(), i64::MIN);
        assert_eq!(vec![max, max].into_iter().sum::<Money>(), max);
    }
}
