//! Fixed-point price utilities.
//!
//! ## Overview
//!
//! Prices are money-per-stock ratios stored as `u64` scaled by 10^8, so a
//! price carries at most 8 decimal places. Each market declares how many of
//! those places its orders may use (its price precision).
//!
//! Token amounts are plain `u128` integers. The money value of a stock
//! amount is `stock * price / SCALE`; fees owed round up, payouts round
//! down.
//!
//! ## Examples
//!
//! ```
//! use hybrid_exchange::types::price::{to_fixed, from_fixed, fits_precision};
//!
//! let price = to_fixed("12.5").unwrap();
//! assert_eq!(price, 1_250_000_000);
//! assert_eq!(from_fixed(price), "12.50000000");
//! assert!(fits_precision(price, 1));
//! assert!(!fits_precision(price, 0));
//! ```

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

use crate::math::{mul_div_ceil, mul_div_floor};

/// Scaling factor for fixed-point prices: 10^8
pub const SCALE: u64 = 100_000_000;

/// Number of decimal places carried by [`SCALE`].
pub const MAX_PRICE_PRECISION: u8 = 8;

// ============================================================================
// Conversion Functions
// ============================================================================

/// Convert a decimal string to a fixed-point price.
///
/// Returns `None` for negative, malformed or out-of-range input, or when
/// the string has more than 8 decimal places.
///
/// ```
/// use hybrid_exchange::types::price::to_fixed;
///
/// assert_eq!(to_fixed("1.0"), Some(100_000_000));
/// assert_eq!(to_fixed("0.00000001"), Some(1));
/// assert_eq!(to_fixed("0.000000001"), None);
/// ```
pub fn to_fixed(s: &str) -> Option<u64> {
    let decimal = Decimal::from_str(s).ok()?;
    decimal_to_fixed(decimal)
}

/// Convert a Decimal to a fixed-point price (exact only).
pub fn decimal_to_fixed(d: Decimal) -> Option<u64> {
    if d.is_sign_negative() {
        return None;
    }
    let scaled = d.checked_mul(Decimal::from(SCALE))?;
    if scaled.fract() != Decimal::ZERO {
        return None;
    }
    scaled.to_u64()
}

/// Convert a fixed-point price to a Decimal.
pub fn fixed_to_decimal(value: u64) -> Decimal {
    Decimal::from(value) / Decimal::from(SCALE)
}

/// Render a fixed-point price with 8 decimal places.
///
/// ```
/// use hybrid_exchange::types::price::from_fixed;
///
/// assert_eq!(from_fixed(5_000_012_345_678), "50000.12345678");
/// ```
pub fn from_fixed(value: u64) -> String {
    format!("{:.8}", fixed_to_decimal(value))
}

/// Render a fixed-point price without trailing zeros.
pub fn from_fixed_trimmed(value: u64) -> String {
    format!("{}", fixed_to_decimal(value).normalize())
}

// ============================================================================
// Precision
// ============================================================================

/// Smallest price increment representable at `precision` decimal places.
///
/// `precision` above [`MAX_PRICE_PRECISION`] is clamped.
pub fn precision_step(precision: u8) -> u64 {
    let unused = MAX_PRICE_PRECISION - precision.min(MAX_PRICE_PRECISION);
    10u64.pow(u32::from(unused))
}

/// Whether `price` has no digits beyond `precision` decimal places.
pub fn fits_precision(price: u64, precision: u8) -> bool {
    price % precision_step(precision) == 0
}

// ============================================================================
// Money conversion
// ============================================================================

/// `floor(stock * price / SCALE)`: money paid out for a stock amount.
pub fn money_floor(stock: u128, price: u64) -> Option<u128> {
    mul_div_floor(stock, u128::from(price), u128::from(SCALE))
}

/// `ceil(stock * price / SCALE)`: money owed for a stock amount.
pub fn money_ceil(stock: u128, price: u64) -> Option<u128> {
    mul_div_ceil(stock, u128::from(price), u128::from(SCALE))
}

/// `floor(money * SCALE / price)`: stock affordable with a money amount.
pub fn stock_for_money(money: u128, price: u64) -> Option<u128> {
    mul_div_floor(money, u128::from(SCALE), u128::from(price))
}

/// Effective price of a fill, `money * SCALE / stock`, saturating at `u64::MAX`.
pub fn effective_price(stock: u128, money: u128) -> Option<u64> {
    let raw = mul_div_floor(money, u128::from(SCALE), stock)?;
    Some(u64::try_from(raw).unwrap_or(u64::MAX))
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_constant() {
        assert_eq!(SCALE, 100_000_000);
        assert_eq!(10u64.pow(u32::from(MAX_PRICE_PRECISION)), SCALE);
    }

    #[test]
    fn test_to_fixed_basic() {
        assert_eq!(to_fixed("1"), Some(100_000_000));
        assert_eq!(to_fixed("0.5"), Some(50_000_000));
        assert_eq!(to_fixed("50000.12345678"), Some(5_000_012_345_678));
    }

    #[test]
    fn test_to_fixed_edge_cases() {
        assert_eq!(to_fixed("0"), Some(0));
        assert_eq!(to_fixed("-1.0"), None);
        assert_eq!(to_fixed("abc"), None);
        assert_eq!(to_fixed(""), None);
        assert_eq!(to_fixed("1.000000001"), None);
    }

    #[test]
    fn test_from_fixed() {
        assert_eq!(from_fixed(100_000_000), "1.00000000");
        assert_eq!(from_fixed(1), "0.00000001");
        assert_eq!(from_fixed_trimmed(150_000_000), "1.5");
    }

    #[test]
    fn test_precision_step() {
        assert_eq!(precision_step(8), 1);
        assert_eq!(precision_step(2), 1_000_000);
        assert_eq!(precision_step(0), SCALE);
        assert_eq!(precision_step(12), 1);
    }

    #[test]
    fn test_fits_precision() {
        let price = to_fixed("1.25").unwrap();
        assert!(fits_precision(price, 2));
        assert!(fits_precision(price, 8));
        assert!(!fits_precision(price, 1));
    }

    #[test]
    fn test_money_rounding() {
        let price = to_fixed("0.3").unwrap();
        // 10 * 0.3 = 3 exactly
        assert_eq!(money_floor(10, price), Some(3));
        assert_eq!(money_ceil(10, price), Some(3));
        // 7 * 0.3 = 2.1
        assert_eq!(money_floor(7, price), Some(2));
        assert_eq!(money_ceil(7, price), Some(3));
    }

    #[test]
    fn test_stock_for_money() {
        let price = to_fixed("3").unwrap();
        assert_eq!(stock_for_money(10, price), Some(3));
        assert_eq!(stock_for_money(10, 0), None);
    }

    #[test]
    fn test_effective_price() {
        assert_eq!(effective_price(50, 500), Some(to_fixed("10").unwrap()));
        assert_eq!(effective_price(0, 500), None);
    }
}
