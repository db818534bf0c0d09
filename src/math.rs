//! Wide integer helpers.
//!
//! Reserves and amounts are `u128`; products such as `stock * money` or
//! `quantity * price` need up to 256 bits before the final division.
//! Every helper truncates toward zero unless its name says otherwise, so
//! results are bit-identical on every replica.

use ethnum::U256;

/// Widen a `u128` into a `U256`.
#[inline]
pub fn wide(value: u128) -> U256 {
    U256::from(value)
}

/// Narrow a `U256` back into `u128`, `None` on overflow.
#[inline]
pub fn narrow(value: U256) -> Option<u128> {
    if value > U256::from(u128::MAX) {
        None
    } else {
        Some(value.as_u128())
    }
}

/// `floor(a * b / c)`, `None` when `c == 0` or the result exceeds `u128`.
///
/// # Example
///
/// ```
/// use hybrid_exchange::math::mul_div_floor;
///
/// assert_eq!(mul_div_floor(7, 3, 2), Some(10));
/// assert_eq!(mul_div_floor(u128::MAX, 2, 4), Some(u128::MAX / 2));
/// assert_eq!(mul_div_floor(1, 1, 0), None);
/// ```
pub fn mul_div_floor(a: u128, b: u128, c: u128) -> Option<u128> {
    if c == 0 {
        return None;
    }
    narrow(wide(a) * wide(b) / wide(c))
}

/// `ceil(a * b / c)`, `None` when `c == 0` or the result exceeds `u128`.
///
/// ```
/// use hybrid_exchange::math::mul_div_ceil;
///
/// assert_eq!(mul_div_ceil(7, 3, 2), Some(11));
/// assert_eq!(mul_div_ceil(6, 2, 3), Some(4));
/// ```
pub fn mul_div_ceil(a: u128, b: u128, c: u128) -> Option<u128> {
    if c == 0 {
        return None;
    }
    let product = wide(a) * wide(b);
    let divisor = wide(c);
    let mut quotient = product / divisor;
    if product % divisor != U256::ZERO {
        quotient += U256::ONE;
    }
    narrow(quotient)
}

/// Integer square root (floor) via Newton's method.
pub fn isqrt(n: U256) -> U256 {
    if n < U256::from(2u128) {
        return n;
    }
    let mut x = n;
    let mut y = (x >> 1u32) + (x & U256::ONE);
    while y < x {
        x = y;
        y = (x + n / x) >> 1u32;
    }
    x
}

/// `floor(sqrt(a * b))` for two `u128` values. Always fits in `u128`.
pub fn sqrt_product(a: u128, b: u128) -> u128 {
    isqrt(wide(a) * wide(b)).as_u128()
}

// ============================================================================
// Unit Tests
// ============================================================================
