//! Constant-product formulas.
//!
//! All results truncate toward zero. Products are formed in 256 bits so no
//! intermediate overflows for `u128` reserves.
//!
//! ## Formulas
//!
//! ```text
//! amount_out            = r_out * in / (r_in + in)
//! max_input_for_output  = r_in * out / (r_out - out)
//! till price (buy)      = isqrt(k * price / SCALE) - money_reserve
//! till price (sell)     = isqrt(k * SCALE / price) - stock_reserve
//! ```

use ethnum::U256;

use crate::math::{isqrt, mul_div_floor, narrow, wide};
use crate::types::price::SCALE;
use crate::types::{PoolInfo, Side};

/// Output of swapping `amount_in` against `(reserve_in, reserve_out)`.
///
/// Zero when either reserve is empty.
///
/// ```
/// use hybrid_exchange::pool::math::amount_out;
///
/// // 1000 into a 10_000 / 20_000 pool
/// assert_eq!(amount_out(1_000, 10_000, 20_000), 1_818);
/// ```
pub fn amount_out(amount_in: u128, reserve_in: u128, reserve_out: u128) -> u128 {
    if reserve_in == 0 || reserve_out == 0 {
        return 0;
    }
    let denominator = wide(reserve_in) + wide(amount_in);
    // r_out * in / (r_in + in) < r_out, always fits
    narrow(wide(reserve_out) * wide(amount_in) / denominator).unwrap_or(0)
}

/// Largest input whose output does not exceed `out`.
///
/// `None` when `out` would drain the pool.
pub fn max_input_for_output(out: u128, reserve_in: u128, reserve_out: u128) -> Option<u128> {
    if out >= reserve_out {
        return None;
    }
    mul_div_floor(reserve_in, out, reserve_out - out)
}

/// `k * num / den` in 256 bits, saturating if even the reordered form overflows.
fn scale_product(k: U256, num: u64, den: u64) -> U256 {
    let num = U256::from(num);
    let den = U256::from(den);
    match k.checked_mul(num) {
        Some(product) => product / den,
        None => (k / den).saturating_mul(num),
    }
}

/// Input an order on `side` must route into the pool, in total, to move
/// the pool's price to `price`.
///
/// Buys push the price up by adding money; sells push it down by adding
/// stock. Zero when the pool is not tradable, `price` is zero, or the
/// pool is already at or beyond `price` from the order's point of view.
pub fn into_pool_till_price(pool: &PoolInfo, side: Side, price: u64) -> u128 {
    if !pool.is_tradable() || price == 0 {
        return 0;
    }
    let k = wide(pool.stock_amm_reserve) * wide(pool.money_amm_reserve);
    let (target, current) = match side {
        Side::Buy => (isqrt(scale_product(k, price, SCALE)), pool.money_amm_reserve),
        Side::Sell => (isqrt(scale_product(k, SCALE, price)), pool.stock_amm_reserve),
    };
    // isqrt of a 256-bit value fits in 128 bits
    narrow(target).unwrap_or(u128::MAX).saturating_sub(current)
}

/// Current pool price `money * SCALE / stock`, `None` when not tradable.
pub fn pool_price(pool: &PoolInfo) -> Option<u64> {
    if !pool.is_tradable() {
        return None;
    }
    crate::types::price::effective_price(pool.stock_amm_reserve, pool.money_amm_reserve)
}

// ============================================================================
// Unit Tests
// ============================================================================
