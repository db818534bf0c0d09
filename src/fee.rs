//! Fee and rebate arithmetic.
//!
//! Pure functions, no state. A fee is charged on what a trader receives and
//! always rounds up. It is then split three ways:
//!
//! ```text
//! rebate       = floor(fee * rebate_ratio / rebate_ratio_base)   (only with a referee)
//! rest         = fee - rebate
//! to_validator = floor(rest * fee_to_validator / fee_precision)
//! to_pool      = rest - to_validator
//! ```
//!
//! Every unit of the fee lands in exactly one bucket.

use crate::math::{mul_div_ceil, mul_div_floor};

/// Destination of each part of a fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeeSplit {
    /// Paid to the trader's referee
    pub rebate: u128,
    /// Sent to the fee collector
    pub to_validator: u128,
    /// Credited to the AMM reserves
    pub to_pool: u128,
}

impl FeeSplit {
    #[inline]
    pub fn total(&self) -> u128 {
        self.rebate + self.to_validator + self.to_pool
    }
}

/// `ceil(amount * rate / precision)`, capped at `amount`.
///
/// ```
/// use hybrid_exchange::fee::trade_fee;
///
/// assert_eq!(trade_fee(1_000, 30, 10_000), 3);
/// assert_eq!(trade_fee(1, 30, 10_000), 1);
/// assert_eq!(trade_fee(0, 30, 10_000), 0);
/// ```
pub fn trade_fee(amount: u128, rate: u128, precision: u128) -> u128 {
    if amount == 0 || rate == 0 {
        return 0;
    }
    mul_div_ceil(amount, rate, precision)
        .unwrap_or(amount)
        .min(amount)
}

/// Split `fee` into rebate, validator share and pool share.
///
/// `rebate_ratio` is ignored when the trader has no referee
/// (`has_referee == false`) or the base is zero.
pub fn split_fee(
    fee: u128,
    has_referee: bool,
    rebate_ratio: u128,
    rebate_ratio_base: u128,
    fee_to_validator: u128,
    fee_precision: u128,
) -> FeeSplit {
    let rebate = if has_referee {
        mul_div_floor(fee, rebate_ratio, rebate_ratio_base)
            .unwrap_or(0)
            .min(fee)
    } else {
        0
    };
    let rest = fee - rebate;
    let to_validator = mul_div_floor(rest, fee_to_validator, fee_precision)
        .unwrap_or(0)
        .min(rest);
    FeeSplit {
        rebate,
        to_validator,
        to_pool: rest - to_validator,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
