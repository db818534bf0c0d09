//! Market parameters.
//!
//! Rates are integers over `fee_precision`: with a precision of 10_000 a
//! taker rate of 30 is 0.30 %. The JSON form takes human-readable decimal
//! strings and converts them exactly, rejecting rates the precision cannot
//! represent.
//!
//! ```
//! use hybrid_exchange::config::MarketParams;
//!
//! let params = MarketParams::from_json(r#"{
//!     "maker_fee_rate": "0.001",
//!     "taker_fee_rate": "0.003",
//!     "pool_fee_rate": "0.003",
//!     "fee_to_validator": "0.25",
//!     "fee_precision": 10000,
//!     "order_lifetime_blocks": 100
//! }"#).unwrap();
//! assert_eq!(params.taker_fee_rate, 30);
//! assert_eq!(params.fee_to_validator, 2_500);
//! ```

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{DexError, DexResult};

/// Default rate denominator
pub const DEFAULT_FEE_PRECISION: u128 = 10_000;

/// Fee rates and order lifetime, shared by every market.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketParams {
    /// Fee on what a resting (maker) order receives
    pub maker_fee_rate: u128,
    /// Fee on what an incoming (taker) order receives from the book
    pub taker_fee_rate: u128,
    /// Fee on what an order receives from the pool
    pub pool_fee_rate: u128,
    /// Share of each post-rebate fee sent to the fee collector
    pub fee_to_validator: u128,
    /// Denominator of every rate above
    pub fee_precision: u128,
    /// Blocks a resting order lives before the expiry sweep cancels it; 0 disables expiry
    pub order_lifetime_blocks: u64,
}

impl Default for MarketParams {
    fn default() -> Self {
        Self {
            maker_fee_rate: 10,
            taker_fee_rate: 30,
            pool_fee_rate: 30,
            fee_to_validator: 2_500,
            fee_precision: DEFAULT_FEE_PRECISION,
            order_lifetime_blocks: 0,
        }
    }
}

/// JSON representation with decimal rates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawParams {
    #[serde(with = "rust_decimal::serde::str")]
    maker_fee_rate: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    taker_fee_rate: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pool_fee_rate: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    fee_to_validator: Decimal,
    #[serde(default = "default_precision")]
    fee_precision: u64,
    #[serde(default)]
    order_lifetime_blocks: u64,
}

fn default_precision() -> u64 {
    DEFAULT_FEE_PRECISION as u64
}

/// `rate * precision` as an exact integer.
fn to_rate(name: &str, rate: Decimal, precision: u64) -> DexResult<u128> {
    let invalid = |why: &str| DexError::InvalidConfig(format!("{name}: {why}"));
    if rate.is_sign_negative() {
        return Err(invalid("negative rate"));
    }
    let scaled = rate
        .checked_mul(Decimal::from(precision))
        .ok_or_else(|| invalid("rate overflows"))?;
    if !scaled.fract().is_zero() {
        return Err(invalid("more digits than fee_precision allows"));
    }
    scaled.to_u128().ok_or_else(|| invalid("rate out of range"))
}

fn to_decimal(rate: u128, precision: u128) -> Decimal {
    Decimal::from_u128(rate).unwrap_or(Decimal::MAX) / Decimal::from_u128(precision).unwrap_or(Decimal::ONE)
}

impl MarketParams {
    /// Parse and validate the JSON form.
    pub fn from_json(json: &str) -> DexResult<Self> {
        let raw: RawParams =
            serde_json::from_str(json).map_err(|e| DexError::InvalidConfig(e.to_string()))?;
        if raw.fee_precision == 0 {
            return Err(DexError::InvalidConfig("fee_precision must be positive".into()));
        }
        let precision = raw.fee_precision;
        let params = Self {
            maker_fee_rate: to_rate("maker_fee_rate", raw.maker_fee_rate, precision)?,
            taker_fee_rate: to_rate("taker_fee_rate", raw.taker_fee_rate, precision)?,
            pool_fee_rate: to_rate("pool_fee_rate", raw.pool_fee_rate, precision)?,
            fee_to_validator: to_rate("fee_to_validator", raw.fee_to_validator, precision)?,
            fee_precision: u128::from(precision),
            order_lifetime_blocks: raw.order_lifetime_blocks,
        };
        params.validate()?;
        Ok(params)
    }

    /// Render as the JSON form accepted by [`MarketParams::from_json`].
    pub fn to_json(&self) -> DexResult<String> {
        let precision = u64::try_from(self.fee_precision)
            .map_err(|_| DexError::InvalidConfig("fee_precision out of range".into()))?;
        let raw = RawParams {
            maker_fee_rate: to_decimal(self.maker_fee_rate, self.fee_precision),
            taker_fee_rate: to_decimal(self.taker_fee_rate, self.fee_precision),
            pool_fee_rate: to_decimal(self.pool_fee_rate, self.fee_precision),
            fee_to_validator: to_decimal(self.fee_to_validator, self.fee_precision),
            fee_precision: precision,
            order_lifetime_blocks: self.order_lifetime_blocks,
        };
        serde_json::to_string_pretty(&raw).map_err(|e| DexError::InvalidConfig(e.to_string()))
    }

    /// Every rate must be below 100 % and the precision positive.
    pub fn validate(&self) -> DexResult<()> {
        if self.fee_precision == 0 {
            return Err(DexError::InvalidConfig("fee_precision must be positive".into()));
        }
        let rates = [
            ("maker_fee_rate", self.maker_fee_rate),
            ("taker_fee_rate", self.taker_fee_rate),
            ("pool_fee_rate", self.pool_fee_rate),
        ];
        for (name, rate) in rates {
            if rate >= self.fee_precision {
                return Err(DexError::InvalidConfig(format!("{name} must be below 100%")));
            }
        }
        if self.fee_to_validator > self.fee_precision {
            return Err(DexError::InvalidConfig("fee_to_validator exceeds 100%".into()));
        }
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(MarketParams::default().validate().is_ok());
    }

    #[test]
    fn test_from_json_defaults() {
        let params = MarketParams::from_json(
            r#"{"maker_fee_rate":"0","taker_fee_rate":"0.0025","pool_fee_rate":"0.003","fee_to_validator":"0.5"}"#,
        )
        .unwrap();
        assert_eq!(params.fee_precision, DEFAULT_FEE_PRECISION);
        assert_eq!(params.taker_fee_rate, 25);
        assert_eq!(params.fee_to_validator, 5_000);
        assert_eq!(params.order_lifetime_blocks, 0);
    }

    #[test]
    fn test_from_json_rejects_inexact_rate() {
        let err = MarketParams::from_json(
            r#"{"maker_fee_rate":"0.00001","taker_fee_rate":"0","pool_fee_rate":"0","fee_to_validator":"0"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, DexError::InvalidConfig(msg) if msg.starts_with("maker_fee_rate")));
    }

    #[test]
    fn test_from_json_rejects_full_rate() {
        let err = MarketParams::from_json(
            r#"{"maker_fee_rate":"1","taker_fee_rate":"0","pool_fee_rate":"0","fee_to_validator":"0"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, DexError::InvalidConfig(_)));
    }

    #[test]
    fn test_from_json_rejects_unknown_field() {
        assert!(MarketParams::from_json(
            r#"{"maker_fee_rate":"0","taker_fee_rate":"0","pool_fee_rate":"0","fee_to_validator":"0","oops":1}"#,
        )
        .is_err());
    }

    #[test]
    fn test_zero_precision_rejected() {
        let params = MarketParams {
            fee_precision: 0,
            ..MarketParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let params = MarketParams {
            order_lifetime_blocks: 42,
            ..MarketParams::default()
        };
        let json = params.to_json().unwrap();
        assert_eq!(MarketParams::from_json(&json).unwrap(), params);
    }
}
