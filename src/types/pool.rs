//! Per-market pool state and liquidity positions.

use serde::Serialize;

use crate::error::DexError;
use crate::types::price::MAX_PRICE_PRECISION;
use crate::types::{Address, Side};

/// Longest accepted pair symbol in bytes.
pub const MAX_PAIR_LEN: usize = 32;

/// Split `"stock/money"` into its two denominations.
///
/// Symbols are lowercase ASCII alphanumerics, the two sides must differ,
/// and the whole symbol is at most [`MAX_PAIR_LEN`] bytes.
///
/// ```
/// use hybrid_exchange::types::split_pair;
///
/// assert_eq!(split_pair("abc/usdt").unwrap(), ("abc", "usdt"));
/// assert!(split_pair("abc/abc").is_err());
/// assert!(split_pair("ABC/usdt").is_err());
/// ```
pub fn split_pair(symbol: &str) -> Result<(&str, &str), DexError> {
    let invalid = || DexError::InvalidPair(symbol.to_string());
    if symbol.len() > MAX_PAIR_LEN {
        return Err(invalid());
    }
    let (stock, money) = symbol.split_once('/').ok_or_else(invalid)?;
    let well_formed = |s: &str| {
        !s.is_empty()
            && s
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
    };
    if !well_formed(stock) || !well_formed(money) || stock == money {
        return Err(invalid());
    }
    Ok((stock, money))
}

/// AMM and book-held reserves of one trading pair.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PoolInfo {
    /// Pair symbol, `stock/money`
    pub pair: String,
    pub creator: Address,
    pub stock_amm_reserve: u128,
    pub money_amm_reserve: u128,
    /// Stock frozen by resting sell orders
    pub stock_order_book_reserve: u128,
    /// Money frozen by resting buy orders
    pub money_order_book_reserve: u128,
    /// Outstanding liquidity shares
    pub total_supply: u128,
    /// Decimal places order prices may use
    pub price_precision: u8,
    /// Last execution price (fixed-point), zero before the first trade
    pub last_price: u64,
}

impl PoolInfo {
    pub fn new(pair: impl Into<String>, creator: Address, price_precision: u8) -> Self {
        Self {
            pair: pair.into(),
            creator,
            price_precision: price_precision.min(MAX_PRICE_PRECISION),
            ..Self::default()
        }
    }

    /// Stock denomination of the pair.
    pub fn stock_denom(&self) -> &str {
        self.pair.split_once('/').map(|(s, _)| s).unwrap_or(&self.pair)
    }

    /// Money denomination of the pair.
    pub fn money_denom(&self) -> &str {
        self.pair.split_once('/').map(|(_, m)| m).unwrap_or(&self.pair)
    }

    /// Denomination an order on `side` pays with.
    pub fn input_denom(&self, side: Side) -> &str {
        match side {
            Side::Buy => self.money_denom(),
            Side::Sell => self.stock_denom(),
        }
    }

    /// Denomination an order on `side` receives.
    pub fn output_denom(&self, side: Side) -> &str {
        self.input_denom(side.opposite())
    }

    /// The pool can take part in matching only with liquidity on both sides.
    pub fn is_tradable(&self) -> bool {
        self.total_supply > 0 && self.stock_amm_reserve > 0 && self.money_amm_reserve > 0
    }

    /// `(reserve_in, reserve_out)` for an order on `side` trading with the pool.
    pub fn reserves_for(&self, side: Side) -> (u128, u128) {
        match side {
            Side::Buy => (self.money_amm_reserve, self.stock_amm_reserve),
            Side::Sell => (self.stock_amm_reserve, self.money_amm_reserve),
        }
    }
}

/// Liquidity shares held by one owner in one pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiquidityPosition {
    pub pair: String,
    pub owner: Address,
    pub shares: u128,
}

// ============================================================================
// Unit Tests
// ============================================================================
