//! Order types for the exchange kernel.
//!
//! ## Fixed-Point Representation
//!
//! `price` is money-per-stock scaled by 10^8 (see [`crate::types::price`]).
//! Quantities and frozen amounts are raw `u128` token units.
//!
//! ## Commitment
//!
//! A resting order keeps exactly the funds it could still owe frozen:
//! `left_stock` stock for a sell, `ceil(left_stock * price / SCALE)` money
//! for a buy. [`Order::commitment`] computes that amount.

use serde::Serialize;

use crate::types::price::{money_ceil, MAX_PRICE_PRECISION};
use crate::types::{Address, OrderId};

// ============================================================================
// Side enum
// ============================================================================

/// Order side: Buy or Sell
///
/// Represented as u8 in stored records:
/// - Buy = 0
/// - Sell = 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buy order (bid) - pays money, receives stock
    #[default]
    Buy,
    /// Sell order (ask) - pays stock, receives money
    Sell,
}

impl Side {
    /// Convert to u8 for serialization
    pub fn to_u8(self) -> u8 {
        match self {
            Side::Buy => 0,
            Side::Sell => 1,
        }
    }

    /// Convert from u8 for deserialization
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Side::Buy),
            1 => Some(Side::Sell),
            _ => None,
        }
    }

    /// Returns the opposite side
    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    #[inline]
    pub fn is_buy(self) -> bool {
        self == Side::Buy
    }

    /// Whether a resting order at `resting` crosses an incoming limit on
    /// this side.
    #[inline]
    pub fn crosses(self, limit: u64, resting: u64) -> bool {
        match self {
            Side::Buy => resting <= limit,
            Side::Sell => resting >= limit,
        }
    }
}

// ============================================================================
// Order request
// ============================================================================

/// Parameters of a limit order as submitted by a trader.
///
/// The engine turns this into an [`Order`] after validation, stamping the
/// block height and the in-block order index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub sender: Address,
    pub sequence: u64,
    pub pair: String,
    pub side: Side,
    /// Limit price (fixed-point, scaled by 10^8)
    pub price: u64,
    /// Decimal places the price uses
    pub price_precision: u8,
    /// Stock quantity
    pub quantity: u128,
}

impl NewOrder {
    pub fn id(&self) -> OrderId {
        OrderId::new(self.sender, self.sequence)
    }
}

// ============================================================================
// Order struct
// ============================================================================

/// A limit order, either being matched or resting in the book.
///
/// ## Example
///
/// ```
/// use hybrid_exchange::types::{Address, Order, OrderId, Side};
///
/// let order = Order::new(
///     OrderId::new(Address::repeat(1), 7),
///     "abc/usdt",
///     Side::Buy,
///     250_000_000, // 2.5
///     2,
///     100,
///     10, // height
///     0,  // first order of the block
/// );
/// assert_eq!(order.commitment(order.left_stock), Some(250));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Order {
    pub id: OrderId,

    /// Trading pair symbol, `stock/money`
    pub pair: String,

    pub side: Side,

    /// Limit price in fixed-point (scaled by 10^8)
    pub price: u64,

    pub price_precision: u8,

    /// Original stock quantity
    pub quantity: u128,

    /// Stock still to be executed
    pub left_stock: u128,

    /// Funds still frozen against this order
    pub freeze: u128,

    /// Cumulative executed stock
    pub deal_stock: u128,

    /// Cumulative executed money
    pub deal_money: u128,

    /// Block height at creation
    pub height: u64,

    /// Position among the orders created in the same block
    pub order_index: u64,
}

impl Order {
    /// Create a new, unfilled order with nothing frozen yet.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: OrderId,
        pair: impl Into<String>,
        side: Side,
        price: u64,
        price_precision: u8,
        quantity: u128,
        height: u64,
        order_index: u64,
    ) -> Self {
        Self {
            id,
            pair: pair.into(),
            side,
            price,
            price_precision: price_precision.min(MAX_PRICE_PRECISION),
            quantity,
            left_stock: quantity,
            freeze: 0,
            deal_stock: 0,
            deal_money: 0,
            height,
            order_index,
        }
    }

    #[inline]
    pub fn sender(&self) -> Address {
        self.id.sender
    }

    #[inline]
    pub fn is_buy(&self) -> bool {
        self.side.is_buy()
    }

    /// Check if the order is fully filled
    #[inline]
    pub fn is_filled(&self) -> bool {
        self.left_stock == 0
    }

    /// Get the filled quantity
    #[inline]
    pub fn filled_quantity(&self) -> u128 {
        self.quantity.saturating_sub(self.left_stock)
    }

    /// Funds that must stay frozen to cover `stock` at the limit price.
    ///
    /// `None` only on overflow.
    pub fn commitment(&self, stock: u128) -> Option<u128> {
        match self.side {
            Side::Buy => money_ceil(stock, self.price),
            Side::Sell => Some(stock),
        }
    }

    /// Record a fill of `stock` for `money`.
    pub fn record_fill(&mut self, stock: u128, money: u128) {
        self.left_stock = self.left_stock.saturating_sub(stock);
        self.deal_stock = self.deal_stock.saturating_add(stock);
        self.deal_money = self.deal_money.saturating_add(money);
    }

    /// Price-time ordering key shared by every book implementation.
    ///
    /// Ties at the same price break on (height, in-block index) and finally
    /// on the order id.
    #[inline]
    pub fn time_key(&self) -> (u64, u64, OrderId) {
        (self.height, self.order_index, self.id)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
