//! Settlement records for external indexers.
//!
//! The engine emits one record per state transition an indexer cares
//! about: order creation, each fill leg (taker and maker), cancellation,
//! and the pool leg of an order. Records are not read back by the kernel,
//! so their encoding is JSON rather than SSZ.
//!
//! ## Price Discovery
//!
//! Book fills always execute at the maker's price. Pool legs report the
//! effective price `money * SCALE / stock` of the swap.

use serde::Serialize;

use crate::types::{Address, OrderId, Side};

/// Why an order left the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    Manual,
    FullyFilled,
    Expired,
}

/// Which side of a book fill a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The resting order that was already in the book
    Maker,
    /// The incoming order that triggered the match
    Taker,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderCreated {
    pub order_id: OrderId,
    pub pair: String,
    pub side: Side,
    pub price: u64,
    pub quantity: u128,
    pub freeze: u128,
    pub height: u64,
    pub order_index: u64,
}

/// One leg of a book fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FillRecord {
    pub order_id: OrderId,
    pub counterparty: OrderId,
    pub pair: String,
    pub side: Side,
    pub role: Role,
    pub height: u64,
    /// Execution price (the maker's price)
    pub price: u64,
    /// Stock and money of this fill
    pub curr_stock: u128,
    pub curr_money: u128,
    /// Cumulative totals after this fill
    pub deal_stock: u128,
    pub deal_money: u128,
    pub left_stock: u128,
    /// Fee charged on the received token
    pub fee: u128,
    pub fee_denom: String,
    pub rebate: u128,
    pub rebate_referee: Option<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CancelRecord {
    pub order_id: OrderId,
    pub pair: String,
    pub side: Side,
    pub height: u64,
    pub reason: CancelReason,
    pub left_stock: u128,
    /// Frozen funds returned to the sender
    pub unfrozen: u128,
    pub deal_stock: u128,
    pub deal_money: u128,
}

/// The pool leg of an order, settled in one swap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolDeal {
    pub order_id: OrderId,
    pub pair: String,
    pub side: Side,
    pub height: u64,
    pub amount_in: u128,
    pub amount_out: u128,
    /// Effective price of the swap (fixed-point)
    pub price: u64,
    pub fee: u128,
    pub rebate: u128,
    pub rebate_referee: Option<Address>,
    /// AMM reserves after settlement
    pub stock_reserve: u128,
    pub money_reserve: u128,
}

/// Everything the engine can emit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SettlementEvent {
    OrderCreated(OrderCreated),
    OrderFilled(FillRecord),
    OrderCanceled(CancelRecord),
    PoolDeal(PoolDeal),
}

impl SettlementEvent {
    /// The order this record is about.
    pub fn order_id(&self) -> OrderId {
        match self {
            SettlementEvent::OrderCreated(r) => r.order_id,
            SettlementEvent::OrderFilled(r) => r.order_id,
            SettlementEvent::OrderCanceled(r) => r.order_id,
            SettlementEvent::PoolDeal(r) => r.order_id,
        }
    }

    /// Encode as a single JSON object tagged with `"type"`.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cancel() -> SettlementEvent {
        SettlementEvent::OrderCanceled(CancelRecord {
            order_id: OrderId::new(Address::repeat(1), 3),
            pair: "abc/usdt".into(),
            side: Side::Sell,
            height: 9,
            reason: CancelReason::Expired,
            left_stock: 5,
            unfrozen: 5,
            deal_stock: 0,
            deal_money: 0,
        })
    }

    #[test]
    fn test_event_order_id() {
        assert_eq!(cancel().order_id(), OrderId::new(Address::repeat(1), 3));
    }

    #[test]
    fn test_event_json_tagged() {
        let json = cancel().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "order_canceled");
        assert_eq!(value["reason"], "expired");
        assert_eq!(value["side"], "sell");
        assert!(value["order_id"].as_str().unwrap().ends_with("-3"));
    }

    #[test]
    fn test_event_json_deterministic() {
        assert_eq!(cancel().to_json().unwrap(), cancel().to_json().unwrap());
    }
}
