//! Central Limit Order Book (CLOB) for one trading pair.
//!
//! ## Architecture
//!
//! - **Slab**: O(1) order insertion, removal and lookup by key
//! - **BTreeMap**: sorted price levels for best bid/ask and inward walks
//! - **HashMap**: order id to slab key mapping for O(1) cancel
//!
//! ## Price Ordering
//!
//! - **Bids** (buy orders): sorted high-to-low (best bid = highest price)
//! - **Asks** (sell orders): sorted low-to-high (best ask = lowest price)
//!
//! ## Example
//!
//! ```
//! use hybrid_exchange::orderbook::Clob;
//! use hybrid_exchange::types::{Address, Order, OrderId, Side};
//!
//! let mut clob = Clob::with_capacity(16);
//! let id = |seq| OrderId::new(Address::repeat(1), seq);
//!
//! clob.add_order(Order::new(id(1), "abc/usdt", Side::Buy, 500, 8, 10, 1, 0));
//! clob.add_order(Order::new(id(2), "abc/usdt", Side::Sell, 510, 8, 10, 1, 1));
//!
//! assert_eq!(clob.best_bid(), Some(500));
//! assert_eq!(clob.best_ask(), Some(510));
//! ```

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use slab::Slab;

use crate::orderbook::{OrderNode, PriceLevel};
use crate::types::{Order, OrderId, Side};

/// Slab-backed order book of a single pair.
#[derive(Debug, Clone, Default)]
pub struct Clob {
    orders: Slab<OrderNode>,

    /// Key: Reverse(price) for descending order
    bids: BTreeMap<Reverse<u64>, PriceLevel>,

    asks: BTreeMap<u64, PriceLevel>,

    /// Order ID to slab key mapping
    by_id: HashMap<OrderId, usize>,

    bid_count: usize,
    ask_count: usize,
}

impl Clob {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a book with pre-allocated capacity
    pub fn with_capacity(order_capacity: usize) -> Self {
        Self {
            orders: Slab::with_capacity(order_capacity),
            by_id: HashMap::with_capacity(order_capacity),
            ..Self::default()
        }
    }

    // ========================================================================
    // Size
    // ========================================================================

    #[inline]
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Number of resting orders on `side`
    pub fn side_count(&self, side: Side) -> usize {
        match side {
            Side::Buy => self.bid_count,
            Side::Sell => self.ask_count,
        }
    }

    // ========================================================================
    // Order Management
    // ========================================================================

    /// Add an order at its price level, in time position.
    ///
    /// Returns the slab key, or `None` if the id is already in the book.
    pub fn add_order(&mut self, order: Order) -> Option<usize> {
        if self.by_id.contains_key(&order.id) {
            return None;
        }
        let order_id = order.id;
        let price = order.price;
        let side = order.side;

        let key = self.orders.insert(OrderNode::new(order));
        self.by_id.insert(order_id, key);

        match side {
            Side::Buy => {
                let level = self
                    .bids
                    .entry(Reverse(price))
                    .or_insert_with(|| PriceLevel::new(price));
                level.insert(key, &mut self.orders);
                self.bid_count += 1;
            }
            Side::Sell => {
                let level = self
                    .asks
                    .entry(price)
                    .or_insert_with(|| PriceLevel::new(price));
                level.insert(key, &mut self.orders);
                self.ask_count += 1;
            }
        }

        Some(key)
    }

    /// Remove an order by id, dropping its level once empty.
    pub fn remove_order(&mut self, order_id: &OrderId) -> Option<Order> {
        let key = self.by_id.remove(order_id)?;
        let node = self.orders.get(key)?;
        let price = node.price();
        let side = node.order.side;

        match side {
            Side::Buy => {
                if let Some(level) = self.bids.get_mut(&Reverse(price)) {
                    level.remove(key, &mut self.orders);
                    self.bid_count -= 1;
                    if level.is_empty() {
                        self.bids.remove(&Reverse(price));
                    }
                }
            }
            Side::Sell => {
                if let Some(level) = self.asks.get_mut(&price) {
                    level.remove(key, &mut self.orders);
                    self.ask_count -= 1;
                    if level.is_empty() {
                        self.asks.remove(&price);
                    }
                }
            }
        }

        Some(self.orders.remove(key).order)
    }

    /// Replace the stored state of an order in place.
    ///
    /// Price, side and time key must match the stored order; returns
    /// `false` when the id is unknown or they differ.
    pub fn update_order(&mut self, order: &Order) -> bool {
        let Some(&key) = self.by_id.get(&order.id) else {
            return false;
        };
        let node = &mut self.orders[key];
        if node.order.price != order.price
            || node.order.side != order.side
            || node.order.time_key() != order.time_key()
        {
            return false;
        }
        let old_left = node.order.left_stock;
        node.order = order.clone();

        let level = match order.side {
            Side::Buy => self.bids.get_mut(&Reverse(order.price)),
            Side::Sell => self.asks.get_mut(&order.price),
        };
        if let Some(level) = level {
            level.adjust_left(old_left, order.left_stock);
        }
        true
    }

    pub fn get(&self, order_id: &OrderId) -> Option<&Order> {
        let key = self.by_id.get(order_id)?;
        self.orders.get(*key).map(|node| &node.order)
    }

    // ========================================================================
    // Best Bid/Ask
    // ========================================================================

    /// Highest buy price
    #[inline]
    pub fn best_bid(&self) -> Option<u64> {
        self.bids.keys().next().map(|r| r.0)
    }

    /// Lowest sell price
    #[inline]
    pub fn best_ask(&self) -> Option<u64> {
        self.asks.keys().next().copied()
    }

    pub fn best_price(&self, side: Side) -> Option<u64> {
        match side {
            Side::Buy => self.best_bid(),
            Side::Sell => self.best_ask(),
        }
    }

    pub fn level(&self, side: Side, price: u64) -> Option<&PriceLevel> {
        match side {
            Side::Buy => self.bids.get(&Reverse(price)),
            Side::Sell => self.asks.get(&price),
        }
    }

    // ========================================================================
    // Iteration
    // ========================================================================

    /// Orders on `side` from the best price inward, oldest first within a price.
    pub fn iter_side(&self, side: Side) -> Box<dyn Iterator<Item = &Order> + '_> {
        let slab = &self.orders;
        match side {
            Side::Buy => Box::new(self.bids.values().flat_map(move |level| level.iter(slab))),
            Side::Sell => Box::new(self.asks.values().flat_map(move |level| level.iter(slab))),
        }
    }

    /// Every order in the book, in slab order.
    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter().map(|(_, node)| &node.order)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Address;

    fn create_order(seq: u64, side: Side, price: u64, quantity: u128) -> Order {
        Order::new(
            OrderId::new(Address::repeat(1), seq),
            "abc/usdt",
            side,
            price,
            8,
            quantity,
            1,
            seq,
        )
    }

    fn id(seq: u64) -> OrderId {
        OrderId::new(Address::repeat(1), seq)
    }

    #[test]
    fn test_clob_new() {
        let clob = Clob::new();

        assert!(clob.is_empty());
        assert_eq!(clob.side_count(Side::Buy), 0);
        assert_eq!(clob.side_count(Side::Sell), 0);
        assert!(clob.best_bid().is_none());
        assert!(clob.best_ask().is_none());
    }

    #[test]
    fn test_clob_add_orders() {
        let mut clob = Clob::with_capacity(100);

        clob.add_order(create_order(1, Side::Buy, 500, 10)).unwrap();
        clob.add_order(create_order(2, Side::Sell, 510, 10)).unwrap();

        assert_eq!(clob.order_count(), 2);
        assert_eq!(clob.side_count(Side::Buy), 1);
        assert_eq!(clob.side_count(Side::Sell), 1);
    }

    #[test]
    fn test_clob_rejects_duplicate_id() {
        let mut clob = Clob::new();
        assert!(clob.add_order(create_order(1, Side::Buy, 500, 10)).is_some());
        assert!(clob.add_order(create_order(1, Side::Buy, 400, 10)).is_none());
        assert_eq!(clob.order_count(), 1);
    }

    #[test]
    fn test_clob_price_priority() {
        let mut clob = Clob::new();

        clob.add_order(create_order(1, Side::Buy, 490, 1));
        clob.add_order(create_order(2, Side::Buy, 510, 1));
        clob.add_order(create_order(3, Side::Buy, 500, 1));
        clob.add_order(create_order(4, Side::Sell, 520, 1));
        clob.add_order(create_order(5, Side::Sell, 515, 1));

        assert_eq!(clob.best_bid(), Some(510));
        assert_eq!(clob.best_ask(), Some(515));

        let bids: Vec<u64> = clob.iter_side(Side::Buy).map(|o| o.price).collect();
        assert_eq!(bids, vec![510, 500, 490]);
        let asks: Vec<u64> = clob.iter_side(Side::Sell).map(|o| o.price).collect();
        assert_eq!(asks, vec![515, 520]);
    }

    #[test]
    fn test_clob_remove_order() {
        let mut clob = Clob::new();
        clob.add_order(create_order(1, Side::Buy, 500, 10));
        clob.add_order(create_order(2, Side::Buy, 490, 10));

        let removed = clob.remove_order(&id(1)).unwrap();
        assert_eq!(removed.id, id(1));
        assert!(clob.level(Side::Buy, 500).is_none());
        assert_eq!(clob.best_bid(), Some(490));
        assert!(clob.get(&id(1)).is_none());
        assert!(clob.remove_order(&id(1)).is_none());
    }

    #[test]
    fn test_clob_same_price_time_order() {
        let mut clob = Clob::new();
        clob.add_order(create_order(1, Side::Sell, 500, 100));
        clob.add_order(create_order(2, Side::Sell, 500, 200));
        clob.add_order(create_order(3, Side::Sell, 500, 300));

        let level = clob.level(Side::Sell, 500).unwrap();
        assert_eq!(level.total_left, 600);
        assert_eq!(level.order_count, 3);

        let seqs: Vec<u64> = clob.iter_side(Side::Sell).map(|o| o.id.sequence).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
    }

    #[test]
    fn test_clob_update_order() {
        let mut clob = Clob::new();
        let mut order = create_order(1, Side::Sell, 500, 100);
        clob.add_order(order.clone());

        order.record_fill(40, 200);
        assert!(clob.update_order(&order));
        assert_eq!(clob.get(&id(1)).unwrap().left_stock, 60);
        assert_eq!(clob.level(Side::Sell, 500).unwrap().total_left, 60);

        order.price = 501;
        assert!(!clob.update_order(&order));
        assert!(!clob.update_order(&create_order(9, Side::Sell, 500, 1)));
    }
}
