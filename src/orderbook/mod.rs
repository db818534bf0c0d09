//! Order book index.
//!
//! ## Architecture
//!
//! [`OrderIndex`] is the seam the matching engine works against. Two
//! implementations behave identically:
//!
//! - [`KvOrderIndex`]: persists through a [`crate::store::KvStore`] using the
//!   layout in [`crate::store::keys`]; this is what replicas run
//! - [`BookIndex`]: slab-backed in-memory books per pair, built from
//!   [`Clob`], [`PriceLevel`] and [`OrderNode`]
//!
//! ## Priority
//!
//! Price first (highest bid, lowest ask), then `(height, order_index)`,
//! then order id.
//!
//! | Operation | KvOrderIndex | BookIndex |
//! |-----------|--------------|-----------|
//! | Add / delete | O(log n) | O(log n) |
//! | Lookup by id | O(log n) | O(log n) |
//! | Best price | O(log n) | O(1)* |
//! | Matched orders | O(k log n) | O(k) |
//!
//! *First key of the level map
//!
//! ## Example
//!
//! ```
//! use hybrid_exchange::orderbook::{BookIndex, OrderIndex};
//! use hybrid_exchange::types::{Address, Order, OrderId, Side};
//!
//! let mut index = BookIndex::new();
//! let id = |seq| OrderId::new(Address::repeat(1), seq);
//! for (seq, price) in [(1, 30), (2, 20), (3, 40)] {
//!     index.add_order(&Order::new(id(seq), "abc/usdt", Side::Sell, price, 8, 10, 1, seq));
//! }
//! assert_eq!(index.best_price("abc/usdt", Side::Sell), 20);
//! ```

pub mod book_index;
pub mod clob;
pub mod kv_index;
pub mod level;
pub mod node;

pub use book_index::BookIndex;
pub use clob::Clob;
pub use kv_index::KvOrderIndex;
pub use level::PriceLevel;
pub use node::OrderNode;

use crate::types::{Address, Order, OrderId, Side};

/// Price-time index of resting orders for every pair.
///
/// Mutating an order the index does not hold, or finding an entry whose
/// record is missing, is state corruption and aborts.
pub trait OrderIndex {
    /// Index a new resting order and mark its id used.
    fn add_order(&mut self, order: &Order);

    /// Persist the mutated state of an indexed order. Its price, side and
    /// time key must be unchanged.
    fn update_order(&mut self, order: &Order);

    /// Remove an order. Its id stays marked as used.
    fn del_order(&mut self, order: &Order);

    fn get_order(&self, id: &OrderId) -> Option<Order>;

    fn has_order(&self, id: &OrderId) -> bool {
        self.get_order(id).is_some()
    }

    /// Whether an order with this id was ever accepted.
    fn is_id_used(&self, id: &OrderId) -> bool;

    fn mark_id_used(&mut self, id: &OrderId);

    /// Whether `side` of `pair` has any resting order.
    fn has_side(&self, pair: &str, side: Side) -> bool;

    /// Best price on `side` of `pair`: highest bid or lowest ask.
    ///
    /// # Panics
    ///
    /// Panics when the side is empty; check [`OrderIndex::has_side`] first.
    fn best_price(&self, pair: &str, side: Side) -> u64;

    /// Resting orders an incoming order may trade with, best first.
    ///
    /// Walks the opposite side while prices still cross the incoming limit
    /// and stops once the collected `left_stock` covers the incoming
    /// `left_stock`.
    fn matched_orders(&self, incoming: &Order) -> Vec<Order>;

    /// Resting orders of one sender, by sequence.
    fn orders_of(&self, user: &Address) -> Vec<Order>;

    /// Every resting order, by pair, side and id.
    fn all_orders(&self) -> Vec<Order>;
}

// ============================================================================
// Conformance Tests
// ============================================================================
