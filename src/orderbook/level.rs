//! Price level management for orders at the same price.
//!
//! ## Queue Structure
//!
//! ```text
//! head (oldest) <-> order2 <-> order3 <-> tail (youngest)
//! ```
//!
//! The queue is sorted by [`Order::time_key`]. Orders normally arrive in
//! time order and are appended at the tail; an order with an older key
//! (for example one reloaded from storage) is walked back into place.
//! Matching reads from the head; any order can be unlinked in O(1) using
//! its slab key.

use slab::Slab;

use crate::orderbook::OrderNode;
use crate::types::Order;

/// A price level containing orders at a single price.
///
/// Order data lives in the slab; this struct only holds queue metadata.
#[derive(Debug, Clone)]
pub struct PriceLevel {
    /// Price for this level (fixed-point, scaled by 10^8)
    pub price: u64,

    /// Total `left_stock` at this level
    pub total_left: u128,

    /// Head of the order queue (oldest order, slab key)
    pub head: Option<usize>,

    /// Tail of the order queue (youngest order, slab key)
    pub tail: Option<usize>,

    pub order_count: usize,
}

impl PriceLevel {
    /// Create a new empty price level
    pub fn new(price: u64) -> Self {
        Self {
            price,
            total_left: 0,
            head: None,
            tail: None,
            order_count: 0,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order_count == 0
    }

    /// Link `key` into the queue at its time position.
    ///
    /// # Panics
    ///
    /// Panics if the key doesn't exist in the slab
    pub fn insert(&mut self, key: usize, slab: &mut Slab<OrderNode>) {
        let time_key = slab[key].order.time_key();
        let left = slab[key].left_stock();

        // Youngest node not younger than the new one
        let mut after = self.tail;
        while let Some(k) = after {
            if slab[k].order.time_key() <= time_key {
                break;
            }
            after = slab[k].prev;
        }

        let next = match after {
            Some(prev_key) => slab[prev_key].next,
            None => self.head,
        };

        {
            let node = &mut slab[key];
            node.prev = after;
            node.next = next;
        }
        match after {
            Some(prev_key) => slab[prev_key].next = Some(key),
            None => self.head = Some(key),
        }
        match next {
            Some(next_key) => slab[next_key].prev = Some(key),
            None => self.tail = Some(key),
        }

        self.order_count += 1;
        self.total_left = self.total_left.saturating_add(left);
    }

    /// Unlink an order from the queue by slab key.
    ///
    /// # Returns
    ///
    /// The `left_stock` of the removed order
    pub fn remove(&mut self, key: usize, slab: &mut Slab<OrderNode>) -> u128 {
        let node = &slab[key];
        let left = node.left_stock();
        let prev_key = node.prev;
        let next_key = node.next;

        match prev_key {
            Some(prev) => slab[prev].next = next_key,
            None => self.head = next_key,
        }
        match next_key {
            Some(next) => slab[next].prev = prev_key,
            None => self.tail = prev_key,
        }

        let node = &mut slab[key];
        node.prev = None;
        node.next = None;

        self.order_count -= 1;
        self.total_left = self.total_left.saturating_sub(left);

        left
    }

    /// Account for an order whose `left_stock` went from `old` to `new`.
    pub fn adjust_left(&mut self, old: u128, new: u128) {
        self.total_left = self.total_left.saturating_sub(old).saturating_add(new);
    }

    /// Orders at this level, oldest first.
    pub fn iter<'a>(&self, slab: &'a Slab<OrderNode>) -> LevelIter<'a> {
        LevelIter {
            slab,
            cursor: self.head,
        }
    }
}

/// Iterator over one price level in time order.
pub struct LevelIter<'a> {
    slab: &'a Slab<OrderNode>,
    cursor: Option<usize>,
}

impl<'a> Iterator for LevelIter<'a> {
    type Item = &'a Order;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.slab.get(self.cursor?)?;
        self.cursor = node.next;
        Some(&node.order)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
