//! Order node for slab-based storage.
//!
//! ## Design
//!
//! `OrderNode` wraps an `Order` with doubly-linked list pointers so an
//! order can be unlinked from its price level in O(1) given its slab key.
//!
//! ## Linked List
//!
//! Orders at the same price level form a doubly-linked list kept in
//! time order:
//! - `next`: the next (younger) order at this price
//! - `prev`: the previous (older) order at this price

use crate::types::{Order, OrderId};

/// Order node stored in the slab.
///
/// The pointers are slab keys (`usize`), not direct references.
#[derive(Debug, Clone)]
pub struct OrderNode {
    pub order: Order,

    /// Next order in the price level queue (slab key)
    /// None if this is the tail (youngest order)
    pub next: Option<usize>,

    /// Previous order in the price level queue (slab key)
    /// None if this is the head (oldest order)
    pub prev: Option<usize>,
}

impl OrderNode {
    /// Create a new order node (not yet linked)
    #[inline]
    pub fn new(order: Order) -> Self {
        Self {
            order,
            next: None,
            prev: None,
        }
    }

    /// Check if this node is unlinked (not part of any price level)
    #[inline]
    pub fn is_unlinked(&self) -> bool {
        self.next.is_none() && self.prev.is_none()
    }

    #[inline]
    pub fn order_id(&self) -> OrderId {
        self.order.id
    }

    #[inline]
    pub fn price(&self) -> u64 {
        self.order.price
    }

    /// Stock still open on this order
    #[inline]
    pub fn left_stock(&self) -> u128 {
        self.order.left_stock
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
