//! In-memory [`OrderIndex`] over per-pair slab books.
//!
//! Transactions snapshot the whole index on `begin` and restore it on
//! `rollback`, which is cheap for the book sizes this index is meant for
//! (tests, benchmarks, simulations).

use std::collections::{BTreeMap, BTreeSet};

use sha2::{Digest, Sha256};

use crate::error::corrupted;
use crate::orderbook::{Clob, OrderIndex};
use crate::store::codec::encode_order;
use crate::store::{StateDigest, Transactional};
use crate::types::{Address, Order, OrderId, Side};

#[derive(Debug, Clone, Default)]
struct IndexState {
    books: BTreeMap<String, Clob>,
    /// Order id to the pair whose book holds it
    locator: BTreeMap<OrderId, String>,
    used_ids: BTreeSet<OrderId>,
}

/// Slab-backed order index keyed by pair.
#[derive(Debug, Clone, Default)]
pub struct BookIndex {
    state: IndexState,
    snapshot: Option<Box<IndexState>>,
}

impl BookIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Book of one pair, if any order was ever placed in it.
    pub fn book(&self, pair: &str) -> Option<&Clob> {
        self.state.books.get(pair)
    }

    /// Total resting orders across all pairs
    pub fn len(&self) -> usize {
        self.state.locator.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.locator.is_empty()
    }
}

impl OrderIndex for BookIndex {
    fn add_order(&mut self, order: &Order) {
        let book = self.state.books.entry(order.pair.clone()).or_default();
        if book.add_order(order.clone()).is_none() {
            corrupted("book index", format!("order {} indexed twice", order.id));
        }
        self.state.locator.insert(order.id, order.pair.clone());
        self.state.used_ids.insert(order.id);
    }

    fn update_order(&mut self, order: &Order) {
        let updated = self
            .state
            .books
            .get_mut(&order.pair)
            .map(|book| book.update_order(order))
            .unwrap_or(false);
        if !updated {
            corrupted("book index", format!("update of unindexed order {}", order.id));
        }
    }

    fn del_order(&mut self, order: &Order) {
        let removed = self
            .state
            .books
            .get_mut(&order.pair)
            .and_then(|book| book.remove_order(&order.id));
        if removed.is_none() {
            corrupted("book index", format!("delete of unindexed order {}", order.id));
        }
        self.state.locator.remove(&order.id);
    }

    fn get_order(&self, id: &OrderId) -> Option<Order> {
        let pair = self.state.locator.get(id)?;
        match self.state.books.get(pair).and_then(|book| book.get(id)) {
            Some(order) => Some(order.clone()),
            None => corrupted("book index", format!("order {id} located but missing")),
        }
    }

    fn has_order(&self, id: &OrderId) -> bool {
        self.state.locator.contains_key(id)
    }

    fn is_id_used(&self, id: &OrderId) -> bool {
        self.state.used_ids.contains(id)
    }

    fn mark_id_used(&mut self, id: &OrderId) {
        self.state.used_ids.insert(*id);
    }

    fn has_side(&self, pair: &str, side: Side) -> bool {
        self.state
            .books
            .get(pair)
            .map(|book| book.side_count(side) > 0)
            .unwrap_or(false)
    }

    fn best_price(&self, pair: &str, side: Side) -> u64 {
        match self.state.books.get(pair).and_then(|book| book.best_price(side)) {
            Some(price) => price,
            None => panic!("best_price on empty {side:?} side of {pair}"),
        }
    }

    fn matched_orders(&self, incoming: &Order) -> Vec<Order> {
        let Some(book) = self.state.books.get(&incoming.pair) else {
            return Vec::new();
        };
        let mut matched = Vec::new();
        let mut covered: u128 = 0;
        for resting in book.iter_side(incoming.side.opposite()) {
            if covered >= incoming.left_stock
                || !incoming.side.crosses(incoming.price, resting.price)
            {
                break;
            }
            covered = covered.saturating_add(resting.left_stock);
            matched.push(resting.clone());
        }
        matched
    }

    fn orders_of(&self, user: &Address) -> Vec<Order> {
        let from = OrderId::new(*user, 0);
        let to = OrderId::new(*user, u64::MAX);
        self.state
            .locator
            .range(from..=to)
            .filter_map(|(id, _)| self.get_order(id))
            .collect()
    }

    fn all_orders(&self) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .state
            .books
            .values()
            .flat_map(|book| book.iter().cloned())
            .collect();
        // Same order as the persistent layout: pair (length-prefixed), side, id
        orders.sort_by(|a, b| {
            (a.pair.len(), a.pair.as_bytes(), a.side, a.id)
                .cmp(&(b.pair.len(), b.pair.as_bytes(), b.side, b.id))
        });
        orders
    }
}

impl Transactional for BookIndex {
    fn begin(&mut self) {
        if self.snapshot.is_none() {
            self.snapshot = Some(Box::new(self.state.clone()));
        }
    }

    fn commit(&mut self) {
        self.snapshot = None;
    }

    fn rollback(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            self.state = *snapshot;
        }
    }
}

impl StateDigest for BookIndex {
    fn state_hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        for order in self.all_orders() {
            let record = encode_order(&order);
            hasher.update((record.len() as u64).to_be_bytes());
            hasher.update(&record);
        }
        for id in &self.state.used_ids {
            hasher.update(id.key_bytes());
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(&hasher.finalize());
        out
    }
}
