//! Persistent [`OrderIndex`] over a [`KvStore`].
//!
//! See [`crate::store::keys`] for the table layout. Range entries carry no
//! value; the order id at the end of the key locates the primary record.

use crate::error::corrupted;
use crate::orderbook::OrderIndex;
use crate::store::codec::{self, decode_order, encode_order, UserEntry};
use crate::store::keys;
use crate::store::{KvStore, StateDigest, Transactional};
use crate::types::{Address, Order, OrderId, Side};

/// Order index persisted through a key-value store.
#[derive(Debug, Clone, Default)]
pub struct KvOrderIndex<S> {
    store: S,
}

impl<S: KvStore> KvOrderIndex<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn load(&self, pair: &str, side: Side, id: &OrderId) -> Option<Order> {
        self.store
            .get(&keys::order_key(pair, side, id))
            .map(|bytes| decode_order(&bytes))
    }

    /// Stored copy of an order the caller expects to be indexed.
    fn load_existing(&self, order: &Order, op: &str) -> Order {
        match self.load(&order.pair, order.side, &order.id) {
            Some(stored) => stored,
            None => corrupted("order index", format!("{op} of unindexed order {}", order.id)),
        }
    }

    fn range_key_of(order: &Order) -> Vec<u8> {
        keys::range_key(
            &order.pair,
            order.side,
            order.price,
            order.height,
            order.order_index,
            &order.id,
        )
    }
}

impl<S: KvStore> OrderIndex for KvOrderIndex<S> {
    fn add_order(&mut self, order: &Order) {
        let primary = keys::order_key(&order.pair, order.side, &order.id);
        if self.store.has(&primary) {
            corrupted("order index", format!("order {} indexed twice", order.id));
        }
        self.store.set(primary, encode_order(order));
        self.store.set(Self::range_key_of(order), Vec::new());
        self.store.set(
            keys::user_key(&order.id),
            codec::encode(&UserEntry::new(&order.pair, order.side), "user entry"),
        );
        self.mark_id_used(&order.id);
    }

    fn update_order(&mut self, order: &Order) {
        let stored = self.load_existing(order, "update");
        if Self::range_key_of(&stored) != Self::range_key_of(order) {
            corrupted("order index", format!("order {} changed its sort key", order.id));
        }
        self.store
            .set(keys::order_key(&order.pair, order.side, &order.id), encode_order(order));
    }

    fn del_order(&mut self, order: &Order) {
        let stored = self.load_existing(order, "delete");
        self.store
            .delete(&keys::order_key(&stored.pair, stored.side, &stored.id));
        self.store.delete(&Self::range_key_of(&stored));
        self.store.delete(&keys::user_key(&stored.id));
    }

    fn get_order(&self, id: &OrderId) -> Option<Order> {
        let bytes = self.store.get(&keys::user_key(id))?;
        let entry: UserEntry = codec::decode(&bytes, "user entry");
        match self.load(&entry.pair(), entry.side(), id) {
            Some(order) => Some(order),
            None => corrupted("order index", format!("user entry without order {id}")),
        }
    }

    fn has_order(&self, id: &OrderId) -> bool {
        self.store.has(&keys::user_key(id))
    }

    fn is_id_used(&self, id: &OrderId) -> bool {
        self.store.has(&keys::used_id_key(id))
    }

    fn mark_id_used(&mut self, id: &OrderId) {
        self.store.set(keys::used_id_key(id), Vec::new());
    }

    fn has_side(&self, pair: &str, side: Side) -> bool {
        self.store
            .scan_prefix(&keys::range_side_prefix(pair, side))
            .next()
            .is_some()
    }

    fn best_price(&self, pair: &str, side: Side) -> u64 {
        let prefix = keys::range_side_prefix(pair, side);
        let first = self.store.scan_prefix(&prefix).next();
        match first {
            Some((key, _)) => match keys::parse_range_key(key, side, prefix.len()) {
                Some((price, _)) => price,
                None => corrupted("order index", "malformed range key"),
            },
            None => panic!("best_price on empty {side:?} side of {pair}"),
        }
    }

    fn matched_orders(&self, incoming: &Order) -> Vec<Order> {
        let side = incoming.side.opposite();
        let prefix = keys::range_side_prefix(&incoming.pair, side);
        let mut matched = Vec::new();
        let mut covered: u128 = 0;

        for (key, _) in self.store.scan_prefix(&prefix) {
            if covered >= incoming.left_stock {
                break;
            }
            let Some((price, id)) = keys::parse_range_key(key, side, prefix.len()) else {
                corrupted("order index", "malformed range key");
            };
            if !incoming.side.crosses(incoming.price, price) {
                break;
            }
            let Some(resting) = self.load(&incoming.pair, side, &id) else {
                corrupted("order index", format!("range entry without order {id}"));
            };
            covered = covered.saturating_add(resting.left_stock);
            matched.push(resting);
        }
        matched
    }

    fn orders_of(&self, user: &Address) -> Vec<Order> {
        let prefix = keys::user_prefix(user);
        self.store
            .scan_prefix(&prefix)
            .map(|(key, value)| {
                let Some(id) = keys::parse_order_id(&key[1..]) else {
                    corrupted("order index", "malformed user key");
                };
                let entry: UserEntry = codec::decode(value, "user entry");
                match self.load(&entry.pair(), entry.side(), &id) {
                    Some(order) => order,
                    None => corrupted("order index", format!("user entry without order {id}")),
                }
            })
            .collect()
    }

    fn all_orders(&self) -> Vec<Order> {
        self.store
            .scan_prefix(&keys::all_orders_prefix())
            .map(|(_, value)| decode_order(value))
            .collect()
    }
}

impl<S: Transactional> Transactional for KvOrderIndex<S> {
    fn begin(&mut self) {
        self.store.begin();
    }

    fn commit(&mut self) {
        self.store.commit();
    }

    fn rollback(&mut self) {
        self.store.rollback();
    }
}

impl<S: StateDigest> StateDigest for KvOrderIndex<S> {
    fn state_hash(&self) -> [u8; 32] {
        self.store.state_hash()
    }
}
