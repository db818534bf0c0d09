//! SSZ records for persisted state.
//!
//! Records keep raw fixed-size fields (`side_raw: u8`, pair symbol as
//! `pair_len` + `pair_raw`) so the SSZ layout is a flat container. Reading a
//! record that does not decode, or whose raw fields are out of range, is
//! state corruption: nothing but this module ever writes these keys.

use ssz_rs::prelude::*;

use crate::error::corrupted;
use crate::types::{Address, LiquidityPosition, Order, OrderId, PoolInfo, Side, MAX_PAIR_LEN};

// ============================================================================
// Helpers
// ============================================================================

/// Serialize a record, aborting on failure.
pub fn encode<T: SimpleSerialize>(value: &T, context: &'static str) -> Vec<u8> {
    match ssz_rs::serialize(value) {
        Ok(bytes) => bytes,
        Err(err) => corrupted(context, format!("encode failed: {err:?}")),
    }
}

/// Deserialize a stored record, aborting on failure.
pub fn decode<T: SimpleSerialize>(bytes: &[u8], context: &'static str) -> T {
    match ssz_rs::deserialize::<T>(bytes) {
        Ok(value) => value,
        Err(err) => corrupted(context, format!("decode failed: {err:?}")),
    }
}

fn pack_pair(pair: &str) -> (u8, [u8; MAX_PAIR_LEN]) {
    let bytes = pair.as_bytes();
    if bytes.len() > MAX_PAIR_LEN {
        corrupted("codec", format!("pair symbol too long: {pair}"));
    }
    let mut raw = [0u8; MAX_PAIR_LEN];
    raw[..bytes.len()].copy_from_slice(bytes);
    (bytes.len() as u8, raw)
}

fn unpack_pair(len: u8, raw: &[u8; MAX_PAIR_LEN], context: &'static str) -> String {
    let len = usize::from(len);
    let bytes = raw.get(..len).unwrap_or_else(|| corrupted(context, "pair length out of range"));
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => corrupted(context, "pair symbol is not utf-8"),
    }
}

fn side_from_raw(raw: u8, context: &'static str) -> Side {
    Side::from_u8(raw).unwrap_or_else(|| corrupted(context, format!("invalid side byte {raw}")))
}

// ============================================================================
// Order record
// ============================================================================

/// Stored form of an [`Order`].
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct OrderRecord {
    pub sender: [u8; 32],
    pub sequence: u64,
    pub pair_len: u8,
    pub pair_raw: [u8; 32],
    /// Side as u8 (0 = Buy, 1 = Sell)
    pub side_raw: u8,
    pub price: u64,
    pub price_precision: u8,
    pub quantity: u128,
    pub left_stock: u128,
    pub freeze: u128,
    pub deal_stock: u128,
    pub deal_money: u128,
    pub height: u64,
    pub order_index: u64,
}

impl From<&Order> for OrderRecord {
    fn from(order: &Order) -> Self {
        let (pair_len, pair_raw) = pack_pair(&order.pair);
        Self {
            sender: order.id.sender.0,
            sequence: order.id.sequence,
            pair_len,
            pair_raw,
            side_raw: order.side.to_u8(),
            price: order.price,
            price_precision: order.price_precision,
            quantity: order.quantity,
            left_stock: order.left_stock,
            freeze: order.freeze,
            deal_stock: order.deal_stock,
            deal_money: order.deal_money,
            height: order.height,
            order_index: order.order_index,
        }
    }
}

impl OrderRecord {
    pub fn into_order(self) -> Order {
        Order {
            id: OrderId::new(Address(self.sender), self.sequence),
            pair: unpack_pair(self.pair_len, &self.pair_raw, "order record"),
            side: side_from_raw(self.side_raw, "order record"),
            price: self.price,
            price_precision: self.price_precision,
            quantity: self.quantity,
            left_stock: self.left_stock,
            freeze: self.freeze,
            deal_stock: self.deal_stock,
            deal_money: self.deal_money,
            height: self.height,
            order_index: self.order_index,
        }
    }
}

pub fn encode_order(order: &Order) -> Vec<u8> {
    encode(&OrderRecord::from(order), "order record")
}

pub fn decode_order(bytes: &[u8]) -> Order {
    decode::<OrderRecord>(bytes, "order record").into_order()
}

// ============================================================================
// User listing entry
// ============================================================================

/// Value of the per-user table: where the primary record lives.
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct UserEntry {
    pub pair_len: u8,
    pub pair_raw: [u8; 32],
    pub side_raw: u8,
}

impl UserEntry {
    pub fn new(pair: &str, side: Side) -> Self {
        let (pair_len, pair_raw) = pack_pair(pair);
        Self {
            pair_len,
            pair_raw,
            side_raw: side.to_u8(),
        }
    }

    pub fn pair(&self) -> String {
        unpack_pair(self.pair_len, &self.pair_raw, "user entry")
    }

    pub fn side(&self) -> Side {
        side_from_raw(self.side_raw, "user entry")
    }
}

// ============================================================================
// Pool records
// ============================================================================

/// Stored form of a [`PoolInfo`].
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct PoolRecord {
    pub pair_len: u8,
    pub pair_raw: [u8; 32],
    pub creator: [u8; 32],
    pub stock_amm_reserve: u128,
    pub money_amm_reserve: u128,
    pub stock_order_book_reserve: u128,
    pub money_order_book_reserve: u128,
    pub total_supply: u128,
    pub price_precision: u8,
    pub last_price: u64,
}

impl From<&PoolInfo> for PoolRecord {
    fn from(pool: &PoolInfo) -> Self {
        let (pair_len, pair_raw) = pack_pair(&pool.pair);
        Self {
            pair_len,
            pair_raw,
            creator: pool.creator.0,
            stock_amm_reserve: pool.stock_amm_reserve,
            money_amm_reserve: pool.money_amm_reserve,
            stock_order_book_reserve: pool.stock_order_book_reserve,
            money_order_book_reserve: pool.money_order_book_reserve,
            total_supply: pool.total_supply,
            price_precision: pool.price_precision,
            last_price: pool.last_price,
        }
    }
}

impl PoolRecord {
    pub fn into_pool(self) -> PoolInfo {
        PoolInfo {
            pair: unpack_pair(self.pair_len, &self.pair_raw, "pool record"),
            creator: Address(self.creator),
            stock_amm_reserve: self.stock_amm_reserve,
            money_amm_reserve: self.money_amm_reserve,
            stock_order_book_reserve: self.stock_order_book_reserve,
            money_order_book_reserve: self.money_order_book_reserve,
            total_supply: self.total_supply,
            price_precision: self.price_precision,
            last_price: self.last_price,
        }
    }
}

/// Stored form of a [`LiquidityPosition`]; the key carries pair and owner.
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct PositionRecord {
    pub owner: [u8; 32],
    pub shares: u128,
}

impl PositionRecord {
    pub fn into_position(self, pair: &str) -> LiquidityPosition {
        LiquidityPosition {
            pair: pair.to_string(),
            owner: Address(self.owner),
            shares: self.shares,
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
