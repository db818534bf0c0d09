//! Persisted key layout.
//!
//! | Prefix | Table | Key |
//! |--------|-------|-----|
//! | `0x10` | primary orders | `pair, side, order id` |
//! | `0x11` | side range index | `pair, side, price, height, order index, order id` |
//! | `0x12` | per-user listing | `user, sequence` |
//! | `0x13` | used order ids | `user, sequence` |
//! | `0x20` | pool info | `pair` |
//! | `0x21` | liquidity positions | `pair, owner` |
//! | `0x30` | available balances | `account, denom` |
//! | `0x31` | frozen balances | `account, denom` |
//! | `0x32` | module balances | `module, denom` |
//!
//! Integers are big-endian so byte order equals numeric order. Pairs are
//! length-prefixed so one pair's keys never interleave with another's.
//! Bid prices are stored as `u64::MAX - price`: one forward scan of either
//! side yields the best price first and, within a price, the oldest order
//! first.

use crate::types::{Address, OrderId, Side, ADDRESS_LEN};

pub const ORDER_PREFIX: u8 = 0x10;
pub const RANGE_PREFIX: u8 = 0x11;
pub const USER_PREFIX: u8 = 0x12;
pub const USED_ID_PREFIX: u8 = 0x13;
pub const POOL_PREFIX: u8 = 0x20;
pub const POSITION_PREFIX: u8 = 0x21;
pub const BALANCE_PREFIX: u8 = 0x30;
pub const FROZEN_PREFIX: u8 = 0x31;
pub const MODULE_PREFIX: u8 = 0x32;

/// Byte length of an encoded order id.
pub const ORDER_ID_LEN: usize = ADDRESS_LEN + 8;

fn with_pair(prefix: u8, pair: &str, extra: usize) -> Vec<u8> {
    let mut key = Vec::with_capacity(2 + pair.len() + extra);
    key.push(prefix);
    key.push(pair.len() as u8);
    key.extend_from_slice(pair.as_bytes());
    key
}

/// Sort key for a price on `side`.
#[inline]
pub fn encode_price(side: Side, price: u64) -> [u8; 8] {
    match side {
        Side::Buy => (u64::MAX - price).to_be_bytes(),
        Side::Sell => price.to_be_bytes(),
    }
}

/// Inverse of [`encode_price`].
#[inline]
pub fn decode_price(side: Side, bytes: [u8; 8]) -> u64 {
    let raw = u64::from_be_bytes(bytes);
    match side {
        Side::Buy => u64::MAX - raw,
        Side::Sell => raw,
    }
}

// ----------------------------------------------------------------------------
// Orders
// ----------------------------------------------------------------------------

pub fn order_key(pair: &str, side: Side, id: &OrderId) -> Vec<u8> {
    let mut key = with_pair(ORDER_PREFIX, pair, 1 + ORDER_ID_LEN);
    key.push(side.to_u8());
    key.extend_from_slice(&id.key_bytes());
    key
}

/// Prefix of every primary order key.
pub fn all_orders_prefix() -> Vec<u8> {
    vec![ORDER_PREFIX]
}

pub fn range_side_prefix(pair: &str, side: Side) -> Vec<u8> {
    let mut key = with_pair(RANGE_PREFIX, pair, 1 + 24 + ORDER_ID_LEN);
    key.push(side.to_u8());
    key
}

pub fn range_key(
    pair: &str,
    side: Side,
    price: u64,
    height: u64,
    order_index: u64,
    id: &OrderId,
) -> Vec<u8> {
    let mut key = range_side_prefix(pair, side);
    key.extend_from_slice(&encode_price(side, price));
    key.extend_from_slice(&height.to_be_bytes());
    key.extend_from_slice(&order_index.to_be_bytes());
    key.extend_from_slice(&id.key_bytes());
    key
}

/// Price and order id encoded in a range key, given its side prefix length.
pub fn parse_range_key(key: &[u8], side: Side, prefix_len: usize) -> Option<(u64, OrderId)> {
    let rest = key.get(prefix_len..)?;
    if rest.len() != 24 + ORDER_ID_LEN {
        return None;
    }
    let price_bytes: [u8; 8] = rest[..8].try_into().ok()?;
    let id = parse_order_id(&rest[24..])?;
    Some((decode_price(side, price_bytes), id))
}

pub fn parse_order_id(bytes: &[u8]) -> Option<OrderId> {
    if bytes.len() != ORDER_ID_LEN {
        return None;
    }
    let sender: [u8; ADDRESS_LEN] = bytes[..ADDRESS_LEN].try_into().ok()?;
    let sequence = u64::from_be_bytes(bytes[ADDRESS_LEN..].try_into().ok()?);
    Some(OrderId::new(Address(sender), sequence))
}

pub fn user_prefix(user: &Address) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + ORDER_ID_LEN);
    key.push(USER_PREFIX);
    key.extend_from_slice(user.as_bytes());
    key
}

pub fn user_key(id: &OrderId) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + ORDER_ID_LEN);
    key.push(USER_PREFIX);
    key.extend_from_slice(&id.key_bytes());
    key
}

pub fn used_id_key(id: &OrderId) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + ORDER_ID_LEN);
    key.push(USED_ID_PREFIX);
    key.extend_from_slice(&id.key_bytes());
    key
}

// ----------------------------------------------------------------------------
// Pools
// ----------------------------------------------------------------------------

pub fn pool_key(pair: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + pair.len());
    key.push(POOL_PREFIX);
    key.extend_from_slice(pair.as_bytes());
    key
}

pub fn position_prefix(pair: &str) -> Vec<u8> {
    with_pair(POSITION_PREFIX, pair, ADDRESS_LEN)
}

pub fn position_key(pair: &str, owner: &Address) -> Vec<u8> {
    let mut key = position_prefix(pair);
    key.extend_from_slice(owner.as_bytes());
    key
}

// ----------------------------------------------------------------------------
// Balances
// ----------------------------------------------------------------------------

/// Key of an account balance; `prefix` selects available or frozen funds.
pub fn account_balance_key(prefix: u8, account: &Address, denom: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + ADDRESS_LEN + denom.len());
    key.push(prefix);
    key.extend_from_slice(account.as_bytes());
    key.extend_from_slice(denom.as_bytes());
    key
}

pub fn module_balance_key(module: &str, denom: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(2 + module.len() + denom.len());
    key.push(MODULE_PREFIX);
    key.push(module.len() as u8);
    key.extend_from_slice(module.as_bytes());
    key.extend_from_slice(denom.as_bytes());
    key
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn id(seq: u64) -> OrderId {
        OrderId::new(Address::repeat(7), seq)
    }

    #[test]
    fn test_price_encoding_roundtrip() {
        for side in [Side::Buy, Side::Sell] {
            for price in [0, 1, 12_345, u64::MAX] {
                assert_eq!(decode_price(side, encode_price(side, price)), price);
            }
        }
    }

    #[test]
    fn test_sell_range_keys_ascend_by_price() {
        let low = range_key("a/b", Side::Sell, 20, 9, 9, &id(9));
        let high = range_key("a/b", Side::Sell, 30, 1, 0, &id(1));
        assert!(low < high);
    }

    #[test]
    fn test_buy_range_keys_descend_by_price() {
        let high = range_key("a/b", Side::Buy, 30, 9, 9, &id(9));
        let low = range_key("a/b", Side::Buy, 20, 1, 0, &id(1));
        assert!(high < low);
    }

    #[test]
    fn test_same_price_orders_by_time_on_both_sides() {
        for side in [Side::Buy, Side::Sell] {
            let older = range_key("a/b", side, 50, 3, 7, &id(2));
            let newer_index = range_key("a/b", side, 50, 3, 8, &id(1));
            let newer_height = range_key("a/b", side, 50, 4, 0, &id(0));
            assert!(older < newer_index);
            assert!(newer_index < newer_height);
        }
    }

    #[test]
    fn test_parse_range_key() {
        let prefix_len = range_side_prefix("a/b", Side::Buy).len();
        let key = range_key("a/b", Side::Buy, 77, 1, 2, &id(5));
        assert_eq!(parse_range_key(&key, Side::Buy, prefix_len), Some((77, id(5))));
        assert_eq!(parse_range_key(&key[..key.len() - 1], Side::Buy, prefix_len), None);
    }

    #[test]
    fn test_pairs_do_not_interleave() {
        // "ab/c" must not share a side prefix with "ab/cd"
        let short = range_side_prefix("ab/c", Side::Sell);
        let long = range_key("ab/cd", Side::Sell, 1, 1, 1, &id(1));
        assert!(!long.starts_with(&short));
    }

    #[test]
    fn test_user_prefix_covers_user_keys() {
        let key = user_key(&id(3));
        assert!(key.starts_with(&user_prefix(&Address::repeat(7))));
        assert!(!key.starts_with(&user_prefix(&Address::repeat(8))));
    }
}
