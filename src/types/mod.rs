//! Core data types for the exchange kernel
//!
//! ## Types
//!
//! - [`Order`], [`Side`], [`NewOrder`]: limit orders
//! - [`PoolInfo`], [`LiquidityPosition`]: per-market AMM state
//! - [`DealInfo`]: transient accumulator of one matching call
//! - [`SettlementEvent`]: records emitted for indexers
//! - [`BlockReceipt`]: end-of-block summary with the state root
//! - [`Address`], [`OrderId`], [`Coin`]: identifiers and amounts
//!
//! ## Fixed-Point Arithmetic
//!
//! Prices are stored as `u64` scaled by 10^8; token amounts are raw `u128`.

mod address;
mod deal;
mod event;
mod order;
mod pool;
mod receipt;
pub mod price;

pub use address::{Address, Coin, OrderId, ADDRESS_LEN};
pub use deal::DealInfo;
pub use event::{
    CancelReason, CancelRecord, FillRecord, OrderCreated, PoolDeal, Role, SettlementEvent,
};
pub use order::{NewOrder, Order, Side};
pub use pool::{split_pair, LiquidityPosition, PoolInfo, MAX_PAIR_LEN};
pub use receipt::BlockReceipt;
