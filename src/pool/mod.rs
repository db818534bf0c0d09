//! Constant-product pool of each market.
//!
//! - [`PoolKeeper`]: create pair, mint, burn and their pricing previews
//! - [`ReserveStore`] / [`KvReserveStore`]: persistence seam for pool info
//!   and liquidity positions
//! - [`math`]: swap and price-targeting formulas used by the matching engine

pub mod keeper;
pub mod math;

#[cfg(test)]
mod proptest_properties;

pub use keeper::{KvReserveStore, PoolKeeper, ReserveStore};
