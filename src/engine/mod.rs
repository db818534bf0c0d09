//! Matching and settlement engine.
//!
//! ## Design Principles
//!
//! 1. **Determinism**: same state and command give the same result on every replica
//! 2. **Fixed-Point Math**: integer amounts, prices scaled by 10^8, no floats
//! 3. **Synchronous Execution**: no async in the hot path
//! 4. **Hybrid Liquidity**: each order trades against the book and the AMM pool
//!
//! ## Matching Rules
//!
//! - Buys walk the asks from the lowest price, sells walk the bids from the highest
//! - Before each resting order, the pool takes whatever volume moves its
//!   price to that order's price
//! - Book fills execute at the maker's price, oldest order first within a level
//! - After the book, the pool takes what it can up to the order's own limit
//! - The pool leg settles as one swap against the pre-order reserves
//! - Anything left rests in the book with its commitment frozen
//!
//! ## Rounding
//!
//! Fees owed by users round up; payouts to users round down.
//!
//! ## Example
//!
//! ```
//! use hybrid_exchange::config::MarketParams;
//! use hybrid_exchange::engine::{BlockContext, MatchingEngine, NullSink};
//! use hybrid_exchange::ledger::{MemLedger, MemReferrals};
//! use hybrid_exchange::orderbook::BookIndex;
//! use hybrid_exchange::pool::{KvReserveStore, PoolKeeper};
//! use hybrid_exchange::store::MemStore;
//! use hybrid_exchange::types::{Address, NewOrder, Side};
//!
//! let mut bank = MemLedger::new();
//! let referrals = MemReferrals::default();
//! let mut index = BookIndex::new();
//! let mut keeper = PoolKeeper::new(KvReserveStore::new(MemStore::new()));
//! let params = MarketParams::default();
//! let mut sink = NullSink;
//! let mut ctx = BlockContext::new(1);
//!
//! let alice = Address::repeat(1);
//! bank.mint(&alice, "abc", 1_000);
//! keeper.create_pair(alice, "abc/usdt", 2).unwrap();
//!
//! let mut engine = MatchingEngine::new(
//!     &mut bank, &referrals, &mut index, &mut keeper, &params, &mut sink,
//! );
//! let result = engine
//!     .add_limit_order(&mut ctx, NewOrder {
//!         sender: alice,
//!         sequence: 1,
//!         pair: "abc/usdt".into(),
//!         side: Side::Sell,
//!         price: 200_000_000,
//!         price_precision: 2,
//!         quantity: 100,
//!     })
//!     .unwrap();
//!
//! // nothing to trade with: the order rests
//! assert!(result.rested);
//! assert_eq!(bank.frozen(&alice, "abc"), 100);
//! ```

mod cancel;
mod context;
mod liquidity;
mod matcher;
mod settle;
mod sink;

pub use context::BlockContext;
pub use matcher::OrderResult;
pub use sink::{EventSink, NullSink, VecSink};

use crate::config::MarketParams;
use crate::ledger::{BalanceService, ReferralRegistry};
use crate::orderbook::OrderIndex;
use crate::pool::{PoolKeeper, ReserveStore};

/// Engine over borrowed state, built for the duration of one command.
///
/// Every collaborator is injected: the balance service moves tokens, the
/// referral registry prices rebates, the order index and the pool keeper
/// hold market state, and the sink receives settlement records.
pub struct MatchingEngine<'a, B: ?Sized, R: ?Sized, I: ?Sized, S> {
    bank: &'a mut B,
    referrals: &'a R,
    index: &'a mut I,
    keeper: &'a mut PoolKeeper<S>,
    params: &'a MarketParams,
    sink: &'a mut dyn EventSink,
}

impl<'a, B, R, I, S> MatchingEngine<'a, B, R, I, S>
where
    B: BalanceService + ?Sized,
    R: ReferralRegistry + ?Sized,
    I: OrderIndex + ?Sized,
    S: ReserveStore,
{
    pub fn new(
        bank: &'a mut B,
        referrals: &'a R,
        index: &'a mut I,
        keeper: &'a mut PoolKeeper<S>,
        params: &'a MarketParams,
        sink: &'a mut dyn EventSink,
    ) -> Self {
        Self {
            bank,
            referrals,
            index,
            keeper,
            params,
            sink,
        }
    }

    pub fn params(&self) -> &MarketParams {
        self.params
    }
}

#[cfg(test)]
pub(crate) mod test_support;
