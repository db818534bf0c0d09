//! # Hybrid Exchange
//!
//! Deterministic spot-exchange kernel that matches limit orders against a
//! price-time-priority order book and a constant-product AMM pool of the
//! same trading pair at once.
//!
//! ## Architecture
//!
//! - **Types**: orders, pools, settlement records, block receipts
//! - **Store**: ordered key-value store with rollback and a content hash
//! - **OrderBook**: price-time order index, persistent and in-memory
//! - **Pool**: reserves, liquidity positions and AMM formulas
//! - **Fee**: fee rounding and rebate / validator / pool split
//! - **Engine**: matching and settlement over injected collaborators
//! - **App**: block driver with per-command rollback
//!
//! ## Design Principles
//!
//! 1. **Determinism**: identical command streams give identical state roots
//! 2. **No Floating Point**: integer amounts, prices scaled by 10^8
//! 3. **Synchronous Execution**: no async in the hot path
//! 4. **Fail Closed**: stored state that contradicts itself halts the block
//!
//! ## Example
//!
//! ```
//! use hybrid_exchange::app::{Command, Exchange};
//! use hybrid_exchange::config::MarketParams;
//! use hybrid_exchange::types::{Address, NewOrder, Side};
//!
//! let mut exchange = Exchange::in_memory(MarketParams::default()).unwrap();
//! let (alice, bob) = (Address::repeat(1), Address::repeat(2));
//! exchange.ledger_mut().mint(&alice, "abc", 1_000);
//! exchange.ledger_mut().mint(&bob, "usdt", 1_000);
//!
//! exchange.begin_block(1);
//! exchange
//!     .deliver(Command::CreatePair { owner: alice, pair: "abc/usdt".into(), price_precision: 2 })
//!     .unwrap();
//! for (sender, side) in [(alice, Side::Sell), (bob, Side::Buy)] {
//!     exchange
//!         .deliver(Command::AddLimitOrder(NewOrder {
//!             sender,
//!             sequence: 1,
//!             pair: "abc/usdt".into(),
//!             side,
//!             price: 100_000_000,
//!             price_precision: 2,
//!             quantity: 500,
//!         }))
//!         .unwrap();
//! }
//! let receipt = exchange.end_block();
//! assert_eq!(receipt.fills_executed, 1);
//! ```

// ============================================================================
// Module declarations
// ============================================================================

/// Wide-integer arithmetic
pub mod math;

/// Error kinds and the fatal corruption path
pub mod error;

/// Core data types: Order, PoolInfo, settlement records, BlockReceipt
pub mod types;

/// Key-value storage, key layout and record codec
pub mod store;

/// Order-book index: persistent key layout and slab-backed book
pub mod orderbook;

/// AMM pool keeper and formulas
pub mod pool;

/// Fee rounding and split
pub mod fee;

/// Balance and referral services
pub mod ledger;

/// Market parameters
pub mod config;

/// Matching and settlement engine
pub mod engine;

/// Block driver
pub mod app;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use app::{Command, CommandOutput, Exchange};
pub use config::MarketParams;
pub use engine::{BlockContext, MatchingEngine, OrderResult};
pub use error::{DexError, DexResult, StateCorruption};
pub use orderbook::{BookIndex, KvOrderIndex, OrderIndex};
pub use pool::PoolKeeper;
pub use types::{Address, BlockReceipt, NewOrder, Order, OrderId, PoolInfo, Side};
