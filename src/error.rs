//! Error types for the exchange kernel.
//!
//! Two kinds of failure exist:
//!
//! - [`DexError`]: returned to the caller. The host rolls the enclosing
//!   command back, so no state change survives.
//! - [`StateCorruption`]: stored state contradicts itself (a missing order,
//!   an undecodable record, reserve bookkeeping that would underflow).
//!   These are never returned; [`StateCorruption::abort`] logs and panics so
//!   block processing halts instead of diverging from other replicas.

use std::fmt;

use thiserror::Error;

use crate::types::OrderId;

/// Recoverable errors returned by the engine, keeper and host.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DexError {
    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------
    #[error("unknown market: {0}")]
    UnknownMarket(String),

    #[error("market already exists: {0}")]
    MarketAlreadyExists(String),

    #[error("invalid trading pair symbol: {0}")]
    InvalidPair(String),

    #[error("price precision {given} exceeds market precision {max}")]
    InvalidPricePrecision { given: u8, max: u8 },

    #[error("invalid price: {0}")]
    InvalidPrice(u64),

    #[error("invalid amount: {0}")]
    InvalidAmount(&'static str),

    #[error("malformed order id: {0}")]
    InvalidOrderId(String),

    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("only the order sender may cancel order {0}")]
    NotOrderSender(OrderId),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // ------------------------------------------------------------------
    // Idempotency
    // ------------------------------------------------------------------
    #[error("order already exists: {0}")]
    OrderAlreadyExists(OrderId),

    // ------------------------------------------------------------------
    // Economic
    // ------------------------------------------------------------------
    #[error("insufficient balance: need {needed}{denom}, available {available}{denom}")]
    InsufficientBalance {
        denom: String,
        needed: u128,
        available: u128,
    },

    #[error("insufficient frozen balance: need {needed}{denom}, frozen {frozen}{denom}")]
    InsufficientFrozen {
        denom: String,
        needed: u128,
        frozen: u128,
    },

    #[error("insufficient liquidity: {0}")]
    InsufficientLiquidity(&'static str),

    #[error("liquidity position too small: need {needed}, owned {owned}")]
    InsufficientPosition { needed: u128, owned: u128 },

    #[error("arithmetic overflow: {0}")]
    Overflow(&'static str),
}

/// Unrecoverable invariant violation.
///
/// Carries enough context to diagnose the divergence from the log before
/// the process halts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateCorruption {
    pub context: &'static str,
    pub detail: String,
}

impl StateCorruption {
    pub fn new(context: &'static str, detail: impl Into<String>) -> Self {
        Self {
            context,
            detail: detail.into(),
        }
    }

    /// Log the violation and halt block processing.
    #[cold]
    #[track_caller]
    pub fn abort(self) -> ! {
        tracing::error!(context = self.context, detail = %self.detail, "state corruption");
        panic!("{}", self)
    }
}

impl fmt::Display for StateCorruption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "state corruption in {}: {}", self.context, self.detail)
    }
}

/// Shorthand for `StateCorruption::new(context, detail).abort()`.
#[cold]
#[track_caller]
pub fn corrupted(context: &'static str, detail: impl Into<String>) -> ! {
    StateCorruption::new(context, detail).abort()
}

/// Result alias used across the crate.
pub type DexResult<T> = Result<T, DexError>;

// ============================================================================
// Unit Tests
// ============================================================================
