//! Pool reserves, liquidity supply and positions.
//!
//! ## Mint
//!
//! ```text
//! supply == 0 : liquidity = isqrt(stock_in * money_in)
//! otherwise   : liquidity = min(stock_in * supply / stock_reserve,
//!                               money_in * supply / money_reserve)
//! ```
//!
//! Both deposits are added to the reserves in full, so a skewed deposit
//! donates its excess to existing holders.
//!
//! ## Burn
//!
//! ```text
//! stock_out = liquidity * stock_reserve / supply
//! money_out = liquidity * money_reserve / supply
//! ```
//!
//! The keeper only moves numbers. Token transfers into and out of the pool
//! account are the caller's job; the `get_*` previews let the caller know
//! the amounts before it mutates anything.

use tracing::{debug, info};

use crate::error::{corrupted, DexError, DexResult};
use crate::math::{mul_div_floor, sqrt_product};
use crate::store::codec::{self, PoolRecord, PositionRecord};
use crate::store::keys;
use crate::store::{KvStore, StateDigest, Transactional};
use crate::types::price::MAX_PRICE_PRECISION;
use crate::types::{split_pair, Address, LiquidityPosition, PoolInfo};

// ============================================================================
// Storage seam
// ============================================================================

/// Pool-info table by pair and position table by `(pair, owner)`.
pub trait ReserveStore {
    fn get_pool(&self, pair: &str) -> Option<PoolInfo>;

    fn set_pool(&mut self, pool: &PoolInfo);

    /// Shares held by `owner`, zero when absent.
    fn get_position(&self, pair: &str, owner: &Address) -> u128;

    /// Store a position; zero shares remove it.
    fn set_position(&mut self, pair: &str, owner: &Address, shares: u128);

    /// Every position of `pair`, by owner.
    fn positions(&self, pair: &str) -> Vec<LiquidityPosition>;
}

/// [`ReserveStore`] persisted through a key-value store.
#[derive(Debug, Clone, Default)]
pub struct KvReserveStore<S> {
    store: S,
}

impl<S: KvStore> KvReserveStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: KvStore> ReserveStore for KvReserveStore<S> {
    fn get_pool(&self, pair: &str) -> Option<PoolInfo> {
        self.store
            .get(&keys::pool_key(pair))
            .map(|bytes| codec::decode::<PoolRecord>(&bytes, "pool record").into_pool())
    }

    fn set_pool(&mut self, pool: &PoolInfo) {
        self.store.set(
            keys::pool_key(&pool.pair),
            codec::encode(&PoolRecord::from(pool), "pool record"),
        );
    }

    fn get_position(&self, pair: &str, owner: &Address) -> u128 {
        self.store
            .get(&keys::position_key(pair, owner))
            .map(|bytes| codec::decode::<PositionRecord>(&bytes, "position record").shares)
            .unwrap_or(0)
    }

    fn set_position(&mut self, pair: &str, owner: &Address, shares: u128) {
        let key = keys::position_key(pair, owner);
        if shares == 0 {
            self.store.delete(&key);
            return;
        }
        let record = PositionRecord {
            owner: owner.0,
            shares,
        };
        self.store.set(key, codec::encode(&record, "position record"));
    }

    fn positions(&self, pair: &str) -> Vec<LiquidityPosition> {
        self.store
            .scan_prefix(&keys::position_prefix(pair))
            .map(|(_, value)| {
                codec::decode::<PositionRecord>(value, "position record").into_position(pair)
            })
            .collect()
    }
}

impl<S: Transactional> Transactional for KvReserveStore<S> {
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

impl<S: StateDigest> StateDigest for KvReserveStore<S> {
    fn state_hash(&self) -> [u8; 32] {
        self.store.state_hash()
    }
}

// ============================================================================
// Keeper
// ============================================================================

/// Reserve and liquidity keeper over a [`ReserveStore`].
#[derive(Debug, Clone, Default)]
pub struct PoolKeeper<R> {
    reserves: R,
}

impl<R: ReserveStore> PoolKeeper<R> {
    pub fn new(reserves: R) -> Self {
        Self { reserves }
    }

    pub fn reserves(&self) -> &R {
        &self.reserves
    }

    pub fn get_pool(&self, pair: &str) -> Option<PoolInfo> {
        self.reserves.get_pool(pair)
    }

    /// Pool of an existing market.
    pub fn pool(&self, pair: &str) -> DexResult<PoolInfo> {
        self.reserves
            .get_pool(pair)
            .ok_or_else(|| DexError::UnknownMarket(pair.to_string()))
    }

    pub fn set_pool(&mut self, pool: &PoolInfo) {
        self.reserves.set_pool(pool);
    }

    pub fn position(&self, pair: &str, owner: &Address) -> u128 {
        self.reserves.get_position(pair, owner)
    }

    /// Sum of all positions of `pair`.
    pub fn total_positions(&self, pair: &str) -> u128 {
        self.reserves
            .positions(pair)
            .iter()
            .fold(0u128, |acc, p| acc.saturating_add(p.shares))
    }

    /// Register a new market with empty reserves.
    pub fn create_pair(
        &mut self,
        owner: Address,
        pair: &str,
        price_precision: u8,
    ) -> DexResult<PoolInfo> {
        split_pair(pair)?;
        if price_precision > MAX_PRICE_PRECISION {
            return Err(DexError::InvalidPricePrecision {
                given: price_precision,
                max: MAX_PRICE_PRECISION,
            });
        }
        if self.reserves.get_pool(pair).is_some() {
            return Err(DexError::MarketAlreadyExists(pair.to_string()));
        }

        let pool = PoolInfo::new(pair, owner, price_precision);
        self.reserves.set_pool(&pool);
        info!(pair, creator = %owner, price_precision, "market created");
        Ok(pool)
    }

    /// Liquidity a deposit of `(stock_in, money_in)` would mint.
    pub fn get_liquidity_amount_in(
        &self,
        pair: &str,
        stock_in: u128,
        money_in: u128,
    ) -> DexResult<u128> {
        let pool = self.pool(pair)?;
        liquidity_for_deposit(&pool, stock_in, money_in)
    }

    /// Tokens burning `liquidity` would return, `(stock_out, money_out)`.
    pub fn get_tokens_amount_out(&self, pair: &str, liquidity: u128) -> DexResult<(u128, u128)> {
        let pool = self.pool(pair)?;
        tokens_for_liquidity(&pool, liquidity)
    }

    /// Add a deposit to the reserves and credit the minted liquidity to `to`.
    pub fn mint(
        &mut self,
        pair: &str,
        stock_in: u128,
        money_in: u128,
        to: &Address,
    ) -> DexResult<u128> {
        let mut pool = self.pool(pair)?;
        let liquidity = liquidity_for_deposit(&pool, stock_in, money_in)?;

        pool.stock_amm_reserve = pool
            .stock_amm_reserve
            .checked_add(stock_in)
            .ok_or(DexError::Overflow("stock reserve"))?;
        pool.money_amm_reserve = pool
            .money_amm_reserve
            .checked_add(money_in)
            .ok_or(DexError::Overflow("money reserve"))?;
        pool.total_supply = pool
            .total_supply
            .checked_add(liquidity)
            .ok_or(DexError::Overflow("liquidity supply"))?;
        // position <= supply, so this cannot overflow once supply didn't
        let shares = self.reserves.get_position(pair, to) + liquidity;

        self.reserves.set_pool(&pool);
        self.reserves.set_position(pair, to, shares);
        debug!(pair, owner = %to, stock_in, money_in, liquidity, "liquidity minted");
        Ok(liquidity)
    }

    /// Withdraw `liquidity` shares of `from` proportionally from the reserves.
    pub fn burn(&mut self, pair: &str, from: &Address, liquidity: u128) -> DexResult<(u128, u128)> {
        let mut pool = self.pool(pair)?;
        if liquidity == 0 {
            return Err(DexError::InvalidAmount("liquidity must be positive"));
        }
        let owned = self.reserves.get_position(pair, from);
        if owned < liquidity {
            return Err(DexError::InsufficientPosition {
                needed: liquidity,
                owned,
            });
        }
        let (stock_out, money_out) = tokens_for_liquidity(&pool, liquidity)?;

        pool.stock_amm_reserve = sub_or_abort(pool.stock_amm_reserve, stock_out, "stock reserve");
        pool.money_amm_reserve = sub_or_abort(pool.money_amm_reserve, money_out, "money reserve");
        pool.total_supply = sub_or_abort(pool.total_supply, liquidity, "liquidity supply");

        self.reserves.set_pool(&pool);
        self.reserves.set_position(pair, from, owned - liquidity);
        debug!(pair, owner = %from, liquidity, stock_out, money_out, "liquidity burned");
        Ok((stock_out, money_out))
    }
}

impl<R: Transactional> Transactional for PoolKeeper<R> {
    fn begin(&mut self) {
        self.reserves.begin();
    }

    fn commit(&mut self) {
        self.reserves.commit();
    }

    fn rollback(&mut self) {
        self.reserves.rollback();
    }
}

impl<R: StateDigest> StateDigest for PoolKeeper<R> {
    fn state_hash(&self) -> [u8; 32] {
        self.reserves.state_hash()
    }
}

// ============================================================================
// Pricing
// ============================================================================

fn check_reserves(pool: &PoolInfo) {
    if pool.total_supply > 0 && (pool.stock_amm_reserve == 0 || pool.money_amm_reserve == 0) {
        corrupted(
            "pool keeper",
            format!("{} has supply {} with an empty reserve", pool.pair, pool.total_supply),
        );
    }
}

fn sub_or_abort(value: u128, amount: u128, what: &'static str) -> u128 {
    match value.checked_sub(amount) {
        Some(v) => v,
        None => corrupted("pool keeper", format!("{what} underflow: {value} - {amount}")),
    }
}

fn liquidity_for_deposit(pool: &PoolInfo, stock_in: u128, money_in: u128) -> DexResult<u128> {
    if stock_in == 0 || money_in == 0 {
        return Err(DexError::InvalidAmount("deposit must be positive in both tokens"));
    }
    check_reserves(pool);

    let liquidity = if pool.total_supply == 0 {
        sqrt_product(stock_in, money_in)
    } else {
        let by_stock = mul_div_floor(stock_in, pool.total_supply, pool.stock_amm_reserve)
            .ok_or(DexError::Overflow("liquidity by stock"))?;
        let by_money = mul_div_floor(money_in, pool.total_supply, pool.money_amm_reserve)
            .ok_or(DexError::Overflow("liquidity by money"))?;
        by_stock.min(by_money)
    };

    if liquidity == 0 {
        return Err(DexError::InsufficientLiquidity("deposit mints no liquidity"));
    }
    Ok(liquidity)
}

fn tokens_for_liquidity(pool: &PoolInfo, liquidity: u128) -> DexResult<(u128, u128)> {
    if liquidity == 0 {
        return Err(DexError::InvalidAmount("liquidity must be positive"));
    }
    if liquidity > pool.total_supply {
        return Err(DexError::InsufficientLiquidity("burn exceeds total supply"));
    }
    check_reserves(pool);

    // liquidity <= supply, so both quotients fit
    let stock_out = mul_div_floor(liquidity, pool.stock_amm_reserve, pool.total_supply).unwrap_or(0);
    let money_out = mul_div_floor(liquidity, pool.money_amm_reserve, pool.total_supply).unwrap_or(0);
    if stock_out == 0 && money_out == 0 {
        return Err(DexError::InsufficientLiquidity("burn returns nothing"));
    }
    Ok((stock_out, money_out))
}

// ============================================================================
// Unit Tests
// ============================================================================
