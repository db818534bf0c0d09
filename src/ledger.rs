//! Balance and referral services the engine settles through.
//!
//! The exchange does not own accounting. Every token movement goes through
//! a [`BalanceService`]; referral rebates are looked up in a
//! [`ReferralRegistry`]. [`MemLedger`] and [`MemReferrals`] are in-memory
//! implementations used by the block driver, tests and benchmarks.
//!
//! ## Module Accounts
//!
//! Pool reserves are held by the [`POOL_MODULE`] account; the validator
//! share of every fee goes to [`FEE_COLLECTOR`].

use std::collections::HashMap;

use tracing::trace;

use crate::error::{corrupted, DexError, DexResult};
use crate::store::keys::{self, BALANCE_PREFIX, FROZEN_PREFIX};
use crate::store::{KvStore, MemStore, StateDigest, Transactional};
use crate::types::{Address, Coin};

/// Module account holding AMM reserves.
pub const POOL_MODULE: &str = "amm_pool";

/// Module account receiving the validator share of fees.
pub const FEE_COLLECTOR: &str = "fee_collector";

/// Token movements requested by the engine.
///
/// Zero-amount coins are accepted and do nothing.
pub trait BalanceService {
    /// Move `coin` from the available to the frozen balance of `account`.
    fn freeze_coins(&mut self, account: &Address, coin: &Coin) -> DexResult<()>;

    /// Move `coin` from the frozen back to the available balance.
    fn unfreeze_coins(&mut self, account: &Address, coin: &Coin) -> DexResult<()>;

    fn send_coins(&mut self, from: &Address, to: &Address, coin: &Coin) -> DexResult<()>;

    fn send_coins_from_account_to_module(
        &mut self,
        from: &Address,
        module: &str,
        coin: &Coin,
    ) -> DexResult<()>;

    fn send_coins_from_module_to_account(
        &mut self,
        module: &str,
        to: &Address,
        coin: &Coin,
    ) -> DexResult<()>;

    fn send_coins_from_module_to_module(
        &mut self,
        from: &str,
        to: &str,
        coin: &Coin,
    ) -> DexResult<()>;
}

/// Who referred whom, and how much of a fee the referee gets back.
pub trait ReferralRegistry {
    /// Referee credited with rebates on `account`'s fees.
    fn referee_addr(&self, account: &Address) -> Option<Address>;

    /// Numerator of the rebate share.
    fn rebate_ratio(&self) -> u128;

    /// Denominator of the rebate share.
    fn rebate_ratio_base(&self) -> u128;
}

// ============================================================================
// MemLedger
// ============================================================================

/// Balances kept in a journaled [`MemStore`].
///
/// ```
/// use hybrid_exchange::ledger::{BalanceService, MemLedger};
/// use hybrid_exchange::types::{Address, Coin};
///
/// let alice = Address::repeat(1);
/// let mut ledger = MemLedger::new();
/// ledger.mint(&alice, "usdt", 100);
/// ledger.freeze_coins(&alice, &Coin::new("usdt", 40)).unwrap();
/// assert_eq!(ledger.balance(&alice, "usdt"), 60);
/// assert_eq!(ledger.frozen(&alice, "usdt"), 40);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemLedger {
    store: MemStore,
}

impl MemLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Available balance.
    pub fn balance(&self, account: &Address, denom: &str) -> u128 {
        self.read(&keys::account_balance_key(BALANCE_PREFIX, account, denom))
    }

    pub fn frozen(&self, account: &Address, denom: &str) -> u128 {
        self.read(&keys::account_balance_key(FROZEN_PREFIX, account, denom))
    }

    pub fn module_balance(&self, module: &str, denom: &str) -> u128 {
        self.read(&keys::module_balance_key(module, denom))
    }

    /// Credit new tokens to `account` (genesis and test fixtures).
    pub fn mint(&mut self, account: &Address, denom: &str, amount: u128) {
        let key = keys::account_balance_key(BALANCE_PREFIX, account, denom);
        let balance = self.read(&key).saturating_add(amount);
        self.write(key, balance);
    }

    fn read(&self, key: &[u8]) -> u128 {
        match self.store.get(key) {
            None => 0,
            Some(bytes) => match <[u8; 16]>::try_from(bytes.as_slice()) {
                Ok(raw) => u128::from_be_bytes(raw),
                Err(_) => corrupted("ledger", format!("balance entry of {} bytes", bytes.len())),
            },
        }
    }

    fn write(&mut self, key: Vec<u8>, amount: u128) {
        if amount == 0 {
            self.store.delete(&key);
        } else {
            self.store.set(key, amount.to_be_bytes().to_vec());
        }
    }

    fn debit(&mut self, key: Vec<u8>, coin: &Coin, frozen: bool) -> DexResult<()> {
        let held = self.read(&key);
        if held < coin.amount {
            return Err(if frozen {
                DexError::InsufficientFrozen {
                    denom: coin.denom.clone(),
                    needed: coin.amount,
                    frozen: held,
                }
            } else {
                DexError::InsufficientBalance {
                    denom: coin.denom.clone(),
                    needed: coin.amount,
                    available: held,
                }
            });
        }
        self.write(key, held - coin.amount);
        Ok(())
    }

    fn credit(&mut self, key: Vec<u8>, coin: &Coin) -> DexResult<()> {
        let held = self.read(&key);
        let total = held
            .checked_add(coin.amount)
            .ok_or(DexError::Overflow("balance"))?;
        self.write(key, total);
        Ok(())
    }

    fn transfer(&mut self, from: Vec<u8>, to: Vec<u8>, coin: &Coin) -> DexResult<()> {
        if coin.is_zero() {
            return Ok(());
        }
        self.debit(from, coin, false)?;
        self.credit(to, coin)
    }
}

impl BalanceService for MemLedger {
    fn freeze_coins(&mut self, account: &Address, coin: &Coin) -> DexResult<()> {
        if coin.is_zero() {
            return Ok(());
        }
        self.debit(keys::account_balance_key(BALANCE_PREFIX, account, &coin.denom), coin, false)?;
        self.credit(keys::account_balance_key(FROZEN_PREFIX, account, &coin.denom), coin)?;
        trace!(%account, %coin, "frozen");
        Ok(())
    }

    fn unfreeze_coins(&mut self, account: &Address, coin: &Coin) -> DexResult<()> {
        if coin.is_zero() {
            return Ok(());
        }
        self.debit(keys::account_balance_key(FROZEN_PREFIX, account, &coin.denom), coin, true)?;
        self.credit(keys::account_balance_key(BALANCE_PREFIX, account, &coin.denom), coin)?;
        trace!(%account, %coin, "unfrozen");
        Ok(())
    }

    fn send_coins(&mut self, from: &Address, to: &Address, coin: &Coin) -> DexResult<()> {
        self.transfer(
            keys::account_balance_key(BALANCE_PREFIX, from, &coin.denom),
            keys::account_balance_key(BALANCE_PREFIX, to, &coin.denom),
            coin,
        )
    }

    fn send_coins_from_account_to_module(
        &mut self,
        from: &Address,
        module: &str,
        coin: &Coin,
    ) -> DexResult<()> {
        self.transfer(
            keys::account_balance_key(BALANCE_PREFIX, from, &coin.denom),
            keys::module_balance_key(module, &coin.denom),
            coin,
        )
    }

    fn send_coins_from_module_to_account(
        &mut self,
        module: &str,
        to: &Address,
        coin: &Coin,
    ) -> DexResult<()> {
        self.transfer(
            keys::module_balance_key(module, &coin.denom),
            keys::account_balance_key(BALANCE_PREFIX, to, &coin.denom),
            coin,
        )
    }

    fn send_coins_from_module_to_module(
        &mut self,
        from: &str,
        to: &str,
        coin: &Coin,
    ) -> DexResult<()> {
        self.transfer(
            keys::module_balance_key(from, &coin.denom),
            keys::module_balance_key(to, &coin.denom),
            coin,
        )
    }
}

impl Transactional for MemLedger {
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

impl StateDigest for MemLedger {
    fn state_hash(&self) -> [u8; 32] {
        self.store.state_hash()
    }
}

// ============================================================================
// MemReferrals
// ============================================================================

/// Fixed rebate ratio and a referee table.
#[derive(Debug, Clone)]
pub struct MemReferrals {
    referees: HashMap<Address, Address>,
    ratio: u128,
    base: u128,
}

impl Default for MemReferrals {
    /// No referrals, 20 % rebate once one is registered.
    fn default() -> Self {
        Self::new(20, 100)
    }
}

impl MemReferrals {
    pub fn new(ratio: u128, base: u128) -> Self {
        Self {
            referees: HashMap::new(),
            ratio,
            base,
        }
    }

    pub fn set_referee(&mut self, account: Address, referee: Address) {
        self.referees.insert(account, referee);
    }
}

impl ReferralRegistry for MemReferrals {
    fn referee_addr(&self, account: &Address) -> Option<Address> {
        self.referees.get(account).copied()
    }

    fn rebate_ratio(&self) -> u128 {
        self.ratio
    }

    fn rebate_ratio_base(&self) -> u128 {
        self.base
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
