//! Liquidity deposits and withdrawals with their token transfers.

use tracing::info;

use crate::error::{DexError, DexResult};
use crate::ledger::{BalanceService, ReferralRegistry, POOL_MODULE};
use crate::orderbook::OrderIndex;
use crate::pool::ReserveStore;
use crate::types::{Address, Coin};

use super::MatchingEngine;

impl<'a, B, R, I, S> MatchingEngine<'a, B, R, I, S>
where
    B: BalanceService + ?Sized,
    R: ReferralRegistry + ?Sized,
    I: OrderIndex + ?Sized,
    S: ReserveStore,
{
    /// Deposit `(stock_in, money_in)` into the pool of `pair` and mint
    /// liquidity to `owner`.
    pub fn add_liquidity(
        &mut self,
        owner: &Address,
        pair: &str,
        stock_in: u128,
        money_in: u128,
    ) -> DexResult<u128> {
        let pool = self.keeper.pool(pair)?;
        let expected = self.keeper.get_liquidity_amount_in(pair, stock_in, money_in)?;

        self.bank.send_coins_from_account_to_module(
            owner,
            POOL_MODULE,
            &Coin::new(pool.stock_denom(), stock_in),
        )?;
        self.bank.send_coins_from_account_to_module(
            owner,
            POOL_MODULE,
            &Coin::new(pool.money_denom(), money_in),
        )?;
        let liquidity = self.keeper.mint(pair, stock_in, money_in, owner)?;
        debug_assert_eq!(liquidity, expected);

        info!(pair, %owner, stock_in, money_in, liquidity, "liquidity added");
        Ok(liquidity)
    }

    /// Burn `liquidity` shares of `owner` and pay out the underlying tokens.
    pub fn remove_liquidity(
        &mut self,
        owner: &Address,
        pair: &str,
        liquidity: u128,
    ) -> DexResult<(u128, u128)> {
        let pool = self.keeper.pool(pair)?;
        if liquidity == 0 {
            return Err(DexError::InvalidAmount("liquidity must be positive"));
        }
        let owned = self.keeper.position(pair, owner);
        if owned < liquidity {
            return Err(DexError::InsufficientPosition {
                needed: liquidity,
                owned,
            });
        }
        let expected = self.keeper.get_tokens_amount_out(pair, liquidity)?;

        let (stock_out, money_out) = self.keeper.burn(pair, owner, liquidity)?;
        debug_assert_eq!((stock_out, money_out), expected);
        self.bank.send_coins_from_module_to_account(
            POOL_MODULE,
            owner,
            &Coin::new(pool.stock_denom(), stock_out),
        )?;
        self.bank.send_coins_from_module_to_account(
            POOL_MODULE,
            owner,
            &Coin::new(pool.money_denom(), money_out),
        )?;

        info!(pair, %owner, liquidity, stock_out, money_out, "liquidity removed");
        Ok((stock_out, money_out))
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::test_support::{Harness, PAIR};
    use crate::error::DexError;
    use crate::ledger::POOL_MODULE;
    use crate::types::Side;

    #[test]
    fn test_add_then_remove_liquidity() {
        let mut h = Harness::new();
        let alice = Harness::alice();
        h.fund(&alice, "abc", 10_000);
        h.fund(&alice, "usdt", 1_000_000);

        let liquidity = h.add_liquidity(&alice, 10_000, 1_000_000).unwrap();
        assert_eq!(liquidity, 100_000);
        assert_eq!(h.bank.balance(&alice, "abc"), 0);
        assert_eq!(h.bank.module_balance(POOL_MODULE, "usdt"), 1_000_000);
        assert_eq!(h.keeper.position(PAIR, &alice), 100_000);

        let (stock, money) = h.remove_liquidity(&alice, 40_000).unwrap();
        assert_eq!((stock, money), (4_000, 400_000));
        assert_eq!(h.bank.balance(&alice, "abc"), 4_000);
        assert_eq!(h.bank.balance(&alice, "usdt"), 400_000);
        assert_eq!(h.pool().total_supply, 60_000);
        assert_eq!(h.keeper.total_positions(PAIR), 60_000);
    }

    #[test]
    fn test_remove_pays_the_preview_after_a_trade() {
        let mut h = Harness::new();
        let (alice, bob) = (Harness::alice(), Harness::bob());
        h.seed_pool(&alice, 100_000, 100_000);
        h.fund(&bob, "abc", 1_000);
        h.place(h.request(&bob, 1, Side::Sell, 10_000, 1_000)).unwrap();

        let preview = h.keeper.get_tokens_amount_out(PAIR, 50_000).unwrap();
        let paid = h.remove_liquidity(&alice, 50_000).unwrap();
        assert_eq!(paid, preview);
        assert_eq!(paid.0, h.pool().stock_amm_reserve);
        assert_eq!(h.bank.balance(&alice, "abc"), paid.0);
        assert_eq!(h.bank.module_balance(POOL_MODULE, "usdt"), h.pool().money_amm_reserve);
    }

    #[test]
    fn test_add_liquidity_needs_balance() {
        let mut h = Harness::new();
        let alice = Harness::alice();
        h.fund(&alice, "abc", 10);
        assert!(matches!(
            h.add_liquidity(&alice, 10, 10),
            Err(DexError::InsufficientBalance { .. })
        ));
    }

    #[test]
    fn test_remove_more_than_owned() {
        let mut h = Harness::new();
        let (alice, bob) = (Harness::alice(), Harness::bob());
        h.seed_pool(&alice, 1_000, 1_000);
        assert_eq!(
            h.remove_liquidity(&bob, 1).unwrap_err(),
            DexError::InsufficientPosition { needed: 1, owned: 0 }
        );
        assert_eq!(
            h.remove_liquidity(&alice, 0).unwrap_err(),
            DexError::InvalidAmount("liquidity must be positive")
        );
    }
}
