//! Property-based tests for the pool keeper.
//!
//! 1. **Supply conservation**: `total_supply == Σ positions` after every step.
//! 2. **k monotonicity**: `stock_reserve * money_reserve` never decreases on
//!    Mint and never increases on Burn.
//! 3. **Round-trip**: Mint then Burn of the returned liquidity returns the
//!    deposit up to floor rounding.

use ethnum::U256;
use proptest::prelude::*;

use crate::math::wide;
use crate::pool::{KvReserveStore, PoolKeeper};
use crate::store::MemStore;
use crate::types::{Address, PoolInfo};

const PAIR: &str = "abc/usdt";

type Keeper = PoolKeeper<KvReserveStore<MemStore>>;

fn make_keeper() -> Keeper {
    let mut keeper = PoolKeeper::new(KvReserveStore::new(MemStore::new()));
    let Ok(_) = keeper.create_pair(Address::repeat(1), PAIR, 8) else {
        panic!("valid pair");
    };
    keeper
}

fn pool(keeper: &Keeper) -> PoolInfo {
    let Ok(pool) = keeper.pool(PAIR) else {
        panic!("pool exists");
    };
    pool
}

fn k(pool: &PoolInfo) -> U256 {
    wide(pool.stock_amm_reserve) * wide(pool.money_amm_reserve)
}

#[derive(Debug, Clone)]
enum Step {
    Mint { owner: u8, stock: u128, money: u128 },
    Burn { owner: u8, fraction: u8 },
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0u8..4, 1u128..=10_000_000u128, 1u128..=10_000_000u128)
            .prop_map(|(owner, stock, money)| Step::Mint { owner, stock, money }),
        (0u8..4, 1u8..=100u8).prop_map(|(owner, fraction)| Step::Burn { owner, fraction }),
    ]
}

// ---------------------------------------------------------------------------
// Property 1 + 2: random Mint/Burn sequences
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_mint_burn_sequences_keep_invariants(
        steps in prop::collection::vec(step_strategy(), 1..40),
    ) {
        let mut keeper = make_keeper();

        for step in steps {
            let before = pool(&keeper);
            match step {
                Step::Mint { owner, stock, money } => {
                    let to = Address::repeat(owner);
                    if keeper.mint(PAIR, stock, money, &to).is_ok() {
                        let after = pool(&keeper);
                        prop_assert!(k(&after) >= k(&before));
                        prop_assert_eq!(after.stock_amm_reserve, before.stock_amm_reserve + stock);
                        prop_assert_eq!(after.money_amm_reserve, before.money_amm_reserve + money);
                    } else {
                        prop_assert_eq!(pool(&keeper), before);
                    }
                }
                Step::Burn { owner, fraction } => {
                    let from = Address::repeat(owner);
                    let owned = keeper.position(PAIR, &from);
                    let liquidity = owned * u128::from(fraction) / 100;
                    if let Ok((stock_out, money_out)) = keeper.burn(PAIR, &from, liquidity) {
                        let after = pool(&keeper);
                        prop_assert!(k(&after) <= k(&before));
                        prop_assert_eq!(after.stock_amm_reserve, before.stock_amm_reserve - stock_out);
                        prop_assert_eq!(after.money_amm_reserve, before.money_amm_reserve - money_out);
                        prop_assert_eq!(keeper.position(PAIR, &from), owned - liquidity);
                    } else {
                        prop_assert_eq!(pool(&keeper), before);
                    }
                }
            }

            let now = pool(&keeper);
            prop_assert_eq!(keeper.total_positions(PAIR), now.total_supply);
            if now.total_supply > 0 {
                prop_assert!(now.stock_amm_reserve > 0 && now.money_amm_reserve > 0);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Property 3: Mint/Burn round-trip
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_mint_then_burn_returns_deposit(
        seed_stock in 10_000u128..=10_000_000u128,
        seed_money in 10_000u128..=10_000_000u128,
        stock in 1_000u128..=1_000_000u128,
        money in 1_000u128..=1_000_000u128,
    ) {
        let mut keeper = make_keeper();
        let seeder = Address::repeat(1);
        let lp = Address::repeat(2);
        let Ok(_) = keeper.mint(PAIR, seed_stock, seed_money, &seeder) else {
            return Ok(());
        };
        let Ok(liquidity) = keeper.mint(PAIR, stock, money, &lp) else {
            return Ok(());
        };
        let Ok((stock_out, money_out)) = keeper.burn(PAIR, &lp, liquidity) else {
            return Ok(());
        };

        // never more than deposited
        prop_assert!(stock_out <= stock);
        prop_assert!(money_out <= money);
        prop_assert_eq!(keeper.position(PAIR, &lp), 0);
        prop_assert_eq!(keeper.total_positions(PAIR), pool(&keeper).total_supply);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// A deposit in the pool's ratio comes back whole except for floor
    /// rounding: at most one liquidity unit's worth per token, plus the
    /// rounded-up money needed to match the ratio.
    #[test]
    fn prop_proportional_round_trip_loses_only_rounding(
        seed_stock in 10_000u128..=10_000_000u128,
        seed_money in 10_000u128..=10_000_000u128,
        stock in 1_000u128..=1_000_000u128,
    ) {
        let mut keeper = make_keeper();
        let (seeder, lp) = (Address::repeat(1), Address::repeat(2));
        prop_assume!(keeper.mint(PAIR, seed_stock, seed_money, &seeder).is_ok());
        let before = pool(&keeper);
        let (rs, rm, supply) = (before.stock_amm_reserve, before.money_amm_reserve, before.total_supply);

        let money = (stock * rm).div_ceil(rs);
        let Ok(liquidity) = keeper.mint(PAIR, stock, money, &lp) else {
            return Ok(());
        };
        let Ok((stock_out, money_out)) = keeper.burn(PAIR, &lp, liquidity) else {
            return Ok(());
        };

        prop_assert!(stock_out <= stock && money_out <= money);
        prop_assert!(stock - stock_out <= rs.div_ceil(supply));
        prop_assert!(money - money_out <= rm.div_ceil(supply) + 1);
    }
}

#[test]
fn test_proportional_round_trip_is_exact_within_one() {
    // supply 20_000: one unit is worth 0.5 stock and 2 money
    let mut keeper = make_keeper();
    let (seeder, lp) = (Address::repeat(1), Address::repeat(2));
    assert_eq!(keeper.mint(PAIR, 10_000, 40_000, &seeder).unwrap(), 20_000);

    let liquidity = keeper.mint(PAIR, 3_333, 13_332, &lp).unwrap();
    assert_eq!(liquidity, 6_666);
    let (stock_out, money_out) = keeper.burn(PAIR, &lp, liquidity).unwrap();
    assert!(3_333 - stock_out <= 1);
    assert!(13_332 - money_out <= 1);
}
