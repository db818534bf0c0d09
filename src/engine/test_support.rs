//! Fixture wiring an engine over in-memory collaborators.

use crate::config::MarketParams;
use crate::engine::{BlockContext, MatchingEngine, OrderResult, VecSink};
use crate::error::DexResult;
use crate::ledger::{MemLedger, MemReferrals};
use crate::orderbook::{KvOrderIndex, OrderIndex};
use crate::pool::{KvReserveStore, PoolKeeper};
use crate::store::MemStore;
use crate::types::{Address, CancelRecord, CancelReason, NewOrder, OrderId, PoolInfo, Side};

pub(crate) const PAIR: &str = "abc/usdt";

pub(crate) struct Harness {
    pub bank: MemLedger,
    pub referrals: MemReferrals,
    pub index: KvOrderIndex<MemStore>,
    pub keeper: PoolKeeper<KvReserveStore<MemStore>>,
    pub params: MarketParams,
    pub sink: VecSink,
    pub ctx: BlockContext,
}

macro_rules! engine {
    ($h:expr) => {
        MatchingEngine::new(
            &mut $h.bank,
            &$h.referrals,
            &mut $h.index,
            &mut $h.keeper,
            &$h.params,
            &mut $h.sink,
        )
    };
}

impl Harness {
    /// Default fees, market `abc/usdt` with price precision 4, height 1.
    pub fn new() -> Self {
        Self::with_params(MarketParams::default())
    }

    pub fn without_fees() -> Self {
        Self::with_params(MarketParams {
            maker_fee_rate: 0,
            taker_fee_rate: 0,
            pool_fee_rate: 0,
            ..MarketParams::default()
        })
    }

    pub fn with_params(params: MarketParams) -> Self {
        let mut keeper = PoolKeeper::new(KvReserveStore::new(MemStore::new()));
        if let Err(err) = keeper.create_pair(Address::repeat(0xee), PAIR, 4) {
            panic!("fixture market: {err}");
        }
        Self {
            bank: MemLedger::new(),
            referrals: MemReferrals::default(),
            index: KvOrderIndex::new(MemStore::new()),
            keeper,
            params,
            sink: VecSink::new(),
            ctx: BlockContext::new(1),
        }
    }

    pub fn alice() -> Address {
        Address::repeat(0xa1)
    }

    pub fn bob() -> Address {
        Address::repeat(0xb0)
    }

    pub fn carol() -> Address {
        Address::repeat(0xc0)
    }

    pub fn fund(&mut self, account: &Address, denom: &str, amount: u128) {
        self.bank.mint(account, denom, amount);
    }

    /// Mint tokens to `owner` and deposit them as the pool's liquidity.
    pub fn seed_pool(&mut self, owner: &Address, stock: u128, money: u128) {
        self.fund(owner, "abc", stock);
        self.fund(owner, "usdt", money);
        if let Err(err) = self.add_liquidity(owner, stock, money) {
            panic!("seed pool: {err}");
        }
    }

    pub fn pool(&self) -> PoolInfo {
        match self.keeper.pool(PAIR) {
            Ok(pool) => pool,
            Err(err) => panic!("fixture market: {err}"),
        }
    }

    pub fn request(&self, sender: &Address, sequence: u64, side: Side, price: u64, quantity: u128) -> NewOrder {
        NewOrder {
            sender: *sender,
            sequence,
            pair: PAIR.to_string(),
            side,
            price,
            price_precision: 4,
            quantity,
        }
    }

    pub fn place(&mut self, request: NewOrder) -> DexResult<OrderResult> {
        engine!(self).add_limit_order(&mut self.ctx, request)
    }

    pub fn cancel(&mut self, sender: &Address, id: &OrderId) -> DexResult<CancelRecord> {
        let ctx = self.ctx;
        engine!(self).delete_order(&ctx, sender, id, CancelReason::Manual)
    }

    pub fn expire(&mut self) -> DexResult<usize> {
        let ctx = self.ctx;
        engine!(self).expire_orders(&ctx)
    }

    pub fn add_liquidity(&mut self, owner: &Address, stock: u128, money: u128) -> DexResult<u128> {
        engine!(self).add_liquidity(owner, PAIR, stock, money)
    }

    pub fn remove_liquidity(&mut self, owner: &Address, liquidity: u128) -> DexResult<(u128, u128)> {
        engine!(self).remove_liquidity(owner, PAIR, liquidity)
    }

    /// Every resting order satisfies `0 < left <= quantity` and freezes
    /// exactly its commitment; the pool counters equal the frozen sums.
    pub fn assert_index_consistent(&self) {
        let orders = self.index.all_orders();
        let (mut stock_frozen, mut money_frozen) = (0u128, 0u128);
        for order in &orders {
            assert!(order.left_stock > 0 && order.left_stock <= order.quantity, "{order:?}");
            assert_eq!(Some(order.freeze), order.commitment(order.left_stock), "{order:?}");
            match order.side {
                Side::Buy => money_frozen += order.freeze,
                Side::Sell => stock_frozen += order.freeze,
            }
        }
        let pool = self.pool();
        assert_eq!(pool.stock_order_book_reserve, stock_frozen);
        assert_eq!(pool.money_order_book_reserve, money_frozen);
    }
}
