//! Block driver: command dispatch with per-command rollback.
//!
//! ## Lifecycle
//!
//! ```text
//! begin_block(h)  -> reset the in-block order counter
//! deliver(cmd)*   -> begin, execute, commit on Ok / rollback on Err
//! end_block()     -> expiry sweep, state root, BlockReceipt
//! ```
//!
//! A failed command leaves no trace in the order index, the pool keeper
//! or the ledger.

use std::fmt;

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::config::MarketParams;
use crate::engine::{BlockContext, MatchingEngine, OrderResult, VecSink};
use crate::error::DexResult;
use crate::ledger::{MemLedger, MemReferrals};
use crate::orderbook::{KvOrderIndex, OrderIndex};
use crate::pool::{KvReserveStore, PoolKeeper};
use crate::store::{MemStore, StateDigest, Transactional};
use crate::types::{
    Address, BlockReceipt, CancelReason, CancelRecord, NewOrder, OrderId, PoolInfo,
    SettlementEvent,
};

/// Everything a block can contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CreatePair {
        owner: Address,
        pair: String,
        price_precision: u8,
    },
    AddLimitOrder(NewOrder),
    CancelOrder {
        sender: Address,
        /// `"<hex address>-<sequence>"`
        order_id: String,
    },
    AddLiquidity {
        owner: Address,
        pair: String,
        stock_in: u128,
        money_in: u128,
    },
    RemoveLiquidity {
        owner: Address,
        pair: String,
        liquidity: u128,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::CreatePair { .. } => "create_pair",
            Command::AddLimitOrder(_) => "add_limit_order",
            Command::CancelOrder { .. } => "cancel_order",
            Command::AddLiquidity { .. } => "add_liquidity",
            Command::RemoveLiquidity { .. } => "remove_liquidity",
        }
    }
}

/// Result of a successfully delivered command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    PairCreated(PoolInfo),
    OrderPlaced(OrderResult),
    OrderCanceled(CancelRecord),
    LiquidityAdded(u128),
    LiquidityRemoved { stock_out: u128, money_out: u128 },
}

#[derive(Debug, Clone, Copy, Default)]
struct BlockStats {
    processed: u64,
    failed: u64,
    fills: u64,
}

/// The exchange state machine.
///
/// Generic over the order index so the persistent key layout and the
/// in-memory book can be swapped.
pub struct Exchange<I = KvOrderIndex<MemStore>> {
    index: I,
    keeper: PoolKeeper<KvReserveStore<MemStore>>,
    ledger: MemLedger,
    referrals: MemReferrals,
    params: MarketParams,
    ctx: BlockContext,
    stats: BlockStats,
    capture_events: bool,
    events: Vec<SettlementEvent>,
}

impl<I> fmt::Debug for Exchange<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exchange")
            .field("height", &self.ctx.height)
            .field("params", &self.params)
            .field("events", &self.events.len())
            .finish()
    }
}

impl Exchange<KvOrderIndex<MemStore>> {
    /// Exchange over the persistent key layout in memory.
    pub fn in_memory(params: MarketParams) -> DexResult<Self> {
        Self::new(KvOrderIndex::new(MemStore::new()), params)
    }
}

impl<I> Exchange<I>
where
    I: OrderIndex + Transactional + StateDigest,
{
    pub fn new(index: I, params: MarketParams) -> DexResult<Self> {
        params.validate()?;
        Ok(Self {
            index,
            keeper: PoolKeeper::new(KvReserveStore::new(MemStore::new())),
            ledger: MemLedger::new(),
            referrals: MemReferrals::default(),
            params,
            ctx: BlockContext::default(),
            stats: BlockStats::default(),
            capture_events: false,
            events: Vec::new(),
        })
    }

    /// Keep settlement records of committed commands for [`Exchange::drain_events`].
    pub fn with_event_capture(mut self, enabled: bool) -> Self {
        self.capture_events = enabled;
        self
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn keeper(&self) -> &PoolKeeper<KvReserveStore<MemStore>> {
        &self.keeper
    }

    pub fn ledger(&self) -> &MemLedger {
        &self.ledger
    }

    /// Direct ledger access for genesis balances.
    pub fn ledger_mut(&mut self) -> &mut MemLedger {
        &mut self.ledger
    }

    pub fn referrals_mut(&mut self) -> &mut MemReferrals {
        &mut self.referrals
    }

    pub fn params(&self) -> &MarketParams {
        &self.params
    }

    pub fn height(&self) -> u64 {
        self.ctx.height
    }

    /// Take the records collected so far.
    pub fn drain_events(&mut self) -> Vec<SettlementEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn begin_block(&mut self, height: u64) {
        self.ctx.reset(height);
        self.stats = BlockStats::default();
        debug!(height, "block started");
    }

    /// Execute one command atomically.
    pub fn deliver(&mut self, command: Command) -> DexResult<CommandOutput> {
        let name = command.name();
        self.stats.processed += 1;
        self.begin();

        let mut sink = VecSink::new();
        let result = self.execute(command, &mut sink);
        match &result {
            Ok(output) => {
                self.commit();
                if let CommandOutput::OrderPlaced(placed) = output {
                    self.stats.fills += u64::from(placed.book_fills);
                }
                if self.capture_events {
                    self.events.append(&mut sink.events);
                }
            }
            Err(err) => {
                self.rollback();
                self.stats.failed += 1;
                warn!(height = self.ctx.height, command = name, error = %err, "command rejected");
            }
        }
        result
    }

    /// Run the expiry sweep and seal the block.
    pub fn end_block(&mut self) -> BlockReceipt {
        self.begin();
        let ctx = self.ctx;
        let swept = {
            let mut sink = VecSink::new();
            let swept = self.engine(&mut sink).expire_orders(&ctx);
            if swept.is_ok() && self.capture_events {
                self.events.append(&mut sink.events);
            }
            swept
        };
        match swept {
            Ok(_) => self.commit(),
            Err(err) => {
                self.rollback();
                warn!(height = ctx.height, error = %err, "expiry sweep rolled back");
            }
        }

        let receipt = BlockReceipt::new(
            ctx.height,
            self.stats.processed,
            self.stats.failed,
            self.stats.fills,
            self.state_root(),
        );
        info!(
            height = receipt.height,
            commands = receipt.commands_processed,
            failed = receipt.commands_failed,
            fills = receipt.fills_executed,
            state_root = %receipt.state_root_hex(),
            "block sealed"
        );
        receipt
    }

    /// SHA-256 over the digests of the index, the pool keeper and the ledger.
    pub fn state_root(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.index.state_hash());
        hasher.update(self.keeper.state_hash());
        hasher.update(self.ledger.state_hash());
        let mut out = [0u8; 32];
        out.copy_from_slice(&hasher.finalize());
        out
    }

    fn engine<'a>(
        &'a mut self,
        sink: &'a mut VecSink,
    ) -> MatchingEngine<'a, MemLedger, MemReferrals, I, KvReserveStore<MemStore>> {
        MatchingEngine::new(
            &mut self.ledger,
            &self.referrals,
            &mut self.index,
            &mut self.keeper,
            &self.params,
            sink,
        )
    }

    fn execute(&mut self, command: Command, sink: &mut VecSink) -> DexResult<CommandOutput> {
        match command {
            Command::CreatePair {
                owner,
                pair,
                price_precision,
            } => self
                .keeper
                .create_pair(owner, &pair, price_precision)
                .map(CommandOutput::PairCreated),
            Command::AddLimitOrder(request) => {
                let mut ctx = self.ctx;
                let placed = self.engine(sink).add_limit_order(&mut ctx, request)?;
                self.ctx = ctx;
                Ok(CommandOutput::OrderPlaced(placed))
            }
            Command::CancelOrder { sender, order_id } => {
                let id: OrderId = order_id.parse()?;
                let ctx = self.ctx;
                self.engine(sink)
                    .delete_order(&ctx, &sender, &id, CancelReason::Manual)
                    .map(CommandOutput::OrderCanceled)
            }
            Command::AddLiquidity {
                owner,
                pair,
                stock_in,
                money_in,
            } => self
                .engine(sink)
                .add_liquidity(&owner, &pair, stock_in, money_in)
                .map(CommandOutput::LiquidityAdded),
            Command::RemoveLiquidity {
                owner,
                pair,
                liquidity,
            } => self
                .engine(sink)
                .remove_liquidity(&owner, &pair, liquidity)
                .map(|(stock_out, money_out)| CommandOutput::LiquidityRemoved {
                    stock_out,
                    money_out,
                }),
        }
    }

    fn begin(&mut self) {
        self.index.begin();
        self.keeper.begin();
        self.ledger.begin();
    }

    fn commit(&mut self) {
        self.index.commit();
        self.keeper.commit();
        self.ledger.commit();
    }

    fn rollback(&mut self) {
        self.index.rollback();
        self.keeper.rollback();
        self.ledger.rollback();
    }
}

/// Apply a whole block, ignoring rejected commands.
pub fn run_block<I>(exchange: &mut Exchange<I>, height: u64, commands: Vec<Command>) -> BlockReceipt
where
    I: OrderIndex + Transactional + StateDigest,
{
    exchange.begin_block(height);
    for command in commands {
        let _ = exchange.deliver(command);
    }
    exchange.end_block()
}

// ============================================================================
// Unit Tests
// ============================================================================
