//! Order removal: manual cancel, full fill and expiry.

use tracing::{debug, info};

use crate::error::{DexError, DexResult};
use crate::ledger::{BalanceService, ReferralRegistry};
use crate::orderbook::OrderIndex;
use crate::pool::ReserveStore;
use crate::types::{CancelReason, CancelRecord, Coin, Order, OrderId, PoolInfo, SettlementEvent};

use super::settle::release_book_reserve;
use super::{BlockContext, MatchingEngine};

impl<'a, B, R, I, S> MatchingEngine<'a, B, R, I, S>
where
    B: BalanceService + ?Sized,
    R: ReferralRegistry + ?Sized,
    I: OrderIndex + ?Sized,
    S: ReserveStore,
{
    /// Cancel a resting order on behalf of `sender`.
    pub fn delete_order(
        &mut self,
        ctx: &BlockContext,
        sender: &crate::types::Address,
        id: &OrderId,
        reason: CancelReason,
    ) -> DexResult<CancelRecord> {
        let order = self
            .index
            .get_order(id)
            .ok_or(DexError::OrderNotFound(*id))?;
        if order.sender() != *sender {
            return Err(DexError::NotOrderSender(*id));
        }
        let mut pool = self.keeper.pool(&order.pair)?;
        let record = self.remove_order(ctx, &mut pool, order, reason)?;
        self.keeper.set_pool(&pool);
        debug!(order_id = %id, ?reason, unfrozen = record.unfrozen, "order canceled");
        Ok(record)
    }

    /// Cancel every resting order older than the configured lifetime.
    ///
    /// An order created at height `h` expires once `h + lifetime <= height`.
    /// Returns the number of orders removed; zero when expiry is disabled.
    pub fn expire_orders(&mut self, ctx: &BlockContext) -> DexResult<usize> {
        let lifetime = self.params.order_lifetime_blocks;
        if lifetime == 0 {
            return Ok(0);
        }
        let expired: Vec<Order> = self
            .index
            .all_orders()
            .into_iter()
            .filter(|order| order.height.saturating_add(lifetime) <= ctx.height)
            .collect();
        let count = expired.len();
        for order in expired {
            let sender = order.sender();
            self.delete_order(ctx, &sender, &order.id, CancelReason::Expired)?;
        }
        if count > 0 {
            info!(height = ctx.height, count, "orders expired");
        }
        Ok(count)
    }

    /// Take an indexed order out of the book and return its frozen funds.
    pub(super) fn remove_order(
        &mut self,
        ctx: &BlockContext,
        pool: &mut PoolInfo,
        order: Order,
        reason: CancelReason,
    ) -> DexResult<CancelRecord> {
        self.index.del_order(&order);
        self.bank.unfreeze_coins(
            &order.sender(),
            &Coin::new(pool.input_denom(order.side), order.freeze),
        )?;
        release_book_reserve(pool, order.side, order.freeze);

        let record = CancelRecord {
            order_id: order.id,
            pair: order.pair,
            side: order.side,
            height: ctx.height,
            reason,
            left_stock: order.left_stock,
            unfrozen: order.freeze,
            deal_stock: order.deal_stock,
            deal_money: order.deal_money,
        };
        self.sink.emit(SettlementEvent::OrderCanceled(record.clone()));
        Ok(record)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
