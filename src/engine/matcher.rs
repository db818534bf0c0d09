//! Limit order entry: validation, the book walk and pool routing.

use tracing::debug;

use crate::error::{DexError, DexResult};
use crate::ledger::{BalanceService, ReferralRegistry};
use crate::orderbook::OrderIndex;
use crate::pool::math::{amount_out, into_pool_till_price, max_input_for_output};
use crate::pool::ReserveStore;
use crate::types::price::fits_precision;
use crate::types::{
    Coin, DealInfo, NewOrder, Order, OrderCreated, OrderId, PoolInfo, SettlementEvent, Side,
};

use super::settle::Fill;
use super::{BlockContext, MatchingEngine};

/// What happened to one incoming limit order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderResult {
    pub order_id: OrderId,
    /// Stock executed, book and pool together
    pub deal_stock: u128,
    /// Money executed, book and pool together
    pub deal_money: u128,
    /// Stock left resting in the book
    pub left_stock: u128,
    pub book_fills: u32,
    /// Input routed to the pool and what the pool paid for it
    pub pool_amount_in: u128,
    pub pool_amount_out: u128,
    /// Whether a remainder was added to the book
    pub rested: bool,
}

impl<'a, B, R, I, S> MatchingEngine<'a, B, R, I, S>
where
    B: BalanceService + ?Sized,
    R: ReferralRegistry + ?Sized,
    I: OrderIndex + ?Sized,
    S: ReserveStore,
{
    /// Accept a limit order, match it against the book and the pool, and
    /// rest whatever is left.
    ///
    /// Errors leave partial effects behind; the caller runs each command
    /// inside a transaction and rolls back on error.
    pub fn add_limit_order(
        &mut self,
        ctx: &mut BlockContext,
        request: NewOrder,
    ) -> DexResult<OrderResult> {
        if request.quantity == 0 {
            return Err(DexError::InvalidAmount("quantity must be positive"));
        }
        if request.price == 0 {
            return Err(DexError::InvalidPrice(request.price));
        }
        let mut pool = self.keeper.pool(&request.pair)?;
        if request.price_precision > pool.price_precision
            || !fits_precision(request.price, request.price_precision)
        {
            return Err(DexError::InvalidPricePrecision {
                given: request.price_precision,
                max: pool.price_precision,
            });
        }
        let id = request.id();
        if self.index.is_id_used(&id) {
            return Err(DexError::OrderAlreadyExists(id));
        }

        let mut order = Order::new(
            id,
            request.pair,
            request.side,
            request.price,
            request.price_precision,
            request.quantity,
            ctx.height,
            0,
        );
        order.freeze = order
            .commitment(order.quantity)
            .ok_or(DexError::Overflow("order commitment"))?;
        self.bank.freeze_coins(
            &order.sender(),
            &Coin::new(pool.input_denom(order.side), order.freeze),
        )?;
        order.order_index = ctx.next_order_index();
        self.index.mark_id_used(&id);

        debug!(
            order_id = %id,
            pair = %order.pair,
            side = ?order.side,
            price = order.price,
            quantity = order.quantity,
            height = ctx.height,
            "order accepted"
        );
        self.sink.emit(SettlementEvent::OrderCreated(OrderCreated {
            order_id: id,
            pair: order.pair.clone(),
            side: order.side,
            price: order.price,
            quantity: order.quantity,
            freeze: order.freeze,
            height: order.height,
            order_index: order.order_index,
        }));

        // routing is priced against the reserves as they were before this order
        let snapshot = pool.clone();
        let mut deal = DealInfo::new(&order);
        let mut last_price = None;

        // makers whose fill money rounds to zero are skipped; the candidate
        // scan is widened by their stock so that it still covers the taker
        let mut dust: Vec<OrderId> = Vec::new();
        let mut dust_stock: u128 = 0;
        'walk: loop {
            let mut query = order.clone();
            query.left_stock = order.left_stock.saturating_add(dust_stock);
            let mut progressed = false;
            for maker in self.index.matched_orders(&query) {
                if deal.is_done() {
                    break 'walk;
                }
                if dust.contains(&maker.id) {
                    continue;
                }
                try_deal_in_pool(&snapshot, &mut deal, order.side, maker.price);
                if deal.is_done() {
                    break 'walk;
                }
                let (maker_id, price, maker_left) = (maker.id, maker.price, maker.left_stock);
                match self.fill_with_maker(ctx, &mut pool, &mut deal, &mut order, maker)? {
                    Fill::Traded => last_price = Some(price),
                    Fill::Dust => {
                        dust.push(maker_id);
                        dust_stock = dust_stock.saturating_add(maker_left);
                    }
                    Fill::Exhausted => break 'walk,
                }
                progressed = true;
            }
            if !progressed || dust.is_empty() {
                break;
            }
        }
        if !deal.is_done() {
            try_deal_in_pool(&snapshot, &mut deal, order.side, order.price);
        }

        let pool_price = self.settle_pool(ctx, &mut pool, &mut deal, &mut order)?;
        if pool_price.is_some() {
            last_price = pool_price;
        }
        let rested = self.finish_taker(&mut pool, &mut deal, &mut order)?;

        pool.stock_amm_reserve = pool
            .stock_amm_reserve
            .checked_add(deal.fee_to_stock_reserve)
            .ok_or(DexError::Overflow("stock reserve"))?;
        pool.money_amm_reserve = pool
            .money_amm_reserve
            .checked_add(deal.fee_to_money_reserve)
            .ok_or(DexError::Overflow("money reserve"))?;
        if let Some(price) = last_price {
            pool.last_price = price;
        }
        self.keeper.set_pool(&pool);

        debug!(
            order_id = %id,
            deal_stock = order.deal_stock,
            deal_money = order.deal_money,
            left_stock = order.left_stock,
            book_fills = deal.book_fills,
            pool_in = deal.amount_in_to_pool,
            rested,
            "order matched"
        );
        Ok(OrderResult {
            order_id: id,
            deal_stock: order.deal_stock,
            deal_money: order.deal_money,
            left_stock: order.left_stock,
            book_fills: deal.book_fills,
            pool_amount_in: deal.amount_in_to_pool,
            pool_amount_out: deal.pool_stock_out,
            rested,
        })
    }
}

/// Route into the pool the volume that moves its price to `price`.
///
/// Routing accumulates in `deal`: `amount_in_to_pool` is always the total
/// input of one swap against `pool`. Sells route stock until `remain_amount`
/// runs out. Buys route money bounded by the unspent budget and by the input
/// whose output would exceed the stock still wanted.
pub(super) fn try_deal_in_pool(pool: &PoolInfo, deal: &mut DealInfo, side: Side, price: u64) {
    let target = into_pool_till_price(pool, side, price);
    let wanted = target.saturating_sub(deal.amount_in_to_pool);
    if wanted == 0 || deal.remain_amount == 0 {
        return;
    }
    let (reserve_in, reserve_out) = pool.reserves_for(side);
    match side {
        Side::Sell => {
            let diff = wanted.min(deal.remain_amount);
            deal.amount_in_to_pool += diff;
            deal.remain_amount -= diff;
            deal.input_left = deal.input_left.saturating_sub(diff);
        }
        Side::Buy => {
            let max_out = deal.pool_stock_out.saturating_add(deal.remain_amount);
            let cap = max_input_for_output(max_out, reserve_in, reserve_out).unwrap_or(u128::MAX);
            let diff = wanted
                .min(deal.input_left)
                .min(cap.saturating_sub(deal.amount_in_to_pool));
            if diff == 0 {
                return;
            }
            let total_in = deal.amount_in_to_pool + diff;
            let out = amount_out(total_in, reserve_in, reserve_out);
            let gained = out.saturating_sub(deal.pool_stock_out);
            deal.amount_in_to_pool = total_in;
            deal.pool_stock_out = out;
            deal.input_left -= diff;
            deal.remain_amount -= gained.min(deal.remain_amount);
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
