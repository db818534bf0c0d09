//! Settlement of book fills, the pool leg and the taker remainder.
//!
//! Token flow of a book fill at the maker's price `p`:
//!
//! ```text
//! stock q             seller -> buyer     (after unfreezing the seller's part)
//! money floor(q*p/S)  buyer  -> seller    (after unfreezing the buyer's part)
//! fees                each receiver pays on what it received
//! ```
//!
//! The pool leg moves the routed input into the pool account and pays the
//! output back, minus the pool fee, from it.

use tracing::trace;

use crate::error::{corrupted, DexError, DexResult};
use crate::fee::{split_fee, trade_fee, FeeSplit};
use crate::ledger::{BalanceService, ReferralRegistry, FEE_COLLECTOR, POOL_MODULE};
use crate::orderbook::OrderIndex;
use crate::pool::math::amount_out;
use crate::pool::ReserveStore;
use crate::types::price::{effective_price, money_floor, stock_for_money};
use crate::types::{
    Address, CancelReason, Coin, DealInfo, FillRecord, Order, PoolDeal, PoolInfo, Role,
    SettlementEvent, Side,
};

use super::{BlockContext, MatchingEngine};

/// Outcome of trading against one resting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Fill {
    Traded,
    /// The trade's money rounds to zero at this maker's price; try the next one
    Dust,
    /// No stock left to trade or no budget to pay for it
    Exhausted,
}

/// Fee charged to one party of a fill.
struct Charged {
    fee: u128,
    split: FeeSplit,
    referee: Option<Address>,
}

fn sub_or_abort(value: u128, amount: u128, what: &'static str) -> u128 {
    match value.checked_sub(amount) {
        Some(v) => v,
        None => corrupted("settlement", format!("{what} underflow: {value} - {amount}")),
    }
}

/// Reduce the order-book reserve counter holding `side`'s frozen funds.
pub(super) fn release_book_reserve(pool: &mut PoolInfo, side: Side, amount: u128) {
    match side {
        Side::Buy => {
            pool.money_order_book_reserve =
                sub_or_abort(pool.money_order_book_reserve, amount, "money order book reserve");
        }
        Side::Sell => {
            pool.stock_order_book_reserve =
                sub_or_abort(pool.stock_order_book_reserve, amount, "stock order book reserve");
        }
    }
}

impl<'a, B, R, I, S> MatchingEngine<'a, B, R, I, S>
where
    B: BalanceService + ?Sized,
    R: ReferralRegistry + ?Sized,
    I: OrderIndex + ?Sized,
    S: ReserveStore,
{
    /// Charge `fee` in `denom` to `payer`, who already holds it.
    ///
    /// The pool share goes to the pool account and is earmarked in `deal`
    /// for the reserves.
    fn charge_fee(
        &mut self,
        payer: &Address,
        denom: &str,
        fee: u128,
        deal: &mut DealInfo,
        stock: bool,
    ) -> DexResult<Charged> {
        let referee = self.referrals.referee_addr(payer);
        let split = split_fee(
            fee,
            referee.is_some(),
            self.referrals.rebate_ratio(),
            self.referrals.rebate_ratio_base(),
            self.params.fee_to_validator,
            self.params.fee_precision,
        );
        if let Some(referee) = &referee {
            self.bank
                .send_coins(payer, referee, &Coin::new(denom, split.rebate))?;
        }
        self.bank.send_coins_from_account_to_module(
            payer,
            FEE_COLLECTOR,
            &Coin::new(denom, split.to_validator),
        )?;
        self.bank
            .send_coins_from_account_to_module(payer, POOL_MODULE, &Coin::new(denom, split.to_pool))?;
        if stock {
            deal.fee_to_stock_reserve += split.to_pool;
        } else {
            deal.fee_to_money_reserve += split.to_pool;
        }
        Ok(Charged {
            fee,
            split,
            referee,
        })
    }

    /// Trade the incoming order against one resting order at the maker's price.
    pub(super) fn fill_with_maker(
        &mut self,
        ctx: &BlockContext,
        pool: &mut PoolInfo,
        deal: &mut DealInfo,
        taker: &mut Order,
        mut maker: Order,
    ) -> DexResult<Fill> {
        let price = maker.price;
        let mut stock = deal.remain_amount.min(maker.left_stock);
        if taker.is_buy() {
            let affordable = stock_for_money(deal.input_left, price).unwrap_or(u128::MAX);
            stock = stock.min(affordable);
        }
        if stock == 0 {
            return Ok(Fill::Exhausted);
        }
        let money = money_floor(stock, price).ok_or(DexError::Overflow("fill money"))?;
        if money == 0 {
            return Ok(Fill::Dust);
        }

        // maker keeps exactly the commitment of its new remainder frozen
        let maker_frozen = maker.freeze;
        maker.record_fill(stock, money);
        maker.freeze = match maker.commitment(maker.left_stock) {
            Some(freeze) => freeze,
            None => corrupted("settlement", format!("commitment overflow of {}", maker.id)),
        };
        let maker_release = sub_or_abort(maker_frozen, maker.freeze, "maker freeze");
        let taker_release = if taker.is_buy() { money } else { stock };
        deal.input_left = sub_or_abort(deal.input_left, taker_release, "taker budget");
        deal.remain_amount -= stock;
        deal.deal_stock_in_book += stock;
        deal.deal_money_in_book += money;
        deal.book_fills += 1;
        taker.record_fill(stock, money);
        release_book_reserve(pool, maker.side, maker_release);

        let stock_denom = pool.stock_denom().to_string();
        let money_denom = pool.money_denom().to_string();
        let (maker_input, taker_input) = match taker.side {
            Side::Buy => (&stock_denom, &money_denom),
            Side::Sell => (&money_denom, &stock_denom),
        };
        self.bank
            .unfreeze_coins(&maker.sender(), &Coin::new(maker_input.as_str(), maker_release))?;
        self.bank
            .unfreeze_coins(&taker.sender(), &Coin::new(taker_input.as_str(), taker_release))?;

        let (buyer, seller) = match taker.side {
            Side::Buy => (taker.sender(), maker.sender()),
            Side::Sell => (maker.sender(), taker.sender()),
        };
        self.bank
            .send_coins(&seller, &buyer, &Coin::new(stock_denom.as_str(), stock))?;
        self.bank
            .send_coins(&buyer, &seller, &Coin::new(money_denom.as_str(), money))?;

        // each side pays its fee in the token it received
        let (taker_rate, maker_rate) = (self.params.taker_fee_rate, self.params.maker_fee_rate);
        let precision = self.params.fee_precision;
        let taker_gets_stock = taker.is_buy();
        let (taker_received, maker_received) =
            if taker_gets_stock { (stock, money) } else { (money, stock) };
        let (taker_fee_denom, maker_fee_denom) = if taker_gets_stock {
            (&stock_denom, &money_denom)
        } else {
            (&money_denom, &stock_denom)
        };
        let taker_fee = self.charge_fee(
            &taker.sender(),
            taker_fee_denom,
            trade_fee(taker_received, taker_rate, precision),
            deal,
            taker_gets_stock,
        )?;
        let maker_fee = self.charge_fee(
            &maker.sender(),
            maker_fee_denom,
            trade_fee(maker_received, maker_rate, precision),
            deal,
            !taker_gets_stock,
        )?;

        trace!(
            taker = %taker.id,
            maker = %maker.id,
            price,
            stock,
            money,
            "book fill"
        );
        self.sink.emit(SettlementEvent::OrderFilled(fill_record(
            taker,
            &maker,
            Role::Taker,
            ctx.height,
            price,
            stock,
            money,
            taker_fee_denom,
            &taker_fee,
        )));
        self.sink.emit(SettlementEvent::OrderFilled(fill_record(
            &maker,
            taker,
            Role::Maker,
            ctx.height,
            price,
            stock,
            money,
            maker_fee_denom,
            &maker_fee,
        )));

        if maker.is_filled() {
            self.remove_order(ctx, pool, maker, CancelReason::FullyFilled)?;
        } else {
            self.index.update_order(&maker);
        }
        Ok(Fill::Traded)
    }

    /// Settle the accumulated pool routing as one swap.
    ///
    /// Returns the effective price of the swap, `None` when nothing was
    /// routed or the swap would pay out nothing (the routing is then
    /// discarded and its input returned to the order's budget).
    pub(super) fn settle_pool(
        &mut self,
        ctx: &BlockContext,
        pool: &mut PoolInfo,
        deal: &mut DealInfo,
        order: &mut Order,
    ) -> DexResult<Option<u64>> {
        let amount_in = deal.amount_in_to_pool;
        if amount_in == 0 {
            return Ok(None);
        }
        let (reserve_in, reserve_out) = pool.reserves_for(order.side);
        let out = amount_out(amount_in, reserve_in, reserve_out);
        if out == 0 {
            deal.input_left += amount_in;
            if order.side == Side::Sell {
                deal.remain_amount += amount_in;
            }
            deal.amount_in_to_pool = 0;
            deal.pool_stock_out = 0;
            return Ok(None);
        }
        deal.pool_stock_out = out;

        let trader = order.sender();
        let input_denom = pool.input_denom(order.side).to_string();
        let output_denom = pool.output_denom(order.side).to_string();
        self.bank
            .unfreeze_coins(&trader, &Coin::new(input_denom.as_str(), amount_in))?;
        self.bank
            .send_coins_from_account_to_module(&trader, POOL_MODULE, &Coin::new(input_denom.as_str(), amount_in))?;

        // the pool keeps its share of the fee by paying out less
        let fee = trade_fee(out, self.params.pool_fee_rate, self.params.fee_precision);
        let referee = self.referrals.referee_addr(&trader);
        let split = split_fee(
            fee,
            referee.is_some(),
            self.referrals.rebate_ratio(),
            self.referrals.rebate_ratio_base(),
            self.params.fee_to_validator,
            self.params.fee_precision,
        );
        self.bank.send_coins_from_module_to_account(
            POOL_MODULE,
            &trader,
            &Coin::new(output_denom.as_str(), out - fee),
        )?;
        if let Some(referee) = &referee {
            self.bank.send_coins_from_module_to_account(
                POOL_MODULE,
                referee,
                &Coin::new(output_denom.as_str(), split.rebate),
            )?;
        }
        self.bank.send_coins_from_module_to_module(
            POOL_MODULE,
            FEE_COLLECTOR,
            &Coin::new(output_denom.as_str(), split.to_validator),
        )?;

        let new_in = reserve_in
            .checked_add(amount_in)
            .ok_or(DexError::Overflow("pool reserve"))?;
        let new_out = sub_or_abort(reserve_out, out, "pool reserve") + split.to_pool;
        match order.side {
            Side::Buy => {
                pool.money_amm_reserve = new_in;
                pool.stock_amm_reserve = new_out;
                order.record_fill(out, amount_in);
            }
            Side::Sell => {
                pool.stock_amm_reserve = new_in;
                pool.money_amm_reserve = new_out;
                order.record_fill(amount_in, out);
            }
        }

        let (stock, money) = match order.side {
            Side::Buy => (out, amount_in),
            Side::Sell => (amount_in, out),
        };
        let price = effective_price(stock, money).unwrap_or(0);
        self.sink.emit(SettlementEvent::PoolDeal(PoolDeal {
            order_id: order.id,
            pair: order.pair.clone(),
            side: order.side,
            height: ctx.height,
            amount_in,
            amount_out: out,
            price,
            fee,
            rebate: split.rebate,
            rebate_referee: referee,
            stock_reserve: pool.stock_amm_reserve,
            money_reserve: pool.money_amm_reserve,
        }));
        trace!(order_id = %order.id, amount_in, amount_out = out, fee, "pool deal");
        Ok(Some(price))
    }

    /// Release the unspent budget and rest the remainder, if any.
    ///
    /// A buy whose budget no longer covers its remainder at the limit price
    /// (pool rounding can cost more than the limit) keeps only the stock the
    /// budget affords.
    pub(super) fn finish_taker(
        &mut self,
        pool: &mut PoolInfo,
        deal: &mut DealInfo,
        order: &mut Order,
    ) -> DexResult<bool> {
        let mut required = order
            .commitment(order.left_stock)
            .ok_or(DexError::Overflow("order commitment"))?;
        if required > deal.input_left {
            if order.side == Side::Sell {
                corrupted(
                    "settlement",
                    format!("sell {} owes {required} with {} left", order.id, deal.input_left),
                );
            }
            order.left_stock = stock_for_money(deal.input_left, order.price)
                .unwrap_or(0)
                .min(order.left_stock);
            required = order
                .commitment(order.left_stock)
                .ok_or(DexError::Overflow("order commitment"))?;
        }

        let excess = deal.input_left - required;
        self.bank.unfreeze_coins(
            &order.sender(),
            &Coin::new(pool.input_denom(order.side), excess),
        )?;
        deal.input_left = required;
        order.freeze = required;

        if order.left_stock == 0 {
            return Ok(false);
        }
        match order.side {
            Side::Buy => {
                pool.money_order_book_reserve = pool
                    .money_order_book_reserve
                    .checked_add(required)
                    .ok_or(DexError::Overflow("money order book reserve"))?;
            }
            Side::Sell => {
                pool.stock_order_book_reserve = pool
                    .stock_order_book_reserve
                    .checked_add(required)
                    .ok_or(DexError::Overflow("stock order book reserve"))?;
            }
        }
        self.index.add_order(order);
        Ok(true)
    }
}

#[allow(clippy::too_many_arguments)]
fn fill_record(
    order: &Order,
    counterparty: &Order,
    role: Role,
    height: u64,
    price: u64,
    stock: u128,
    money: u128,
    fee_denom: &str,
    charged: &Charged,
) -> FillRecord {
    FillRecord {
        order_id: order.id,
        counterparty: counterparty.id,
        pair: order.pair.clone(),
        side: order.side,
        role,
        height,
        price,
        curr_stock: stock,
        curr_money: money,
        deal_stock: order.deal_stock,
        deal_money: order.deal_money,
        left_stock: order.left_stock,
        fee: charged.fee,
        fee_denom: fee_denom.to_string(),
        rebate: charged.split.rebate,
        rebate_referee: charged.referee,
    }
}
