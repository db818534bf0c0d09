//! Per-order matching accumulator.

use crate::types::Order;

/// Running totals for one `add_limit_order` call.
///
/// Pool routing is accumulated here and settled once after the book walk,
/// so `amount_in_to_pool` and `pool_stock_out` always describe a single
/// swap against the reserves as they were before the order arrived.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DealInfo {
    /// Stock the incoming order still wants to execute
    pub remain_amount: u128,
    /// Input token (money for buys, stock for sells) routed to the pool
    pub amount_in_to_pool: u128,
    /// Output the pool owes for `amount_in_to_pool`: tracked while routing
    /// for buys, fixed at settlement for sells
    pub pool_stock_out: u128,
    /// Frozen input not yet spent on book fills or pool routing
    pub input_left: u128,
    pub deal_stock_in_book: u128,
    pub deal_money_in_book: u128,
    /// Fee amounts that end up in the AMM reserves
    pub fee_to_stock_reserve: u128,
    pub fee_to_money_reserve: u128,
    /// Book fills executed for this order
    pub book_fills: u32,
}

impl DealInfo {
    /// Start accumulating for a freshly frozen order.
    pub fn new(order: &Order) -> Self {
        Self {
            remain_amount: order.left_stock,
            input_left: order.freeze,
            ..Self::default()
        }
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        self.remain_amount == 0
    }
}
