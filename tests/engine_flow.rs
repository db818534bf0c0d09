//! End-to-end flows through the block driver.

use hybrid_exchange::app::{Command, CommandOutput, Exchange};
use hybrid_exchange::config::MarketParams;
use hybrid_exchange::ledger::{FEE_COLLECTOR, POOL_MODULE};
use hybrid_exchange::orderbook::OrderIndex;
use hybrid_exchange::types::{Address, CancelReason, NewOrder, OrderId, SettlementEvent, Side};
use hybrid_exchange::DexError;

const PAIR: &str = "abc/usdt";
const ONE: u64 = 100_000_000;

fn alice() -> Address {
    Address::repeat(0xa1)
}

fn bob() -> Address {
    Address::repeat(0xb0)
}

fn carol() -> Address {
    Address::repeat(0xc0)
}

fn open_market(params: MarketParams) -> Exchange {
    let mut exchange = Exchange::in_memory(params).unwrap().with_event_capture(true);
    for who in [alice(), bob(), carol()] {
        exchange.ledger_mut().mint(&who, "abc", 1_000_000);
        exchange.ledger_mut().mint(&who, "usdt", 1_000_000);
    }
    exchange.begin_block(1);
    exchange
        .deliver(Command::CreatePair {
            owner: carol(),
            pair: PAIR.to_string(),
            price_precision: 4,
        })
        .unwrap();
    exchange
}

fn limit(sender: Address, sequence: u64, side: Side, price: u64, quantity: u128) -> Command {
    Command::AddLimitOrder(NewOrder {
        sender,
        sequence,
        pair: PAIR.to_string(),
        side,
        price,
        price_precision: 4,
        quantity,
    })
}

fn placed(output: CommandOutput) -> hybrid_exchange::OrderResult {
    match output {
        CommandOutput::OrderPlaced(result) => result,
        other => panic!("expected a placed order, got {other:?}"),
    }
}

#[test]
fn test_partial_fill_against_resting_sell() {
    let mut ex = open_market(MarketParams::default());

    let sell = placed(ex.deliver(limit(alice(), 1, Side::Sell, ONE, 100)).unwrap());
    assert!(sell.rested);
    assert_eq!(ex.ledger().frozen(&alice(), "abc"), 100);

    let buy = placed(ex.deliver(limit(bob(), 1, Side::Buy, ONE, 50)).unwrap());
    assert_eq!(buy.book_fills, 1);
    assert_eq!((buy.deal_stock, buy.deal_money), (50, 50));
    assert!(!buy.rested);

    let maker = ex.index().get_order(&OrderId::new(alice(), 1)).unwrap();
    assert_eq!(maker.left_stock, 50);
    assert_eq!(maker.freeze, 50);
    assert_eq!(ex.ledger().frozen(&alice(), "abc"), 50);

    // taker pays ceil(50 * 0.003) = 1 abc, maker pays ceil(50 * 0.001) = 1 usdt
    assert_eq!(ex.ledger().balance(&bob(), "abc"), 1_000_000 + 49);
    assert_eq!(ex.ledger().balance(&bob(), "usdt"), 1_000_000 - 50);
    assert_eq!(ex.ledger().frozen(&bob(), "usdt"), 0);
    assert_eq!(ex.ledger().balance(&alice(), "usdt"), 1_000_000 + 49);
    assert_eq!(ex.ledger().balance(&alice(), "abc"), 1_000_000 - 100);

    let receipt = ex.end_block();
    assert_eq!(receipt.fills_executed, 1);
    assert_eq!(receipt.commands_failed, 0);
}

#[test]
fn test_fee_rebate_goes_to_referee() {
    let mut ex = open_market(MarketParams::default());
    ex.referrals_mut().set_referee(bob(), carol());

    ex.deliver(limit(alice(), 1, Side::Sell, ONE, 10_000)).unwrap();
    ex.deliver(limit(bob(), 1, Side::Buy, ONE, 10_000)).unwrap();

    // taker fee 30 abc: 6 rebate, 6 validator, 18 pool
    assert_eq!(ex.ledger().balance(&bob(), "abc"), 1_000_000 + 10_000 - 30);
    assert_eq!(ex.ledger().balance(&carol(), "abc"), 1_000_000 + 6);
    assert_eq!(ex.ledger().module_balance(FEE_COLLECTOR, "abc"), 6);
    assert_eq!(ex.ledger().module_balance(POOL_MODULE, "abc"), 18);
    // maker fee 10 usdt: 2 validator, 8 pool
    assert_eq!(ex.ledger().balance(&alice(), "usdt"), 1_000_000 + 10_000 - 10);
    assert_eq!(ex.ledger().module_balance(FEE_COLLECTOR, "usdt"), 2);
    assert_eq!(ex.ledger().module_balance(POOL_MODULE, "usdt"), 8);

    let pool = ex.keeper().pool(PAIR).unwrap();
    assert_eq!(pool.stock_amm_reserve, 18);
    assert_eq!(pool.money_amm_reserve, 8);
    assert_eq!(pool.last_price, ONE);
}

#[test]
fn test_first_mint_and_withdrawal() {
    let mut ex = open_market(MarketParams::default());

    let minted = ex
        .deliver(Command::AddLiquidity {
            owner: alice(),
            pair: PAIR.to_string(),
            stock_in: 10_000,
            money_in: 1_000_000,
        })
        .unwrap();
    assert_eq!(minted, CommandOutput::LiquidityAdded(100_000));
    assert_eq!(ex.keeper().position(PAIR, &alice()), 100_000);

    let removed = ex
        .deliver(Command::RemoveLiquidity {
            owner: alice(),
            pair: PAIR.to_string(),
            liquidity: 100_000,
        })
        .unwrap();
    assert_eq!(
        removed,
        CommandOutput::LiquidityRemoved {
            stock_out: 10_000,
            money_out: 1_000_000,
        }
    );
    let pool = ex.keeper().pool(PAIR).unwrap();
    assert_eq!(pool.total_supply, 0);
    assert_eq!(ex.ledger().module_balance(POOL_MODULE, "usdt"), 0);
    assert_eq!(ex.ledger().balance(&alice(), "usdt"), 1_000_000);
}

#[test]
fn test_sell_routes_through_pool() {
    let mut ex = open_market(MarketParams::default());
    ex.deliver(Command::AddLiquidity {
        owner: carol(),
        pair: PAIR.to_string(),
        stock_in: 100_000,
        money_in: 100_000,
    })
    .unwrap();

    let sold = placed(ex.deliver(limit(bob(), 1, Side::Sell, 10_000, 1_000)).unwrap());
    assert_eq!(sold.book_fills, 0);
    assert_eq!(sold.pool_amount_in, 1_000);
    assert_eq!(sold.pool_amount_out, 990);
    assert!(!sold.rested);

    // pool fee ceil(990 * 0.003) = 3 stays in the pool
    assert_eq!(ex.ledger().balance(&bob(), "usdt"), 1_000_000 + 987);
    let pool = ex.keeper().pool(PAIR).unwrap();
    assert_eq!(pool.stock_amm_reserve, 101_000);
    assert_eq!(pool.money_amm_reserve, 100_000 - 990 + 3);
    assert_eq!(ex.ledger().module_balance(POOL_MODULE, "abc"), pool.stock_amm_reserve);
    assert_eq!(ex.ledger().module_balance(POOL_MODULE, "usdt"), pool.money_amm_reserve);

    let pool_deals = ex
        .drain_events()
        .into_iter()
        .filter(|event| matches!(event, SettlementEvent::PoolDeal(_)))
        .count();
    assert_eq!(pool_deals, 1);
}

#[test]
fn test_orders_expire_at_end_block() {
    let mut ex = open_market(MarketParams {
        order_lifetime_blocks: 2,
        ..MarketParams::default()
    });
    ex.deliver(limit(alice(), 1, Side::Buy, ONE / 2, 1_000)).unwrap();
    assert_eq!(ex.ledger().frozen(&alice(), "usdt"), 500);
    ex.end_block();

    ex.begin_block(2);
    ex.end_block();
    assert_eq!(ex.index().all_orders().len(), 1);

    ex.begin_block(3);
    ex.drain_events();
    ex.end_block();
    assert!(ex.index().all_orders().is_empty());
    assert_eq!(ex.ledger().frozen(&alice(), "usdt"), 0);
    assert_eq!(ex.ledger().balance(&alice(), "usdt"), 1_000_000);
    assert_eq!(ex.keeper().pool(PAIR).unwrap().money_order_book_reserve, 0);

    let events = ex.drain_events();
    assert!(matches!(
        events.as_slice(),
        [SettlementEvent::OrderCanceled(record)]
            if record.reason == CancelReason::Expired && record.unfrozen == 500
    ));
}

#[test]
fn test_rejected_command_leaves_state_untouched() {
    let mut ex = open_market(MarketParams::default());
    ex.deliver(limit(alice(), 1, Side::Sell, ONE, 100)).unwrap();
    let before = ex.state_root();

    let err = ex
        .deliver(limit(bob(), 1, Side::Buy, 2 * ONE, 10_000_000))
        .unwrap_err();
    assert!(matches!(err, DexError::InsufficientBalance { .. }));
    assert_eq!(ex.state_root(), before);

    // the rejected sequence is still free
    let retried = placed(ex.deliver(limit(bob(), 1, Side::Buy, ONE, 10)).unwrap());
    assert_eq!(retried.book_fills, 1);

    let receipt = ex.end_block();
    assert_eq!(receipt.commands_processed, 4);
    assert_eq!(receipt.commands_failed, 1);
}

#[test]
fn test_cancel_checks_sender() {
    let mut ex = open_market(MarketParams::default());
    ex.deliver(limit(alice(), 7, Side::Sell, ONE, 100)).unwrap();
    let id = OrderId::new(alice(), 7).to_string();

    let err = ex
        .deliver(Command::CancelOrder {
            sender: bob(),
            order_id: id.clone(),
        })
        .unwrap_err();
    assert!(matches!(err, DexError::NotOrderSender(_)));

    let canceled = ex
        .deliver(Command::CancelOrder {
            sender: alice(),
            order_id: id,
        })
        .unwrap();
    assert!(matches!(
        canceled,
        CommandOutput::OrderCanceled(ref record) if record.unfrozen == 100
    ));
    assert_eq!(ex.ledger().frozen(&alice(), "abc"), 0);
}

#[test]
fn test_buy_skips_ask_worth_no_money() {
    let mut ex = open_market(MarketParams::default());
    ex.deliver(limit(alice(), 1, Side::Sell, ONE / 2, 1)).unwrap();
    ex.deliver(limit(carol(), 1, Side::Sell, ONE, 10)).unwrap();

    let buy = placed(ex.deliver(limit(bob(), 1, Side::Buy, ONE, 1)).unwrap());
    assert_eq!(buy.deal_stock, 1);
    assert_eq!(buy.book_fills, 1);
    assert!(!buy.rested);

    assert_eq!(ex.index().get_order(&OrderId::new(carol(), 1)).unwrap().left_stock, 9);
    assert!(!ex.index().has_side(PAIR, Side::Buy));
    assert_eq!(ex.index().best_price(PAIR, Side::Sell), ONE / 2);
}
