//! Hybrid Exchange - demo binary.
//!
//! Runs a few blocks against an in-memory exchange and logs what happens.
//! Set `RUST_LOG=hybrid_exchange=debug` for per-order detail.

use hybrid_exchange::app::{Command, CommandOutput, Exchange};
use hybrid_exchange::config::MarketParams;
use hybrid_exchange::types::price::{from_fixed_trimmed, to_fixed};
use hybrid_exchange::types::{Address, NewOrder, Side};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const PAIR: &str = "abc/usdt";

fn limit(sender: Address, sequence: u64, side: Side, price: &str, quantity: u128) -> Command {
    Command::AddLimitOrder(NewOrder {
        sender,
        sequence,
        pair: PAIR.to_string(),
        side,
        price: to_fixed(price).unwrap_or_default(),
        price_precision: 2,
        quantity,
    })
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let params = match std::env::var("MARKET_PARAMS") {
        Ok(path) => match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|json| MarketParams::from_json(&json).map_err(|e| e.to_string()))
        {
            Ok(params) => params,
            Err(err) => {
                error!(%path, %err, "cannot load market parameters");
                std::process::exit(1);
            }
        },
        Err(_) => MarketParams::default(),
    };

    let mut exchange = match Exchange::in_memory(params) {
        Ok(exchange) => exchange.with_event_capture(true),
        Err(err) => {
            error!(%err, "invalid market parameters");
            std::process::exit(1);
        }
    };

    let (lp, alice, bob) = (Address::repeat(1), Address::repeat(2), Address::repeat(3));
    exchange.ledger_mut().mint(&lp, "abc", 1_000_000);
    exchange.ledger_mut().mint(&lp, "usdt", 2_000_000);
    exchange.ledger_mut().mint(&alice, "abc", 50_000);
    exchange.ledger_mut().mint(&bob, "usdt", 200_000);

    let blocks = vec![
        vec![
            Command::CreatePair {
                owner: lp,
                pair: PAIR.to_string(),
                price_precision: 2,
            },
            Command::AddLiquidity {
                owner: lp,
                pair: PAIR.to_string(),
                stock_in: 1_000_000,
                money_in: 2_000_000,
            },
        ],
        vec![
            limit(alice, 1, Side::Sell, "2.05", 10_000),
            limit(alice, 2, Side::Sell, "2.10", 10_000),
            limit(bob, 1, Side::Buy, "1.95", 5_000),
        ],
        vec![
            limit(bob, 2, Side::Buy, "2.10", 30_000),
            Command::CancelOrder {
                sender: bob,
                order_id: format!("{}-1", bob),
            },
        ],
    ];

    for (height, commands) in (1u64..).zip(blocks) {
        exchange.begin_block(height);
        for command in commands {
            match exchange.deliver(command) {
                Ok(CommandOutput::OrderPlaced(placed)) => info!(
                    order_id = %placed.order_id,
                    deal_stock = placed.deal_stock,
                    deal_money = placed.deal_money,
                    left = placed.left_stock,
                    "order placed"
                ),
                Ok(output) => info!(?output, "command applied"),
                Err(err) => info!(%err, "command rejected"),
            }
        }
        let receipt = exchange.end_block();
        for event in exchange.drain_events() {
            match event.to_json() {
                Ok(json) => info!(target: "events", "{json}"),
                Err(err) => error!(%err, "cannot encode event"),
            }
        }
        info!(height, state_root = %receipt.state_root_hex(), "block done");
    }

    if let Ok(pool) = exchange.keeper().pool(PAIR) {
        info!(
            stock = pool.stock_amm_reserve,
            money = pool.money_amm_reserve,
            last_price = %from_fixed_trimmed(pool.last_price),
            "final pool"
        );
    }
}
