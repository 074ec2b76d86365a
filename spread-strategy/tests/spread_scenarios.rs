//! End-to-end scenarios for the two-venue spread engine.

use rust_decimal_macros::dec;
use spread_core::command::CommandIdentity;
use spread_core::config::{AssetPair, StrategyConfig};
use spread_core::orderbook::OrderBook;
use spread_core::snapshot::{Balance, Order, OrderStatus, OrderType, Side};
use spread_strategy::StrategyEngine;
use std::collections::HashMap;

fn identity() -> CommandIdentity {
    CommandIdentity {
        node: "node-1".to_string(),
        instance: "inst-a".to_string(),
        algo: "spread-v1".to_string(),
    }
}

fn config(min_profit: rust_decimal::Decimal, balance_part_to_use: rust_decimal::Decimal, depth_limit: rust_decimal::Decimal) -> StrategyConfig {
    StrategyConfig {
        min_profit,
        balance_part_to_use,
        depth_limit,
        volatility_compensation: dec!(0),
        min_notional: dec!(10),
    }
}

fn assets() -> HashMap<String, AssetPair> {
    let mut map = HashMap::new();
    map.insert(
        "BTC/USDT".to_string(),
        AssetPair {
            base: "BTC".to_string(),
            quote: "USDT".to_string(),
        },
    );
    map
}

fn engine(min_profit: rust_decimal::Decimal, balance_part_to_use: rust_decimal::Decimal, depth_limit: rust_decimal::Decimal) -> StrategyEngine {
    StrategyEngine::new(
        identity(),
        config(min_profit, balance_part_to_use, depth_limit),
        assets(),
        "binance".to_string(),
        "exmo".to_string(),
    )
}

fn book(symbol: &str, bid: (rust_decimal::Decimal, rust_decimal::Decimal), ask: (rust_decimal::Decimal, rust_decimal::Decimal)) -> OrderBook {
    OrderBook::new(symbol, vec![bid], vec![ask], 1)
}

fn full_balance(free: rust_decimal::Decimal) -> Balance {
    Balance {
        free,
        used: dec!(0),
        total: free,
    }
}

fn seed_balances(engine: &mut StrategyEngine, venue: &str, btc_free: rust_decimal::Decimal, usdt_free: rust_decimal::Decimal) {
    let mut balances = HashMap::new();
    balances.insert("BTC".to_string(), full_balance(btc_free));
    balances.insert("USDT".to_string(), full_balance(usdt_free));
    engine.update_balances(venue, balances);
}

#[test]
fn scenario_1_no_action_without_two_books() {
    let mut e = engine(dec!(5), dec!(100), dec!(10));
    let commands = e.update_orderbook(
        "binance",
        book("BTC/USDT", (dec!(18000), dec!(0.5)), (dec!(19000), dec!(1))),
    );
    assert!(commands.is_empty());
}

#[test]
fn scenario_2_creates_limit_when_spread_exceeds_threshold() {
    let mut e = engine(dec!(5), dec!(100), dec!(10));
    seed_balances(&mut e, "binance", dec!(1.5), dec!(25000));
    seed_balances(&mut e, "exmo", dec!(1.5), dec!(25000));

    e.update_orderbook("binance", book("BTC/USDT", (dec!(18400), dec!(5)), (dec!(18500), dec!(10))));
    let commands = e.update_orderbook("exmo", book("BTC/USDT", (dec!(17000), dec!(5)), (dec!(19000), dec!(10))));

    let creates: Vec<_> = commands.iter().filter(|c| c.action == "create_orders").collect();
    assert_eq!(creates.len(), 1, "expected exactly one create_orders command, got {commands:?}");

    let limit_venue = &creates[0].exchange;
    let observed = e.snapshot(limit_venue).unwrap().last_buy_observation("BTC/USDT");
    assert!(observed.is_some(), "expected a cached buy observation for observability");
}

#[test]
fn scenario_3_cancels_on_adverse_book_move() {
    let mut e = engine(dec!(5), dec!(100), dec!(10));
    seed_balances(&mut e, "binance", dec!(1.5), dec!(25000));
    seed_balances(&mut e, "exmo", dec!(1.5), dec!(25000));

    e.update_orderbook("binance", book("BTC/USDT", (dec!(18400), dec!(5)), (dec!(18500), dec!(10))));
    let created = e.update_orderbook("exmo", book("BTC/USDT", (dec!(17000), dec!(5)), (dec!(19000), dec!(10))));
    assert!(created.iter().any(|c| c.action == "create_orders"));

    let commands = e.update_orderbook("binance", book("BTC/USDT", (dec!(17000), dec!(5)), (dec!(19000), dec!(10))));
    assert!(
        commands.iter().any(|c| c.action == "cancel_orders"),
        "expected a cancel_orders command after the adverse move, got {commands:?}"
    );
}

#[test]
fn scenario_4_hedges_on_fill() {
    let mut e = engine(dec!(5), dec!(100), dec!(10));
    seed_balances(&mut e, "binance", dec!(1.5), dec!(25000));
    seed_balances(&mut e, "exmo", dec!(1.5), dec!(25000));

    e.update_orderbook("binance", book("BTC/USDT", (dec!(18400), dec!(5)), (dec!(18500), dec!(10))));
    let created = e.update_orderbook("exmo", book("BTC/USDT", (dec!(17000), dec!(5)), (dec!(19000), dec!(10))));
    let create = created.iter().find(|c| c.action == "create_orders").expect("scenario 2 creates an order");
    let payload = create.data.as_array().unwrap()[0].clone();
    let client_order_id = payload["client_order_id"].as_str().unwrap().to_string();
    let symbol = payload["symbol"].as_str().unwrap().to_string();
    let side: Side = serde_json::from_value(payload["side"].clone()).unwrap();
    let price: rust_decimal::Decimal = serde_json::from_value(payload["price"].clone()).unwrap();
    let amount: rust_decimal::Decimal = serde_json::from_value(payload["amount"].clone()).unwrap();
    let venue = &create.exchange;

    let filled_order = Order {
        client_order_id: client_order_id.clone(),
        symbol,
        side,
        order_type: OrderType::Limit,
        price,
        amount,
        filled: amount,
        status: OrderStatus::Closed,
        updated_at: 2,
    };

    let commands = e.update_orders(venue, vec![filled_order]);
    let hedge = commands
        .iter()
        .find(|c| c.action == "create_orders")
        .expect("expected a hedge create_orders command");
    let hedge_payload = &hedge.data.as_array().unwrap()[0];
    assert_eq!(hedge_payload["type"], "market");
    let hedge_amount: rust_decimal::Decimal = serde_json::from_value(hedge_payload["amount"].clone()).unwrap();
    assert_eq!(hedge_amount, amount);
    let hedge_side: Side = serde_json::from_value(hedge_payload["side"].clone()).unwrap();
    assert_eq!(hedge_side, side.opposite());
    assert_ne!(&hedge.exchange, venue);

    assert!(e.snapshot(venue).unwrap().limit_orders.get(&client_order_id).is_none());
}

#[test]
fn scenario_5_duplicate_guard_blocks_second_open_order() {
    let mut e = engine(dec!(5), dec!(100), dec!(10));
    seed_balances(&mut e, "binance", dec!(1.5), dec!(25000));
    seed_balances(&mut e, "exmo", dec!(1.5), dec!(25000));

    e.update_orderbook("binance", book("BTC/USDT", (dec!(18400), dec!(5)), (dec!(18500), dec!(10))));
    let created = e.update_orderbook("exmo", book("BTC/USDT", (dec!(17000), dec!(5)), (dec!(19000), dec!(10))));
    assert!(created.iter().any(|c| c.action == "create_orders"));

    let commands = e.update_orderbook("binance", book("BTC/USDT", (dec!(18410), dec!(5)), (dec!(18510), dec!(10))));
    assert!(
        !commands.iter().any(|c| c.action == "create_orders"),
        "must not emit a second buy-limit create while one is open, got {commands:?}"
    );
}

#[test]
fn scenario_6_notional_floor_blocks_tiny_balance() {
    let mut e = engine(dec!(5), dec!(100), dec!(10));
    seed_balances(&mut e, "binance", dec!(1.5), dec!(5));
    seed_balances(&mut e, "exmo", dec!(1.5), dec!(25000));

    e.update_orderbook("binance", book("BTC/USDT", (dec!(18400), dec!(5)), (dec!(18500), dec!(10))));
    let commands = e.update_orderbook("exmo", book("BTC/USDT", (dec!(17000), dec!(5)), (dec!(19000), dec!(10))));

    assert!(
        !commands.iter().any(|c| c.action == "create_orders"),
        "notional floor should block an order sized from a 5 USDT balance, got {commands:?}"
    );
}
