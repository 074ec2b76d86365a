//! Wire-shape parsing for the three inbound message kinds (§6)
//!
//! Every numeric field on the wire is a JSON float; every numeric field the
//! engine touches is a `Decimal`. Per §4/§9 that conversion must go through
//! the float's textual form, never a direct cast — so these parsers lift the
//! wire shape into plain `f64` DTOs with `serde_json`, then hand each number
//! to [`spread_core::decimal::float_to_decimal`] one field at a time.

use crate::errors::DispatchError;
use serde::Deserialize;
use spread_core::decimal::float_to_decimal;
use spread_core::orderbook::OrderBook;
use spread_core::snapshot::{Balance, Order, OrderStatus, OrderType, Side};
use std::collections::HashMap;

fn decimal(kind: &'static str, value: f64) -> Result<rust_decimal::Decimal, DispatchError> {
    float_to_decimal(value).map_err(|source| DispatchError::BadDecimal { kind, source })
}

fn malformed(kind: &'static str) -> impl Fn(serde_json::Error) -> DispatchError {
    move |source| DispatchError::MalformedJson { kind, source }
}

#[derive(Debug, Deserialize)]
struct WireOrderBookMessage {
    exchange: String,
    data: WireOrderBookData,
}

#[derive(Debug, Deserialize)]
struct WireOrderBookData {
    symbol: String,
    bids: Vec<(f64, f64)>,
    asks: Vec<(f64, f64)>,
    timestamp: i64,
}

/// Parse `{exchange, action:"order_book_update", data:{symbol, bids, asks, timestamp}}`.
pub fn parse_orderbook_message(text: &str) -> Result<(String, OrderBook), DispatchError> {
    const KIND: &str = "order_book";
    let wire: WireOrderBookMessage = serde_json::from_str(text).map_err(malformed(KIND))?;

    let to_levels = |levels: Vec<(f64, f64)>| -> Result<Vec<(rust_decimal::Decimal, rust_decimal::Decimal)>, DispatchError> {
        levels.into_iter().map(|(p, a)| Ok((decimal(KIND, p)?, decimal(KIND, a)?))).collect()
    };

    let bids = to_levels(wire.data.bids)?;
    let asks = to_levels(wire.data.asks)?;
    let orderbook = OrderBook::new(wire.data.symbol, bids, asks, wire.data.timestamp);
    Ok((wire.exchange, orderbook))
}

#[derive(Debug, Deserialize)]
struct WireOrdersMessage {
    exchange: String,
    event: String,
    data: Vec<WireOrder>,
}

#[derive(Debug, Deserialize)]
struct WireOrder {
    client_order_id: String,
    symbol: String,
    side: Side,
    #[serde(rename = "type")]
    order_type: OrderType,
    price: f64,
    amount: f64,
    filled: f64,
    status: String,
}

/// Fold whatever terminal spelling the venue uses ("filled", "rejected",
/// "expired", "cancelled", ...) down to the three statuses the engine
/// distinguishes. Only "open" keeps an order alive.
fn fold_status(status: &str) -> OrderStatus {
    match status {
        "open" => OrderStatus::Open,
        "canceled" | "cancelled" => OrderStatus::Canceled,
        _ => OrderStatus::Closed,
    }
}

/// Parse `{exchange, event, action, data:[order...]}`. Only `event == "data"`
/// messages carry orders worth acting on; anything else returns `Ok(None)`
/// so the caller can log-and-skip per §6 without this being an error.
pub fn parse_orders_message(text: &str, updated_at: i64) -> Result<Option<(String, Vec<Order>)>, DispatchError> {
    const KIND: &str = "orders";
    let wire: WireOrdersMessage = serde_json::from_str(text).map_err(malformed(KIND))?;
    if wire.event != "data" {
        return Ok(None);
    }

    let orders = wire
        .data
        .into_iter()
        .map(|o| {
            Ok(Order {
                client_order_id: o.client_order_id,
                symbol: o.symbol,
                side: o.side,
                order_type: o.order_type,
                price: decimal(KIND, o.price)?,
                amount: decimal(KIND, o.amount)?,
                filled: decimal(KIND, o.filled)?,
                status: fold_status(&o.status),
                updated_at,
            })
        })
        .collect::<Result<Vec<_>, DispatchError>>()?;

    Ok(Some((wire.exchange, orders)))
}

#[derive(Debug, Deserialize)]
struct WireBalanceMessage {
    exchange: String,
    data: WireBalanceData,
}

#[derive(Debug, Deserialize)]
struct WireBalanceData {
    assets: HashMap<String, WireAssetBalance>,
}

#[derive(Debug, Deserialize)]
struct WireAssetBalance {
    free: f64,
    used: f64,
    total: f64,
}

/// Parse `{exchange, action, data:{assets:{asset:{free,used,total}}}}`.
pub fn parse_balance_message(text: &str) -> Result<(String, HashMap<String, Balance>), DispatchError> {
    const KIND: &str = "balance";
    let wire: WireBalanceMessage = serde_json::from_str(text).map_err(malformed(KIND))?;

    let balances = wire
        .data
        .assets
        .into_iter()
        .map(|(asset, b)| {
            Ok((
                asset,
                Balance {
                    free: decimal(KIND, b.free)?,
                    used: decimal(KIND, b.used)?,
                    total: decimal(KIND, b.total)?,
                },
            ))
        })
        .collect::<Result<HashMap<_, _>, DispatchError>>()?;

    Ok((wire.exchange, balances))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_orderbook_message_with_float_levels() {
        let text = r#"{"exchange":"binance","action":"order_book_update",
            "data":{"symbol":"BTC/USDT","bids":[[18400.5,0.1]],"asks":[[18500.25,0.2]],"timestamp":123}}"#;
        let (exchange, book) = parse_orderbook_message(text).unwrap();
        assert_eq!(exchange, "binance");
        assert_eq!(book.symbol, "BTC/USDT");
        assert_eq!(book.bids[0].0, decimal("t", 18400.5).unwrap());
        assert_eq!(book.timestamp, 123);
    }

    #[test]
    fn rejects_malformed_orderbook_json() {
        let err = parse_orderbook_message("not json").unwrap_err();
        assert_eq!(err.kind(), "order_book");
    }

    #[test]
    fn non_data_orders_event_is_skipped_not_errored() {
        let text = r#"{"exchange":"binance","event":"heartbeat","action":"orders","data":[]}"#;
        assert_eq!(parse_orders_message(text, 0).unwrap(), None);
    }

    #[test]
    fn parses_orders_and_folds_terminal_statuses() {
        let text = r#"{"exchange":"binance","event":"data","action":"orders","data":[
            {"client_order_id":"abc|spread_start","symbol":"BTC/USDT","side":"buy","type":"limit",
             "price":18400.0,"amount":0.5,"filled":0.5,"status":"filled"}]}"#;
        let (exchange, orders) = parse_orders_message(text, 42).unwrap().unwrap();
        assert_eq!(exchange, "binance");
        assert_eq!(orders[0].status, OrderStatus::Closed);
        assert_eq!(orders[0].updated_at, 42);
    }

    #[test]
    fn parses_balance_message() {
        let text = r#"{"exchange":"exmo","action":"balance_update",
            "data":{"assets":{"BTC":{"free":1.5,"used":0.0,"total":1.5}}}}"#;
        let (exchange, balances) = parse_balance_message(text).unwrap();
        assert_eq!(exchange, "exmo");
        assert_eq!(balances["BTC"].free, decimal("t", 1.5).unwrap());
    }
}
