//! Per-venue state: balances, own orders, and the book, held together
//!
//! An [`ExchangeSnapshot`] is the engine's entire view of one venue between
//! events — no history, no P&L, just the latest known balance, the latest
//! order book, and the set of orders the engine itself believes are open
//! there.

use crate::orderbook::OrderBook;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Limit,
    Market,
}

/// An order is alive in `limit_orders` exactly while its last known status
/// is `Open`. The wire protocol may carry other terminal spellings
/// ("filled", "rejected", "expired", ...); all of them fold into `Closed` or
/// `Canceled` here since the engine only distinguishes "still open" from
/// "not open".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Open,
    Closed,
    Canceled,
}

impl OrderStatus {
    pub fn is_open(self) -> bool {
        matches!(self, OrderStatus::Open)
    }
}

/// One asset's balance on a venue: `free + used == total`, trusted from the
/// source rather than enforced.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Balance {
    pub free: Decimal,
    pub used: Decimal,
    pub total: Decimal,
}

/// One order the engine has placed, tracked optimistically from the moment
/// the command is built through venue acknowledgement and fill.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub client_order_id: String,
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub price: Decimal,
    pub amount: Decimal,
    pub filled: Decimal,
    pub status: OrderStatus,
    /// Microsecond UNIX timestamp this engine created or last updated the order.
    pub updated_at: i64,
}

impl Order {
    pub fn remaining(&self) -> Decimal {
        self.amount - self.filled
    }
}

/// Cached per-symbol figures written purely for observability (metrics,
/// logging) at the moment the engine computes them. Never read back by any
/// decision — see [`ExchangeSnapshot::record_buy_observation`] and
/// [`ExchangeSnapshot::record_sell_observation`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DerivedMetrics {
    pub last_limit_price: Option<Decimal>,
    pub last_market_price: Option<Decimal>,
    pub last_profit: Option<Decimal>,
}

/// The engine's full view of one venue: its books, its balances, and the
/// orders it believes are open there. Fields start empty and are populated
/// by the first update of each kind.
#[derive(Debug, Clone, Default)]
pub struct ExchangeSnapshot {
    pub name: String,
    pub orderbooks: HashMap<String, OrderBook>,
    pub balances: HashMap<String, Balance>,
    pub limit_orders: HashMap<String, Order>,
    /// Count of order-book updates observed, never read by strategy decisions —
    /// kept only for logging span fields.
    pub orderbook_updates_observed: u64,
    /// Last buy-side and sell-side figures this venue produced as a limit
    /// venue, keyed by symbol. Observability only; see [`DerivedMetrics`].
    derived_buy: HashMap<String, DerivedMetrics>,
    derived_sell: HashMap<String, DerivedMetrics>,
}

impl ExchangeSnapshot {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn orderbook(&self, symbol: &str) -> Option<&OrderBook> {
        self.orderbooks.get(symbol)
    }

    pub fn balance(&self, asset: &str) -> Option<&Balance> {
        self.balances.get(asset)
    }

    /// Record the limit/market prices and realized profit ratio the last
    /// buy-limit evaluation computed for `symbol`, for observability only.
    pub fn record_buy_observation(&mut self, symbol: &str, limit_price: Decimal, market_price: Decimal, profit: Decimal) {
        self.derived_buy.insert(
            symbol.to_string(),
            DerivedMetrics {
                last_limit_price: Some(limit_price),
                last_market_price: Some(market_price),
                last_profit: Some(profit),
            },
        );
    }

    /// Record the limit/market prices and realized profit ratio the last
    /// sell-limit evaluation computed for `symbol`, for observability only.
    pub fn record_sell_observation(&mut self, symbol: &str, limit_price: Decimal, market_price: Decimal, profit: Decimal) {
        self.derived_sell.insert(
            symbol.to_string(),
            DerivedMetrics {
                last_limit_price: Some(limit_price),
                last_market_price: Some(market_price),
                last_profit: Some(profit),
            },
        );
    }

    /// Last observed buy-side figures for `symbol`. Read-only, never
    /// consulted by the strategy engine itself.
    pub fn last_buy_observation(&self, symbol: &str) -> Option<DerivedMetrics> {
        self.derived_buy.get(symbol).copied()
    }

    /// Last observed sell-side figures for `symbol`. Read-only, never
    /// consulted by the strategy engine itself.
    pub fn last_sell_observation(&self, symbol: &str) -> Option<DerivedMetrics> {
        self.derived_sell.get(symbol).copied()
    }

    pub fn has_balance(&self) -> bool {
        !self.balances.is_empty()
    }

    /// True if any currently tracked order on this venue has the given side.
    /// Used by the buy/sell duplicate guard, which deliberately checks side
    /// alone across every symbol rather than per symbol.
    pub fn has_open_order_with_side(&self, side: Side) -> bool {
        self.limit_orders.values().any(|o| o.status.is_open() && o.side == side)
    }

    pub fn insert_order(&mut self, order: Order) {
        self.limit_orders.insert(order.client_order_id.clone(), order);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(id: &str, side: Side, status: OrderStatus) -> Order {
        Order {
            client_order_id: id.to_string(),
            symbol: "BTC/USDT".to_string(),
            side,
            order_type: OrderType::Limit,
            price: Decimal::ONE,
            amount: Decimal::ONE,
            filled: Decimal::ZERO,
            status,
            updated_at: 0,
        }
    }

    #[test]
    fn duplicate_guard_ignores_closed_orders() {
        let mut snap = ExchangeSnapshot::new("venue-a");
        snap.insert_order(order("abc", Side::Buy, OrderStatus::Closed));
        assert!(!snap.has_open_order_with_side(Side::Buy));

        snap.insert_order(order("def", Side::Buy, OrderStatus::Open));
        assert!(snap.has_open_order_with_side(Side::Buy));
        assert!(!snap.has_open_order_with_side(Side::Sell));
    }

}
