//! The spread-arbitrage strategy engine
//!
//! A deterministic state machine with three entry points
//! (`update_orderbook`, `update_orders`, `update_balances`) that mutate two
//! per-venue snapshots and return command batches. Not thread-safe — the
//! dispatcher guarantees a single call is ever in flight at a time.

use rust_decimal::Decimal;
use spread_core::command::CommandIdentity;
use spread_core::config::{AssetPair, StrategyConfig};
use spread_core::orderbook::{predict_price_of_market_buy, predict_price_of_market_sell, OrderBook};
use spread_core::snapshot::{Balance, ExchangeSnapshot, Order, OrderStatus, OrderType, Side};
use spread_core::{now_micros, Command};
use std::collections::HashMap;
use tracing::{debug, warn};

pub struct StrategyEngine {
    identity: CommandIdentity,
    config: StrategyConfig,
    assets: HashMap<String, AssetPair>,
    exchange_1: String,
    exchange_2: String,
    snapshot_1: ExchangeSnapshot,
    snapshot_2: ExchangeSnapshot,
}

impl StrategyEngine {
    pub fn new(
        identity: CommandIdentity,
        config: StrategyConfig,
        assets: HashMap<String, AssetPair>,
        exchange_1: String,
        exchange_2: String,
    ) -> Self {
        let snapshot_1 = ExchangeSnapshot::new(exchange_1.clone());
        let snapshot_2 = ExchangeSnapshot::new(exchange_2.clone());
        Self {
            identity,
            config,
            assets,
            exchange_1,
            exchange_2,
            snapshot_1,
            snapshot_2,
        }
    }

    pub fn exchange_1_name(&self) -> &str {
        &self.exchange_1
    }

    pub fn exchange_2_name(&self) -> &str {
        &self.exchange_2
    }

    pub fn snapshot(&self, venue_name: &str) -> Option<&ExchangeSnapshot> {
        if venue_name == self.exchange_1 {
            Some(&self.snapshot_1)
        } else if venue_name == self.exchange_2 {
            Some(&self.snapshot_2)
        } else {
            None
        }
    }

    fn other_venue(&self, venue_name: &str) -> Option<String> {
        if venue_name == self.exchange_1 {
            Some(self.exchange_2.clone())
        } else if venue_name == self.exchange_2 {
            Some(self.exchange_1.clone())
        } else {
            None
        }
    }

    fn remove_orders(&mut self, venue_name: &str, ids: &[String]) {
        let snapshot = if venue_name == self.exchange_1 {
            &mut self.snapshot_1
        } else if venue_name == self.exchange_2 {
            &mut self.snapshot_2
        } else {
            return;
        };
        for id in ids {
            snapshot.limit_orders.remove(id);
        }
    }

    // ---- entry points -----------------------------------------------

    pub fn update_orderbook(&mut self, venue_name: &str, orderbook: OrderBook) -> Vec<Command> {
        let known = venue_name == self.exchange_1 || venue_name == self.exchange_2;
        if !known {
            warn!(venue = venue_name, "update_orderbook: unknown venue");
            return Vec::new();
        }

        let symbol = orderbook.symbol.clone();
        let snapshot = if venue_name == self.exchange_1 {
            &mut self.snapshot_1
        } else {
            &mut self.snapshot_2
        };
        snapshot.orderbooks.insert(symbol, orderbook);
        snapshot.orderbook_updates_observed += 1;

        let mut commands = Vec::new();

        let venues = [self.exchange_1.clone(), self.exchange_2.clone()];
        for venue in &venues {
            let has_open = self.snapshot(venue).is_some_and(|s| s.limit_orders.values().any(|o| o.status.is_open()));
            if has_open {
                commands.extend(self.check_positions_to_actual(venue));
            }
        }

        let any_venue_flat = venues
            .iter()
            .any(|v| self.snapshot(v).is_some_and(|s| !s.limit_orders.values().any(|o| o.status.is_open())));
        if any_venue_flat {
            commands.extend(self.execute_spread_strategy());
        }

        commands
    }

    pub fn update_orders(&mut self, venue_name: &str, orders: Vec<Order>) -> Vec<Command> {
        if self.snapshot(venue_name).is_none() {
            warn!(venue = venue_name, "update_orders: unknown venue");
            return Vec::new();
        }

        let mut commands = Vec::new();
        for inbound in orders {
            if inbound.order_type == OrderType::Market {
                debug!(client_order_id = %inbound.client_order_id, "update_orders: market echo, logged only");
                continue;
            }

            let located = if self
                .snapshot(venue_name)
                .is_some_and(|s| s.limit_orders.contains_key(&inbound.client_order_id))
            {
                Some(venue_name.to_string())
            } else {
                self.other_venue(venue_name).filter(|other| {
                    self.snapshot(other).is_some_and(|s| s.limit_orders.contains_key(&inbound.client_order_id))
                })
            };

            let Some(limit_venue) = located else {
                warn!(client_order_id = %inbound.client_order_id, "update_orders: unknown client id, skipping");
                continue;
            };

            let new_status = inbound.status;
            let id = inbound.client_order_id.clone();

            let target = if limit_venue == self.exchange_1 {
                &mut self.snapshot_1
            } else {
                &mut self.snapshot_2
            };
            target.insert_order(inbound);

            let market_venue = self.other_venue(&limit_venue).expect("two configured venues");
            commands.extend(self.monitor_orders(&limit_venue, &market_venue));

            if !new_status.is_open() {
                self.remove_orders(&limit_venue, std::slice::from_ref(&id));
            }
        }
        commands
    }

    pub fn update_balances(&mut self, venue_name: &str, balances: HashMap<String, Balance>) -> Vec<Command> {
        if balances.is_empty() {
            warn!(venue = venue_name, "update_balances: empty balance payload, discarded");
            return Vec::new();
        }
        let known = venue_name == self.exchange_1 || venue_name == self.exchange_2;
        if !known {
            warn!(venue = venue_name, "update_balances: unknown venue");
            return Vec::new();
        }
        let snapshot = if venue_name == self.exchange_1 {
            &mut self.snapshot_1
        } else {
            &mut self.snapshot_2
        };
        snapshot.balances = balances;
        Vec::new()
    }

    // ---- the core spread pass -----------------------------------------

    fn execute_spread_strategy(&mut self) -> Vec<Command> {
        let have_balances = self.snapshot(&self.exchange_1.clone()).is_some_and(|s| s.has_balance())
            && self.snapshot(&self.exchange_2.clone()).is_some_and(|s| s.has_balance());
        if !have_balances {
            return Vec::new();
        }

        let symbols: Vec<String> = {
            let s1 = &self.snapshot_1;
            let s2 = &self.snapshot_2;
            s1.orderbooks.keys().filter(|symbol| s2.orderbooks.contains_key(*symbol)).cloned().collect()
        };

        let mut commands = Vec::new();
        let exchange_1 = self.exchange_1.clone();
        let exchange_2 = self.exchange_2.clone();

        for symbol in &symbols {
            // (limit-on-1, market-on-2, buy) then sell
            commands.extend(self.calculate_buy_limit_order(&exchange_2, &exchange_1, symbol));
            commands.extend(self.calculate_sell_limit_order(&exchange_2, &exchange_1, symbol));
            // (limit-on-2, market-on-1, buy) then sell
            commands.extend(self.calculate_buy_limit_order(&exchange_1, &exchange_2, symbol));
            commands.extend(self.calculate_sell_limit_order(&exchange_1, &exchange_2, symbol));
        }

        commands
    }

    // ---- buy-side limit sizing -----------------------------------------

    fn calculate_buy_limit_order(&mut self, market_venue: &str, limit_venue: &str, symbol: &str) -> Vec<Command> {
        let Some(asset_pair) = self.assets.get(symbol).cloned() else {
            warn!(symbol, "calculate_buy_limit_order: symbol missing from asset map");
            return Vec::new();
        };
        let balance_fraction = self.config.balance_fraction();
        let min_notional = self.config.min_notional;
        let min_profit_ratio = self.config.min_profit_ratio();

        let (limit, market) = if limit_venue == self.exchange_1 {
            (&mut self.snapshot_1, &self.snapshot_2)
        } else if limit_venue == self.exchange_2 {
            (&mut self.snapshot_2, &self.snapshot_1)
        } else {
            return Vec::new();
        };
        if market.name != market_venue {
            return Vec::new();
        }
        if limit.has_open_order_with_side(Side::Buy) {
            return Vec::new();
        }
        if !limit.has_balance() {
            return Vec::new();
        }
        let Some(limit_book) = limit.orderbook(symbol) else { return Vec::new() };
        let Some((limit_price, _)) = limit_book.best_bid() else { return Vec::new() };

        let Some(market_book) = market.orderbook(symbol) else { return Vec::new() };
        let quote_free = market.balance(&asset_pair.quote).map(|b| b.free).unwrap_or_default();
        let predicted_buy_price = predict_price_of_market_buy(quote_free, market_book);
        if predicted_buy_price.is_zero() {
            debug!(symbol, "calculate_buy_limit_order: no market-side liquidity, skipping");
            return Vec::new();
        }
        let quote_as_base = quote_free / predicted_buy_price;
        let base_free = limit.balance(&asset_pair.base).map(|b| b.free).unwrap_or_default();
        let amount = quote_as_base.min(base_free) * balance_fraction;
        if amount.is_sign_negative() || amount.is_zero() {
            return Vec::new();
        }

        let market_price = predict_price_of_market_sell(amount, market_book);
        if (limit_price * amount) <= min_notional {
            return Vec::new();
        }
        if market_price.is_zero() {
            return Vec::new();
        }

        let profit = market_price / limit_price;
        limit.record_buy_observation(symbol, limit_price, market_price, profit);
        if profit <= min_profit_ratio {
            return Vec::new();
        }

        let client_order_id = format!("{}|spread_start", uuid::Uuid::new_v4());
        let now = now_micros();
        let command = self.identity.create_order(
            limit_venue,
            now,
            client_order_id.clone(),
            symbol.to_string(),
            Side::Buy,
            OrderType::Limit,
            limit_price,
            amount,
        );

        limit.insert_order(Order {
            client_order_id,
            symbol: symbol.to_string(),
            side: Side::Buy,
            order_type: OrderType::Limit,
            price: limit_price,
            amount,
            filled: Decimal::ZERO,
            status: OrderStatus::Open,
            updated_at: now,
        });

        vec![command]
    }

    // ---- sell-side limit sizing ------------------------------------------

    fn calculate_sell_limit_order(&mut self, market_venue: &str, limit_venue: &str, symbol: &str) -> Vec<Command> {
        let Some(asset_pair) = self.assets.get(symbol).cloned() else {
            warn!(symbol, "calculate_sell_limit_order: symbol missing from asset map");
            return Vec::new();
        };
        let balance_fraction = self.config.balance_fraction();
        let min_notional = self.config.min_notional;
        let min_profit_ratio = self.config.min_profit_ratio();

        let (limit, market) = if limit_venue == self.exchange_1 {
            (&mut self.snapshot_1, &self.snapshot_2)
        } else if limit_venue == self.exchange_2 {
            (&mut self.snapshot_2, &self.snapshot_1)
        } else {
            return Vec::new();
        };
        if market.name != market_venue {
            return Vec::new();
        }
        if limit.has_open_order_with_side(Side::Sell) {
            return Vec::new();
        }
        if !limit.has_balance() {
            return Vec::new();
        }
        let Some(limit_book) = limit.orderbook(symbol) else { return Vec::new() };
        let Some((limit_price, _)) = limit_book.best_ask() else { return Vec::new() };
        if limit_price.is_zero() {
            return Vec::new();
        }

        let Some(market_book) = market.orderbook(symbol) else { return Vec::new() };
        let quote_free = limit.balance(&asset_pair.quote).map(|b| b.free).unwrap_or_default();
        // Reads the base balance from `limit`, not `market`, for both legs of
        // the min() below — preserved from the source as-is (spec §9.3); a
        // past reviewer flagged this as possibly wanting the market venue's
        // base balance instead, since that's the leg actually being sold.
        // TODO: confirm with product before changing which venue this reads from.
        let base_free = limit.balance(&asset_pair.base).map(|b| b.free).unwrap_or_default();
        let amount = (quote_free / limit_price).min(base_free) * balance_fraction;
        if amount.is_sign_negative() || amount.is_zero() {
            return Vec::new();
        }

        // predict_price_of_market_buy is denominated in quote; convert the
        // base `amount` we want to buy on the market venue into a quote
        // budget via the market book's best ask before walking it (see
        // DESIGN.md for why this anchor was chosen).
        let Some((anchor_price, _)) = market_book.best_ask() else { return Vec::new() };
        if anchor_price.is_zero() {
            return Vec::new();
        }
        let quote_budget = amount * anchor_price;
        let market_price = predict_price_of_market_buy(quote_budget, market_book);
        if market_price.is_zero() {
            return Vec::new();
        }

        if (limit_price * amount) <= min_notional {
            return Vec::new();
        }

        let profit = limit_price / market_price;
        limit.record_sell_observation(symbol, limit_price, market_price, profit);
        if profit <= min_profit_ratio {
            return Vec::new();
        }

        let client_order_id = format!("{}|spread_start", uuid::Uuid::new_v4());
        let now = now_micros();
        let command = self.identity.create_order(
            limit_venue,
            now,
            client_order_id.clone(),
            symbol.to_string(),
            Side::Sell,
            OrderType::Limit,
            limit_price,
            amount,
        );

        limit.insert_order(Order {
            client_order_id,
            symbol: symbol.to_string(),
            side: Side::Sell,
            order_type: OrderType::Limit,
            price: limit_price,
            amount,
            filled: Decimal::ZERO,
            status: OrderStatus::Open,
            updated_at: now,
        });

        vec![command]
    }

    // ---- hedge-and-cancel pass on order updates -------------------------

    fn monitor_orders(&mut self, limit_venue: &str, market_venue: &str) -> Vec<Command> {
        let Some(snapshot) = self.snapshot(limit_venue) else { return Vec::new() };
        let ids: Vec<String> = snapshot.limit_orders.keys().cloned().collect();

        let mut commands = Vec::new();
        let mut to_delete = Vec::new();
        let now = now_micros();

        for id in ids {
            let Some(order) = self.snapshot(limit_venue).and_then(|s| s.limit_orders.get(&id)).cloned() else {
                continue;
            };

            if !order.filled.is_zero() {
                let hedge_id = format!("{}|spread_end", uuid::Uuid::new_v4());
                commands.push(self.identity.create_order(
                    market_venue,
                    now,
                    hedge_id,
                    order.symbol.clone(),
                    order.side.opposite(),
                    OrderType::Market,
                    order.price,
                    order.filled,
                ));
            }

            if !self.check_order_to_actual(limit_venue, market_venue, &id) {
                commands.push(self.identity.cancel_order(limit_venue, now, id.clone(), order.symbol.clone()));
                to_delete.push(id);
            }
        }

        self.remove_orders(limit_venue, &to_delete);
        commands
    }

    // ---- cancel pass on book moves ---------------------------------------

    fn check_positions_to_actual(&mut self, limit_venue: &str) -> Vec<Command> {
        let Some(market_venue) = self.other_venue(limit_venue) else { return Vec::new() };
        let Some(snapshot) = self.snapshot(limit_venue) else { return Vec::new() };
        let ids: Vec<String> = snapshot
            .limit_orders
            .iter()
            .filter(|(_, o)| o.status.is_open())
            .map(|(id, _)| id.clone())
            .collect();

        let mut commands = Vec::new();
        let mut to_delete = Vec::new();
        let now = now_micros();

        for id in ids {
            if self.check_order_to_actual(limit_venue, &market_venue, &id) {
                continue;
            }
            let Some(order) = self.snapshot(limit_venue).and_then(|s| s.limit_orders.get(&id)).cloned() else {
                continue;
            };
            commands.push(self.identity.cancel_order(limit_venue, now, id.clone(), order.symbol));
            to_delete.push(id);
        }

        self.remove_orders(limit_venue, &to_delete);
        commands
    }

    // ---- still-profitable-and-not-stale check ---------------------------

    fn check_order_to_actual(&self, limit_venue: &str, market_venue: &str, client_order_id: &str) -> bool {
        let Some(limit) = self.snapshot(limit_venue) else { return false };
        let Some(market) = self.snapshot(market_venue) else { return false };
        let Some(order) = limit.limit_orders.get(client_order_id) else {
            return false;
        };
        let Some(ob_l) = limit.orderbook(&order.symbol) else { return false };
        let Some(ob_m) = market.orderbook(&order.symbol) else { return false };

        let volatility = self.config.volatility_compensation_fraction();
        let min_profit = self.config.min_profit_ratio();
        let depth_limit = self.config.depth_limit_ratio();

        match order.side {
            Side::Sell => {
                let predicted = predict_price_of_market_buy(order.price * order.amount, ob_l);
                if predicted.is_zero() {
                    return false;
                }
                let profit = predicted / order.price;
                if profit + volatility < min_profit {
                    return false;
                }
                let Some((best_bid, _)) = ob_l.best_bid() else { return false };
                if best_bid / order.price > depth_limit {
                    return false;
                }
                true
            }
            Side::Buy => {
                let predicted = predict_price_of_market_sell(order.amount, ob_m);
                if predicted.is_zero() {
                    return false;
                }
                let profit = predicted / order.price;
                if profit + volatility < min_profit {
                    return false;
                }
                let Some((best_ask, _)) = ob_l.best_ask() else { return false };
                if best_ask.is_zero() {
                    return false;
                }
                let ratio = order.price / best_ask;
                if (ratio - Decimal::ONE).abs() > depth_limit - Decimal::ONE {
                    return false;
                }
                true
            }
        }
    }
}
