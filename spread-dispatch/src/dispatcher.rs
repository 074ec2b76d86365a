//! The event dispatcher (§4.4): binds three inbound streams per venue to the
//! strategy engine's three entry points, and routes every outbound command
//! to the venue named in its `exchange` field.
//!
//! Concurrency model (§5): one polling task per inbound stream — six total
//! for two venues — each draining whatever is ready, handing it to the
//! engine under a single mutex (so the engine is never entered
//! concurrently with itself), then sleeping ~100µs before polling again. A
//! whole inbound message is processed — mutation and publication — before
//! the owning task yields.

use crate::inbound::{parse_balance_message, parse_orderbook_message, parse_orders_message};
use crate::transport::{InboundStream, OutboundSink, TransportError};
use spread_core::command::{Command, CommandIdentity};
use spread_core::now_micros;
use spread_strategy::StrategyEngine;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, warn};

/// Cooperative sleep between polling iterations on an empty stream (§5).
const POLL_INTERVAL: Duration = Duration::from_micros(100);

/// One venue's full transport surface: three inbound streams the
/// dispatcher polls, and two outbound sinks (commands, logs) it publishes
/// to. Constructed by the binary from whatever [`crate::transport`]
/// implementation is wired up for that venue.
pub struct VenueTransport {
    pub name: String,
    pub orderbooks: Box<dyn InboundStream>,
    pub balances: Box<dyn InboundStream>,
    pub orders: Box<dyn InboundStream>,
    pub commands: Box<dyn OutboundSink>,
    pub logs: Box<dyn OutboundSink>,
}

/// The outbound half of a venue: just the two sinks, shared behind a mutex
/// so either venue's polling tasks can route a command to it (a hedge
/// created from venue A's order update is addressed to venue B).
struct VenueSinks {
    name: String,
    commands: Box<dyn OutboundSink>,
    logs: Box<dyn OutboundSink>,
}

/// Publish `payload` to `sink`, applying the outbound error taxonomy of §7:
/// a disconnected or otherwise-failing transport drops the message with a
/// warning; an admin-action requirement is retried immediately until it
/// succeeds.
async fn publish_with_retry(sink: &mut dyn OutboundSink, payload: serde_json::Value, context: &str) {
    loop {
        match sink.publish(payload.clone()) {
            Ok(()) => return,
            Err(TransportError::NotConnected) => {
                warn!(context, "transport has no subscriber, dropping message");
                return;
            }
            Err(TransportError::AdminAction(reason)) => {
                warn!(context, %reason, "transport requires an admin action, retrying");
                tokio::task::yield_now().await;
            }
            Err(TransportError::Other(reason)) => {
                warn!(context, %reason, "transport error, dropping message");
                return;
            }
        }
    }
}

/// Routes outbound commands to the venue named in their `exchange` field.
/// Unknown exchanges are logged at error and dropped — never delivered to
/// the wrong venue (§4.4).
struct CommandRouter {
    venues: Vec<Arc<Mutex<VenueSinks>>>,
}

impl CommandRouter {
    async fn route(&self, command: Command) {
        let mut matched = false;
        for venue in &self.venues {
            let mut sinks = venue.lock().await;
            if sinks.name != command.exchange {
                continue;
            }
            matched = true;
            let payload = serde_json::to_value(&command).unwrap_or(serde_json::Value::Null);
            publish_with_retry(sinks.commands.as_mut(), payload.clone(), "command").await;
            publish_with_retry(sinks.logs.as_mut(), payload, "log").await;
            break;
        }
        if !matched {
            error!(exchange = %command.exchange, action = %command.action, "unknown exchange on outbound command, dropped");
        }
    }

    async fn route_all(&self, commands: Vec<Command>) {
        for command in commands {
            self.route(command).await;
        }
    }
}

/// Binds two [`VenueTransport`]s to a [`StrategyEngine`] and pumps all six
/// inbound streams until shutdown is requested.
pub struct EventDispatcher {
    identity: CommandIdentity,
    engine: Arc<Mutex<StrategyEngine>>,
    venue_1: VenueTransport,
    venue_2: VenueTransport,
    shutdown: Arc<AtomicBool>,
}

impl EventDispatcher {
    pub fn new(identity: CommandIdentity, engine: StrategyEngine, venue_1: VenueTransport, venue_2: VenueTransport) -> Self {
        Self {
            identity,
            engine: Arc::new(Mutex::new(engine)),
            venue_1,
            venue_2,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle future callers can use to request a graceful stop; polling
    /// tasks observe this between iterations (§5).
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    /// Emit `cancel_all_orders` and `get_balance` to both venues before the
    /// main pump starts (§4.4 "initial sync").
    async fn startup_sync(&mut self, router: &CommandRouter) {
        for venue in [&self.venue_1.name, &self.venue_2.name] {
            let now = now_micros();
            router.route(self.identity.cancel_all_orders(venue, now)).await;
            router.route(self.identity.get_balance(venue, now)).await;
        }
    }

    /// Run until `shutdown_handle()` is set. Spawns six polling tasks (one
    /// per inbound stream) and awaits all of them.
    pub async fn run(mut self) -> Vec<JoinHandle<()>> {
        let sinks_1 = Arc::new(Mutex::new(VenueSinks {
            name: self.venue_1.name.clone(),
            commands: self.venue_1.commands,
            logs: self.venue_1.logs,
        }));
        let sinks_2 = Arc::new(Mutex::new(VenueSinks {
            name: self.venue_2.name.clone(),
            commands: self.venue_2.commands,
            logs: self.venue_2.logs,
        }));
        let router = Arc::new(CommandRouter {
            venues: vec![sinks_1, sinks_2],
        });

        self.startup_sync(&router).await;

        let mut handles = Vec::new();
        handles.push(spawn_orderbook_loop(
            self.venue_1.name.clone(),
            self.venue_1.orderbooks,
            self.engine.clone(),
            router.clone(),
            self.shutdown.clone(),
        ));
        handles.push(spawn_orderbook_loop(
            self.venue_2.name.clone(),
            self.venue_2.orderbooks,
            self.engine.clone(),
            router.clone(),
            self.shutdown.clone(),
        ));
        handles.push(spawn_orders_loop(
            self.venue_1.name.clone(),
            self.venue_1.orders,
            self.engine.clone(),
            router.clone(),
            self.shutdown.clone(),
        ));
        handles.push(spawn_orders_loop(
            self.venue_2.name.clone(),
            self.venue_2.orders,
            self.engine.clone(),
            router.clone(),
            self.shutdown.clone(),
        ));
        handles.push(spawn_balances_loop(
            self.venue_1.name.clone(),
            self.venue_1.balances,
            self.engine.clone(),
            router.clone(),
            self.shutdown.clone(),
        ));
        handles.push(spawn_balances_loop(
            self.venue_2.name.clone(),
            self.venue_2.balances,
            self.engine.clone(),
            router.clone(),
            self.shutdown.clone(),
        ));

        handles
    }
}

fn spawn_orderbook_loop(
    venue: String,
    mut stream: Box<dyn InboundStream>,
    engine: Arc<Mutex<StrategyEngine>>,
    router: Arc<CommandRouter>,
    shutdown: Arc<AtomicBool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while !shutdown.load(Ordering::Acquire) {
            for message in stream.poll() {
                match parse_orderbook_message(&message) {
                    Ok((exchange, orderbook)) => {
                        let commands = engine.lock().await.update_orderbook(&exchange, orderbook);
                        router.route_all(commands).await;
                    }
                    Err(err) => error!(venue = %venue, %err, "malformed order-book message, dropped"),
                }
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    })
}

fn spawn_orders_loop(
    venue: String,
    mut stream: Box<dyn InboundStream>,
    engine: Arc<Mutex<StrategyEngine>>,
    router: Arc<CommandRouter>,
    shutdown: Arc<AtomicBool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while !shutdown.load(Ordering::Acquire) {
            for message in stream.poll() {
                match parse_orders_message(&message, now_micros()) {
                    Ok(Some((exchange, orders))) => {
                        let commands = engine.lock().await.update_orders(&exchange, orders);
                        router.route_all(commands).await;
                    }
                    Ok(None) => {
                        tracing::debug!(venue = %venue, "non-data orders event, logged only");
                    }
                    Err(err) => error!(venue = %venue, %err, "malformed orders message, dropped"),
                }
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    })
}

fn spawn_balances_loop(
    venue: String,
    mut stream: Box<dyn InboundStream>,
    engine: Arc<Mutex<StrategyEngine>>,
    router: Arc<CommandRouter>,
    shutdown: Arc<AtomicBool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while !shutdown.load(Ordering::Acquire) {
            for message in stream.poll() {
                match parse_balance_message(&message) {
                    Ok((exchange, balances)) => {
                        let commands = engine.lock().await.update_balances(&exchange, balances);
                        router.route_all(commands).await;
                    }
                    Err(err) => error!(venue = %venue, %err, "malformed balance message, dropped"),
                }
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    })
}
