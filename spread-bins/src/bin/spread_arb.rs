//! Two-venue spread-arbitrage core: process entry point
//!
//! Bootstraps configuration and logging, builds the strategy engine and the
//! in-process transport for both venues, then runs the event dispatcher
//! until a shutdown signal arrives.
//!
//! The wire-level aeron subscribers/publishers named in config are not
//! fetchable in this workspace (see DESIGN.md); this binary instead feeds
//! the dispatcher from newline-delimited JSON on stdin and prints every
//! outbound command/log record to stdout, one line each. Each stdin line
//! is `{"venue": "exchange_1"|"exchange_2", "stream": "orderbooks"|"orders"|"balances", "message": <wire text>}`.

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use spread_bins::common::{bootstrap, CommonArgs};
use spread_core::command::CommandIdentity;
use spread_dispatch::{channel_sink, channel_source, EventDispatcher, VenueTransport};
use spread_strategy::StrategyEngine;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info, warn};

#[derive(Debug, Deserialize)]
struct StdinFrame {
    venue: String,
    stream: String,
    message: String,
}

/// Three per-venue stdin routing targets: one sender per inbound stream.
struct VenueFeed {
    name: String,
    orderbooks: UnboundedSender<String>,
    orders: UnboundedSender<String>,
    balances: UnboundedSender<String>,
}

impl VenueFeed {
    fn route(&self, stream: &str, message: String) {
        let sent = match stream {
            "orderbooks" => self.orderbooks.send(message),
            "orders" => self.orders.send(message),
            "balances" => self.balances.send(message),
            other => {
                warn!(venue = %self.name, stream = other, "unknown stdin stream name, dropped");
                return;
            }
        };
        if sent.is_err() {
            warn!(venue = %self.name, stream, "dispatcher no longer listening, dropped stdin frame");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CommonArgs::parse();
    let config = bootstrap(&args).context("configuration bootstrap failed")?;

    let identity = CommandIdentity {
        node: "core".to_string(),
        instance: config.instance.clone(),
        algo: config.algo.clone(),
    };

    let exchange_1 = config.core.exchange_1.name().to_string();
    let exchange_2 = config.core.exchange_2.name().to_string();
    info!(exchange_1 = %exchange_1, exchange_2 = %exchange_2, "starting spread-arbitrage core");

    let engine = StrategyEngine::new(identity.clone(), config.strategy.clone(), config.assets.clone(), exchange_1.clone(), exchange_2.clone());

    let (venue_1, feed_1) = build_venue(&exchange_1);
    let (venue_2, feed_2) = build_venue(&exchange_2);

    let dispatcher = EventDispatcher::new(identity, engine, venue_1, venue_2);
    let shutdown = dispatcher.shutdown_handle();

    let shutdown_for_signal = shutdown.clone();
    ctrlc::set_handler(move || {
        info!("shutdown signal received");
        shutdown_for_signal.store(true, Ordering::Release);
    })
    .context("failed to install signal handler")?;

    let dispatcher_handles = dispatcher.run().await;
    let stdin_task = spawn_stdin_router(vec![feed_1, feed_2], shutdown.clone());

    for handle in dispatcher_handles {
        let _ = handle.await;
    }
    stdin_task.abort();

    info!("spread-arbitrage core stopped");
    Ok(())
}

/// Build one venue's transport: real channel-backed inbound streams paired
/// with sinks that print every outbound command/log record to stdout, and
/// the sender half of each inbound stream for the stdin router to feed.
fn build_venue(name: &str) -> (VenueTransport, VenueFeed) {
    let (orderbooks_tx, orderbooks) = channel_source();
    let (orders_tx, orders) = channel_source();
    let (balances_tx, balances) = channel_source();
    let (commands, commands_rx) = channel_sink();
    let (logs, logs_rx) = channel_sink();

    spawn_stdout_printer(name.to_string(), "command", commands_rx);
    spawn_stdout_printer(name.to_string(), "log", logs_rx);

    let transport = VenueTransport {
        name: name.to_string(),
        orderbooks: Box::new(orderbooks),
        balances: Box::new(balances),
        orders: Box::new(orders),
        commands: Box::new(commands),
        logs: Box::new(logs),
    };
    let feed = VenueFeed {
        name: name.to_string(),
        orderbooks: orderbooks_tx,
        orders: orders_tx,
        balances: balances_tx,
    };
    (transport, feed)
}

fn spawn_stdout_printer(venue: String, kind: &'static str, mut rx: tokio::sync::mpsc::UnboundedReceiver<serde_json::Value>) {
    tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            println!("{}", serde_json::json!({"venue": venue, "kind": kind, "payload": payload}));
        }
    });
}

fn spawn_stdin_router(feeds: Vec<VenueFeed>, shutdown: Arc<AtomicBool>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let stdin = tokio::io::stdin();
        let mut lines = BufReader::new(stdin).lines();
        loop {
            if shutdown.load(Ordering::Acquire) {
                break;
            }
            let next = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(err) => {
                    error!(%err, "stdin read error");
                    break;
                }
            };
            if next.trim().is_empty() {
                continue;
            }
            let frame: StdinFrame = match serde_json::from_str(&next) {
                Ok(frame) => frame,
                Err(err) => {
                    warn!(%err, "malformed stdin frame, dropped");
                    continue;
                }
            };
            match feeds.iter().find(|f| f.name == frame.venue) {
                Some(feed) => feed.route(&frame.stream, frame.message),
                None => warn!(venue = %frame.venue, "unknown venue on stdin frame, dropped"),
            }
        }
    })
}
