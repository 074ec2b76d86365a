//! The `Transport` collaborator contract (§6) and an in-process
//! channel-backed implementation for integration tests and local runs.
//!
//! The core treats channel identifiers and stream ids as opaque
//! configuration (`spread_core::config::AeronChannel`); this crate is the
//! only place that resolves them into something that actually moves bytes.
//! A production deployment swaps [`InboundStream`]/[`OutboundSink`] for
//! aeron-backed subscribers and publishers without touching the dispatcher.

use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

/// One inbound stream: order books, orders, or balances for one venue.
/// `poll` is non-blocking — it drains whatever is ready right now and
/// returns immediately, matching the reference transport's
/// `Subscriber::poll()` semantics.
pub trait InboundStream: Send {
    fn poll(&mut self) -> Vec<String>;
}

/// Transport-layer outbound failure classes (§7). Everything else the
/// dispatcher might want to log is carried in `Other`'s message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport has no subscriber")]
    NotConnected,
    #[error("transport requires an admin action before publishing: {0}")]
    AdminAction(String),
    #[error("transport error: {0}")]
    Other(String),
}

/// One outbound stream: commands or logs, addressed to a single venue.
pub trait OutboundSink: Send {
    fn publish(&mut self, payload: Value) -> Result<(), TransportError>;
}

/// An in-process [`InboundStream`] backed by an unbounded channel. The
/// paired [`mpsc::UnboundedSender`] is handed to test code (or, for a local
/// run, to whatever decodes the wire feed) to push raw JSON text in.
pub struct ChannelSource {
    rx: mpsc::UnboundedReceiver<String>,
}

impl InboundStream for ChannelSource {
    fn poll(&mut self) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(message) = self.rx.try_recv() {
            out.push(message);
        }
        out
    }
}

/// Construct a connected sender/[`ChannelSource`] pair for one inbound stream.
pub fn channel_source() -> (mpsc::UnboundedSender<String>, ChannelSource) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, ChannelSource { rx })
}

/// An in-process [`OutboundSink`] backed by an unbounded channel. Published
/// payloads land on the paired receiver for test assertions or local
/// inspection; never reports `NotConnected` or `AdminAction` since the
/// channel has no notion of subscriber presence.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Value>,
}

impl OutboundSink for ChannelSink {
    fn publish(&mut self, payload: Value) -> Result<(), TransportError> {
        self.tx.send(payload).map_err(|_| TransportError::NotConnected)
    }
}

/// Construct a connected [`ChannelSink`]/receiver pair for one outbound stream.
pub fn channel_sink() -> (ChannelSink, mpsc::UnboundedReceiver<Value>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelSink { tx }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_source_drains_everything_ready() {
        let (tx, mut source) = channel_source();
        tx.send("a".to_string()).unwrap();
        tx.send("b".to_string()).unwrap();
        assert_eq!(source.poll(), vec!["a".to_string(), "b".to_string()]);
        assert!(source.poll().is_empty());
    }

    #[test]
    fn channel_sink_delivers_published_payloads() {
        let (mut sink, mut rx) = channel_sink();
        sink.publish(serde_json::json!({"a": 1})).unwrap();
        assert_eq!(rx.try_recv().unwrap(), serde_json::json!({"a": 1}));
    }

    #[test]
    fn channel_sink_reports_not_connected_once_receiver_dropped() {
        let (mut sink, rx) = channel_sink();
        drop(rx);
        assert_eq!(sink.publish(serde_json::json!(null)), Err(TransportError::NotConnected));
    }
}
