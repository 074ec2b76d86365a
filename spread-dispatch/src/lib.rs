//! Transport abstraction and event dispatcher for the spread-arbitrage core
//!
//! Everything in `spread-core` and `spread-strategy` is pure data and pure
//! policy; this crate is where the workspace starts doing I/O. It defines
//! the `Transport` collaborator contract (§6), an in-process channel-backed
//! implementation of it for tests and local runs, wire-shape parsing for the
//! three inbound message kinds, and the `EventDispatcher` that binds streams
//! to the strategy engine's entry points and routes outbound commands.

pub mod dispatcher;
pub mod errors;
pub mod inbound;
pub mod transport;

pub use dispatcher::{EventDispatcher, VenueTransport};
pub use errors::DispatchError;
pub use transport::{channel_sink, channel_source, ChannelSink, ChannelSource, InboundStream, OutboundSink, TransportError};
