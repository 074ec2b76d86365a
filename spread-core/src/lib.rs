//! Shared types for the two-venue spread-arbitrage engine
//!
//! This crate holds everything that is pure data or pure computation:
//! decimal boundary conversions, the order-book walker, the per-venue
//! snapshot model, the outbound command envelope, configuration, and the
//! logging bootstrap. `spread-strategy` builds the actual decision engine
//! on top of these types; this crate contains no engine state and no I/O
//! beyond the one-shot config fetch in [`config::Config::load`].

pub mod clock;
pub mod command;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod logger;
pub mod orderbook;
pub mod snapshot;

pub use clock::now_micros;
pub use command::{CancelOrderPayload, Command, CommandIdentity, CreateOrderPayload};
pub use config::{Bootstrap, Config, StrategyConfig};
pub use errors::{ConfigError, ConversionError};
pub use orderbook::{predict_price_of_market_buy, predict_price_of_market_sell, Level, OrderBook};
pub use snapshot::{Balance, DerivedMetrics, ExchangeSnapshot, Order, OrderStatus, OrderType, Side};

/// Convenience re-exports for downstream crates.
pub mod prelude {
    pub use crate::clock::now_micros;
    pub use crate::command::{CancelOrderPayload, Command, CommandIdentity, CreateOrderPayload};
    pub use crate::config::{
        AeronChannel, AeronConfig, AeronPublishers, AeronSubscribers, AssetPair, Bootstrap, Config, CoreConfig,
        ExchangeName, StrategyConfig, VenueConfig,
    };
    pub use crate::decimal::{decimal_to_float, float_to_decimal, percent_to_fraction, percent_to_ratio};
    pub use crate::errors::{ConfigError, ConversionError};
    pub use crate::orderbook::{predict_price_of_market_buy, predict_price_of_market_sell, Level, OrderBook};
    pub use crate::snapshot::{Balance, DerivedMetrics, ExchangeSnapshot, Order, OrderStatus, OrderType, Side};
}
