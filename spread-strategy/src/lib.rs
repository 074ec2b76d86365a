//! The spread-arbitrage decision engine
//!
//! Builds on `spread_core`'s pure types to provide the one piece of this
//! workspace that carries mutable state: [`StrategyEngine`].

pub mod engine;

pub use engine::StrategyEngine;
