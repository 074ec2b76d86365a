//! Runtime configuration: bootstrap, schema, and validation
//!
//! Parameters are read at process start from JSON, either a local file or
//! an HTTP endpoint, selected by a small bootstrap record. There is no
//! hot/cold-path split here — nothing in this engine runs often enough per
//! order to justify const-propagated limits.

use crate::decimal::{percent_to_fraction, percent_to_ratio};
use crate::errors::ConfigError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// How to obtain the JSON config document at startup. Itself supplied on
/// the command line or via a well-known bootstrap file.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Bootstrap {
    File { path: String },
    Api { url: String },
}

/// One addressable channel on the shared-memory transport: an opaque
/// channel identifier plus a stream id, exactly as the upstream peer hands
/// them out. Neither field is interpreted here — `spread-dispatch` is the
/// only crate that resolves these into live subscribers/publishers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AeronChannel {
    pub channel: String,
    pub stream_id: u32,
}

/// The three inbound streams a venue's gate publishes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AeronSubscribers {
    pub orderbooks: AeronChannel,
    pub balances: AeronChannel,
    pub orders: AeronChannel,
}

/// The two outbound streams a venue's gate subscribes to: commands
/// (`gate`) and metrics/log records (`logs`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AeronPublishers {
    pub gate: AeronChannel,
    pub logs: AeronChannel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AeronConfig {
    pub subscribers: AeronSubscribers,
    pub publishers: AeronPublishers,
}

/// Per-venue transport addressing: a display name for the strategy engine
/// plus the aeron channel/stream wiring the dispatcher resolves into live
/// subscribers and publishers. The core crate never touches `aeron` itself
/// — it is opaque configuration forwarded to `spread-dispatch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueConfig {
    pub exchange: ExchangeName,
    pub aeron: AeronConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeName {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    pub exchange_1: VenueConfig,
    pub exchange_2: VenueConfig,
}

impl VenueConfig {
    pub fn name(&self) -> &str {
        &self.exchange.name
    }
}

/// Strategy thresholds, stored as the whole-percent values an operator
/// writes in JSON; converted to the ratio/fraction forms the strategy
/// engine actually computes with via the accessor methods below.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Minimum required profit, as a whole percent (e.g. `0.5` means 0.5%).
    pub min_profit: Decimal,
    /// Fraction of available balance to commit to a single order, as a
    /// whole percent (e.g. `50` means use half the free balance).
    pub balance_part_to_use: Decimal,
    /// How far the current best price may drift from an open order's limit
    /// price, as a whole percent, before the order is considered stale.
    pub depth_limit: Decimal,
    /// Extra slack folded into the profit requirement to compensate for
    /// quote-to-fill latency, as a whole percent.
    pub volatility_compensation: Decimal,
    /// Minimum order notional in quote asset; orders sized below this are
    /// skipped rather than sent.
    pub min_notional: Decimal,
}

impl StrategyConfig {
    pub fn min_profit_ratio(&self) -> Decimal {
        percent_to_ratio(self.min_profit)
    }

    pub fn balance_fraction(&self) -> Decimal {
        percent_to_fraction(self.balance_part_to_use)
    }

    pub fn depth_limit_ratio(&self) -> Decimal {
        percent_to_ratio(self.depth_limit)
    }

    pub fn volatility_compensation_fraction(&self) -> Decimal {
        percent_to_fraction(self.volatility_compensation)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub instance: String,
    pub algo: String,
    /// Maps a logical asset pair name (e.g. `"BTC/USDT"`) used in commands
    /// and orders to the base/quote asset codes used in balance lookups.
    pub assets: HashMap<String, AssetPair>,
    pub core: CoreConfig,
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub log_level: Option<String>,
    #[serde(default)]
    pub json_logs: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetPair {
    pub base: String,
    pub quote: String,
}

impl Config {
    /// Resolve a [`Bootstrap`] record into a loaded, validated [`Config`].
    /// Any failure here is fatal to the process — the caller is expected to
    /// log and exit with code 1.
    pub fn load(bootstrap: &Bootstrap) -> Result<Self, ConfigError> {
        let raw = match bootstrap {
            Bootstrap::File { path } => Self::read_file(path)?,
            Bootstrap::Api { url } => Self::fetch_api(url)?,
        };
        let config: Config = serde_json::from_str(&raw)?;
        config.validate().map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(config)
    }

    fn read_file(path: &str) -> Result<String, ConfigError> {
        std::fs::read_to_string(Path::new(path)).map_err(|source| ConfigError::ReadFile {
            path: path.to_string(),
            source,
        })
    }

    fn fetch_api(url: &str) -> Result<String, ConfigError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|source| ConfigError::FetchApi {
                url: url.to_string(),
                source,
            })?;
        client
            .get(url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.text())
            .map_err(|source| ConfigError::FetchApi {
                url: url.to_string(),
                source,
            })
    }

    /// Validate cross-field constraints the JSON schema alone cannot express.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.instance.trim().is_empty() {
            anyhow::bail!("instance must not be empty");
        }
        if self.algo.trim().is_empty() {
            anyhow::bail!("algo must not be empty");
        }
        if self.assets.is_empty() {
            anyhow::bail!("assets map must name at least one symbol");
        }
        if self.core.exchange_1.name().is_empty() || self.core.exchange_2.name().is_empty() {
            anyhow::bail!("exchange_1 and exchange_2 must both have a non-empty name");
        }
        if self.core.exchange_1.name() == self.core.exchange_2.name() {
            anyhow::bail!(
                "exchange_1 and exchange_2 must be distinct venues, both named '{}'",
                self.core.exchange_1.name()
            );
        }

        let s = &self.strategy;
        if s.min_profit.is_sign_negative() {
            anyhow::bail!("strategy.min_profit must not be negative");
        }
        if s.balance_part_to_use <= Decimal::ZERO || s.balance_part_to_use > Decimal::from(100) {
            anyhow::bail!("strategy.balance_part_to_use must be in (0, 100]");
        }
        if s.depth_limit <= Decimal::ZERO {
            anyhow::bail!("strategy.depth_limit must be positive");
        }
        if s.volatility_compensation.is_sign_negative() {
            anyhow::bail!("strategy.volatility_compensation must not be negative");
        }
        if s.min_notional.is_sign_negative() {
            anyhow::bail!("strategy.min_notional must not be negative");
        }

        if let Some(level) = &self.log_level {
            let valid = ["trace", "debug", "info", "warn", "error"];
            if !valid.contains(&level.as_str()) {
                anyhow::bail!("invalid log_level '{level}', must be one of {valid:?}");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    fn aeron_channel(channel: &str, stream_id: u32) -> AeronChannel {
        AeronChannel {
            channel: channel.to_string(),
            stream_id,
        }
    }

    fn venue_config(name: &str) -> VenueConfig {
        VenueConfig {
            exchange: ExchangeName { name: name.to_string() },
            aeron: AeronConfig {
                subscribers: AeronSubscribers {
                    orderbooks: aeron_channel(&format!("aeron:udp?endpoint=localhost:{}", 20100), 1),
                    balances: aeron_channel(&format!("aeron:udp?endpoint=localhost:{}", 20101), 2),
                    orders: aeron_channel(&format!("aeron:udp?endpoint=localhost:{}", 20102), 3),
                },
                publishers: AeronPublishers {
                    gate: aeron_channel(&format!("aeron:udp?endpoint=localhost:{}", 20200), 10),
                    logs: aeron_channel(&format!("aeron:udp?endpoint=localhost:{}", 20201), 11),
                },
            },
        }
    }

    fn sample_config() -> Config {
        let mut assets = HashMap::new();
        assets.insert(
            "BTC/USDT".to_string(),
            AssetPair {
                base: "BTC".to_string(),
                quote: "USDT".to_string(),
            },
        );
        Config {
            instance: "inst-a".to_string(),
            algo: "spread-v1".to_string(),
            assets,
            core: CoreConfig {
                exchange_1: venue_config("venue-a"),
                exchange_2: venue_config("venue-b"),
            },
            strategy: StrategyConfig {
                min_profit: dec!(0.5),
                balance_part_to_use: dec!(50),
                depth_limit: dec!(10),
                volatility_compensation: dec!(0.1),
                min_notional: dec!(10),
            },
            log_level: Some("info".to_string()),
            json_logs: false,
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(sample_config().validate().is_ok());
    }

    #[test]
    fn rejects_identical_venues() {
        let mut config = sample_config();
        config.core.exchange_2.exchange.name = config.core.exchange_1.name().to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_balance_fraction_out_of_range() {
        let mut config = sample_config();
        config.strategy.balance_part_to_use = dec!(150);
        assert!(config.validate().is_err());

        config.strategy.balance_part_to_use = dec!(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn strategy_ratio_conversions() {
        let s = sample_config().strategy;
        assert_eq!(s.min_profit_ratio(), dec!(1.005));
        assert_eq!(s.balance_fraction(), dec!(0.5));
    }

    #[test]
    fn load_from_file_round_trips() {
        let config = sample_config();
        let json = serde_json::to_string(&config).unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let bootstrap = Bootstrap::File {
            path: file.path().to_string_lossy().to_string(),
        };
        let loaded = Config::load(&bootstrap).unwrap();
        assert_eq!(loaded.instance, config.instance);
    }

    #[test]
    fn missing_file_is_fatal_read_error() {
        let bootstrap = Bootstrap::File {
            path: "/nonexistent/path/config.json".to_string(),
        };
        assert!(matches!(Config::load(&bootstrap), Err(ConfigError::ReadFile { .. })));
    }
}
