//! Error taxonomy for the spread-arbitrage core
//!
//! Only two classes of error are ever propagated as `Result::Err`: boundary
//! conversion failures ([`ConversionError`]) and startup configuration
//! failures ([`ConfigError`]). Everything the engine itself encounters at
//! steady state — unknown venues, duplicate orders, unknown client ids,
//! malformed inbound payloads — is a policy or protocol-shape condition: it
//! is logged and produces an empty command batch, never an `Err`. No
//! exception escapes the engine boundary.

use thiserror::Error;

/// Failures converting a wire float to a [`rust_decimal::Decimal`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConversionError {
    #[error("value {value} is out of range for Decimal")]
    OutOfRange { value: f64 },

    #[error("cannot convert NaN to Decimal")]
    NotANumber,

    #[error("cannot convert {sign} infinity to Decimal", sign = if *positive { "positive" } else { "negative" })]
    Infinite { positive: bool },
}

/// Fatal configuration bootstrap failures. A process exits with code 1 when
/// one of these surfaces; the engine itself never produces one.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch config from {url}: {source}")]
    FetchApi {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("malformed config JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
