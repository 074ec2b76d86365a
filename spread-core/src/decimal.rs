//! Float-to-decimal boundary conversions
//!
//! Everything inside the engine is `rust_decimal::Decimal`. Exchanges and
//! JSON wire payloads speak `f64`. A binary float assigned straight into a
//! `Decimal` carries its base-2 rounding error forward (`0.1_f64` is not
//! `0.1` exactly); we avoid that by round-tripping through the float's
//! canonical textual form instead, which is what `Decimal::from_str` expects.

use crate::errors::ConversionError;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Convert a wire `f64` to a `Decimal` via its shortest round-trip text form.
///
/// # Errors
/// Returns [`ConversionError::NotANumber`] for NaN, [`ConversionError::Infinite`]
/// for +/-infinity, and [`ConversionError::OutOfRange`] if the textual form
/// overflows `Decimal`'s 96-bit mantissa.
pub fn float_to_decimal(value: f64) -> Result<Decimal, ConversionError> {
    if value.is_nan() {
        return Err(ConversionError::NotANumber);
    }
    if value.is_infinite() {
        return Err(ConversionError::Infinite {
            positive: value > 0.0,
        });
    }
    let text = format!("{value}");
    Decimal::from_str(&text).map_err(|_| ConversionError::OutOfRange { value })
}

/// Convert a `Decimal` back to `f64`, for outbound payloads that the peer
/// expects as a JSON number rather than a string.
///
/// Not guaranteed to round-trip exactly through [`float_to_decimal`] — a
/// 64-bit float cannot represent every value a 96-bit `Decimal` mantissa can.
pub fn decimal_to_float(value: Decimal) -> f64 {
    use rust_decimal::prelude::ToPrimitive;
    value.to_f64().unwrap_or(0.0)
}

/// Convert a whole percent (e.g. `5.0` meaning 5%) to the `1 + p/100` ratio
/// form used throughout `StrategyConfig` for profit and depth thresholds.
pub fn percent_to_ratio(percent: Decimal) -> Decimal {
    Decimal::ONE + percent_to_fraction(percent)
}

/// Convert a whole percent to the `p/100` fraction form used for
/// `balance_part_to_use` and `volatility_compensation`.
pub fn percent_to_fraction(percent: Decimal) -> Decimal {
    percent / Decimal::from(100)
}
