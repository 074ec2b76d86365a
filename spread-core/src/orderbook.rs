//! Order-book representation and the price-prediction walker
//!
//! Two pure, total, side-effect-free functions compute the volume-weighted
//! average fill price a market order would get against a snapshot of the
//! book. Both the strategy engine's sizing and its actuality checks are
//! built on top of these.

use rust_decimal::Decimal;

/// A single price level: `(price, amount)`, amount denominated in base asset.
pub type Level = (Decimal, Decimal);

/// The latest order book for one symbol on one venue.
///
/// `bids` is sorted descending by price, `asks` ascending. Levels with zero
/// amount are never stored. The constructor does not enforce
/// `bids[0].price < asks[0].price` — that invariant is the producer's
/// responsibility; the walker functions below are correct regardless.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBook {
    pub symbol: String,
    pub bids: Vec<Level>,
    pub asks: Vec<Level>,
    /// Microsecond UNIX timestamp of the snapshot.
    pub timestamp: i64,
}

impl OrderBook {
    pub fn new(symbol: impl Into<String>, bids: Vec<Level>, asks: Vec<Level>, timestamp: i64) -> Self {
        Self {
            symbol: symbol.into(),
            bids: bids.into_iter().filter(|(_, a)| !a.is_zero()).collect(),
            asks: asks.into_iter().filter(|(_, a)| !a.is_zero()).collect(),
            timestamp,
        }
    }

    pub fn best_bid(&self) -> Option<Level> {
        self.bids.first().copied()
    }

    pub fn best_ask(&self) -> Option<Level> {
        self.asks.first().copied()
    }
}

/// Walk `bids` best-to-worst consuming `base_amount` units of base asset,
/// returning the volume-weighted average fill price a market sell of that
/// size would realize.
///
/// If the book's total bid depth is less than `base_amount`, the book is
/// walked to exhaustion and the price reflects only what liquidity was
/// available — callers are expected to size against live balances, so this
/// is unreachable in practice. Returns `Decimal::ZERO` if `base_amount` is
/// zero or the book side is empty, never dividing by zero.
pub fn predict_price_of_market_sell(base_amount: Decimal, orderbook: &OrderBook) -> Decimal {
    let mut remaining = base_amount;
    let mut quote_filled = Decimal::ZERO;
    let mut base_filled = Decimal::ZERO;

    for &(price, size) in &orderbook.bids {
        if remaining.is_zero() || remaining.is_sign_negative() {
            break;
        }
        let take = remaining.min(size);
        quote_filled += price * take;
        base_filled += take;
        remaining -= take;
    }

    if base_filled.is_zero() {
        Decimal::ZERO
    } else {
        quote_filled / base_filled
    }
}

/// Walk `asks` best-to-worst consuming `quote_amount` units of quote asset,
/// returning the volume-weighted average fill price a market buy funded by
/// that much quote would realize.
///
/// Symmetric to [`predict_price_of_market_sell`] but the budget is
/// denominated in quote, since a buy is paid for in quote: each level's
/// notional cost is `price * size`, and we consume `remaining_quote / price`
/// base when a level is only partially taken.
pub fn predict_price_of_market_buy(quote_amount: Decimal, orderbook: &OrderBook) -> Decimal {
    let mut remaining = quote_amount;
    let mut quote_filled = Decimal::ZERO;
    let mut base_filled = Decimal::ZERO;

    for &(price, size) in &orderbook.asks {
        if remaining.is_zero() || remaining.is_sign_negative() || price.is_zero() {
            break;
        }
        let level_notional = price * size;
        if remaining <= level_notional {
            base_filled += remaining / price;
            quote_filled += remaining;
            remaining = Decimal::ZERO;
        } else {
            base_filled += size;
            quote_filled += level_notional;
            remaining -= level_notional;
        }
    }

    if base_filled.is_zero() {
        Decimal::ZERO
    } else {
        quote_filled / base_filled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn book() -> OrderBook {
        OrderBook::new(
            "BTC/USDT",
            vec![(dec!(18400), dec!(1)), (dec!(18300), dec!(2)), (dec!(18200), dec!(5))],
            vec![(dec!(18500), dec!(1)), (dec!(18600), dec!(2)), (dec!(18700), dec!(5))],
            1_000_000,
        )
    }

    #[test]
    fn sell_within_top_level() {
        let price = predict_price_of_market_sell(dec!(0.5), &book());
        assert_eq!(price, dec!(18400));
    }

    #[test]
    fn sell_crosses_levels_vwap() {
        // 1 @ 18400 + 1 @ 18300 => (18400 + 18300) / 2
        let price = predict_price_of_market_sell(dec!(2), &book());
        assert_eq!(price, (dec!(18400) + dec!(18300)) / dec!(2));
    }

    #[test]
    fn sell_exhausts_book_without_panicking() {
        let price = predict_price_of_market_sell(dec!(100), &book());
        // total bid depth is 8 base; vwap over everything available
        let expected = (dec!(18400) * dec!(1) + dec!(18300) * dec!(2) + dec!(18200) * dec!(5)) / dec!(8);
        assert_eq!(price, expected);
    }

    #[test]
    fn buy_within_top_level() {
        // 9250 quote at 18500 per unit => 0.5 base, all within top level
        let price = predict_price_of_market_buy(dec!(9250), &book());
        assert_eq!(price, dec!(18500));
    }

    #[test]
    fn buy_crosses_levels() {
        // consume the whole top level (18500 notional) plus half of the next
        let quote = dec!(18500) + dec!(9300);
        let price = predict_price_of_market_buy(quote, &book());
        let base_filled = dec!(1) + dec!(9300) / dec!(18600);
        assert_eq!(price, quote / base_filled);
    }

    #[test]
    fn empty_book_returns_zero_not_panic() {
        let empty = OrderBook::new("BTC/USDT", vec![], vec![], 0);
        assert_eq!(predict_price_of_market_sell(dec!(1), &empty), Decimal::ZERO);
        assert_eq!(predict_price_of_market_buy(dec!(1), &empty), Decimal::ZERO);
    }

    #[test]
    fn zero_amount_returns_zero() {
        assert_eq!(predict_price_of_market_sell(dec!(0), &book()), Decimal::ZERO);
        assert_eq!(predict_price_of_market_buy(dec!(0), &book()), Decimal::ZERO);
    }

    proptest::proptest! {
        #[test]
        fn sell_price_monotonic_in_amount(a_cents in 1i64..800, b_cents in 1i64..800) {
            let book = book();
            let a = Decimal::new(a_cents, 2);
            let b = Decimal::new(b_cents, 2);
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let p_lo = predict_price_of_market_sell(lo, &book);
            let p_hi = predict_price_of_market_sell(hi, &book);
            prop_assert!(p_lo <= p_hi);
        }

        #[test]
        fn buy_price_monotonic_in_quote(a_cents in 1i64..3_700_00, b_cents in 1i64..3_700_00) {
            let book = book();
            let a = Decimal::new(a_cents, 2);
            let b = Decimal::new(b_cents, 2);
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let p_lo = predict_price_of_market_buy(lo, &book);
            let p_hi = predict_price_of_market_buy(hi, &book);
            prop_assert!(p_lo <= p_hi);
        }
    }
}
