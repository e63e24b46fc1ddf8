//! Order-book imbalance signal.
//!
//! The signal is deliberately coarse: normalized bid/ask volume difference
//! with a ±0.2 band around neutral. Everything downstream (sizing, order
//! placement) keys off the three-way classification, not the raw ratio.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use obi_client::OrderBookDetails;
use obi_core::{MarketId, Price};

/// Imbalance magnitude beyond which the book is considered directional.
pub const IMBALANCE_THRESHOLD: f64 = 0.2;

/// Directional signal derived from order-book shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Bullish,
    Bearish,
    Neutral,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bullish => write!(f, "bullish"),
            Self::Bearish => write!(f, "bearish"),
            Self::Neutral => write!(f, "neutral"),
        }
    }
}

/// Normalized bid/ask volume difference, clamped to [-1, 1].
///
/// An empty book (zero total depth) is defined as perfectly balanced.
pub fn imbalance(bid_volume: Decimal, ask_volume: Decimal) -> f64 {
    let depth = bid_volume + ask_volume;
    if depth.is_zero() {
        return 0.0;
    }
    let ratio = (bid_volume - ask_volume) / depth;
    ratio.to_f64().unwrap_or(0.0).clamp(-1.0, 1.0)
}

/// Classify an imbalance value into a signal.
pub fn classify(imbalance: f64) -> Signal {
    if imbalance > IMBALANCE_THRESHOLD {
        Signal::Bullish
    } else if imbalance < -IMBALANCE_THRESHOLD {
        Signal::Bearish
    } else {
        Signal::Neutral
    }
}

/// Per-cycle view of one market's book. Derived, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct MarketAnalysis {
    pub market: MarketId,
    pub best_bid: Price,
    pub best_ask: Price,
    pub spread: Price,
    pub mid_price: Price,
    pub bid_volume: Decimal,
    pub ask_volume: Decimal,
    pub imbalance: f64,
    pub signal: Signal,
    pub analyzed_at: DateTime<Utc>,
}

/// Analyze a book snapshot.
///
/// A one-sided or empty book yields zero best price / spread / mid on the
/// missing side; the signal still reflects resting volume, and order
/// placement only ever references the side that has depth.
pub fn analyze(book: &OrderBookDetails) -> MarketAnalysis {
    let best_bid = book.best_bid().unwrap_or(Price::ZERO);
    let best_ask = book.best_ask().unwrap_or(Price::ZERO);

    let two_sided = best_bid.is_positive() && best_ask.is_positive();
    let spread = if two_sided {
        best_ask - best_bid
    } else {
        Price::ZERO
    };
    let mid_price = if two_sided {
        best_bid.midpoint(best_ask)
    } else {
        Price::ZERO
    };

    let bid_volume: Decimal = book.bids.iter().map(|l| l.size).sum();
    let ask_volume: Decimal = book.asks.iter().map(|l| l.size).sum();

    let imbalance = imbalance(bid_volume, ask_volume);

    MarketAnalysis {
        market: book.market.clone(),
        best_bid,
        best_ask,
        spread,
        mid_price,
        bid_volume,
        ask_volume,
        imbalance,
        signal: classify(imbalance),
        analyzed_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn book(json: &str) -> OrderBookDetails {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_imbalance_bullish_scenario() {
        // bidVolume=120, askVolume=60 -> imbalance = 60/180 = 0.333...
        let value = imbalance(dec!(120), dec!(60));
        assert!((value - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(classify(value), Signal::Bullish);
    }

    #[test]
    fn test_imbalance_zero_depth_is_neutral() {
        let value = imbalance(dec!(0), dec!(0));
        assert_eq!(value, 0.0);
        assert_eq!(classify(value), Signal::Neutral);
    }

    #[test]
    fn test_imbalance_bounds() {
        assert_eq!(imbalance(dec!(100), dec!(0)), 1.0);
        assert_eq!(imbalance(dec!(0), dec!(100)), -1.0);

        let value = imbalance(dec!(55), dec!(45));
        assert!((-1.0..=1.0).contains(&value));
    }

    #[test]
    fn test_threshold_is_strict() {
        // Exactly at the band edge stays neutral
        assert_eq!(classify(0.2), Signal::Neutral);
        assert_eq!(classify(-0.2), Signal::Neutral);
        assert_eq!(classify(0.2000001), Signal::Bullish);
        assert_eq!(classify(-0.2000001), Signal::Bearish);
    }

    #[test]
    fn test_analyze_full_book() {
        let book = book(
            r#"{
                "market": "ETH-PERP",
                "bids": [
                    {"price": "2450.00", "size": "80"},
                    {"price": "2449.50", "size": "40"}
                ],
                "asks": [
                    {"price": "2450.50", "size": "60"}
                ]
            }"#,
        );
        let analysis = analyze(&book);

        assert_eq!(analysis.best_bid.inner(), dec!(2450.00));
        assert_eq!(analysis.best_ask.inner(), dec!(2450.50));
        assert_eq!(analysis.spread.inner(), dec!(0.50));
        assert_eq!(analysis.mid_price.inner(), dec!(2450.25));
        assert_eq!(analysis.bid_volume, dec!(120));
        assert_eq!(analysis.ask_volume, dec!(60));
        assert_eq!(analysis.signal, Signal::Bullish);
    }

    #[test]
    fn test_analyze_one_sided_book() {
        let book = book(
            r#"{
                "market": "ETH-PERP",
                "bids": [{"price": "2450.00", "size": "10"}],
                "asks": []
            }"#,
        );
        let analysis = analyze(&book);

        assert_eq!(analysis.best_ask, Price::ZERO);
        assert_eq!(analysis.spread, Price::ZERO);
        assert_eq!(analysis.mid_price, Price::ZERO);
        assert_eq!(analysis.imbalance, 1.0);
        assert_eq!(analysis.signal, Signal::Bullish);
    }
}
