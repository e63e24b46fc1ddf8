//! Order and position types.
//!
//! Provides the trading enums used on the wire plus the locally tracked
//! order/position shapes the ledger mirrors from the exchange.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::decimal::{Price, Size};
use crate::market::MarketId;

/// Order side: buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Returns the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    /// Limit order with an explicit price.
    Limit,
    /// Market order; the price field is ignored on the wire.
    Market,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limit => write!(f, "limit"),
            Self::Market => write!(f, "market"),
        }
    }
}

/// Time-in-force for orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Good-til-cancelled. Default for resting limit orders.
    #[default]
    #[serde(rename = "gtc")]
    GoodTilCancelled,
    /// Immediate-or-cancel.
    #[serde(rename = "ioc")]
    ImmediateOrCancel,
    /// Post-only; rejected instead of crossing the book.
    #[serde(rename = "post_only")]
    PostOnly,
}

impl fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GoodTilCancelled => write!(f, "gtc"),
            Self::ImmediateOrCancel => write!(f, "ioc"),
            Self::PostOnly => write!(f, "post_only"),
        }
    }
}

/// Status of a locally tracked order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Submitted locally, not yet confirmed by a sync.
    #[default]
    Pending,
    /// Confirmed open on the exchange.
    Open,
    /// Completely filled.
    Filled,
    /// Cancelled.
    Canceled,
}

impl OrderStatus {
    /// Returns true if the order can still trade.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Open)
    }
}

/// Local shadow of an exchange order.
///
/// Inserted optimistically as `Pending` at submission time; overwritten or
/// dropped wholesale on the next account sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedOrder {
    /// Client-assigned order index, unique per session.
    pub client_order_index: u64,
    /// Target market.
    pub market: MarketId,
    /// Order side.
    pub side: OrderSide,
    /// Order type.
    pub order_type: OrderType,
    /// Order size.
    pub size: Size,
    /// Limit price (zero for market orders).
    pub price: Price,
    /// Current status.
    pub status: OrderStatus,
}

/// An open position as reported by the exchange.
///
/// Remote source of truth; replaced wholesale each sync, never patched
/// field-by-field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Market the position is in.
    pub market: MarketId,
    /// Long (buy) or short (sell).
    pub side: OrderSide,
    /// Position size in base units.
    pub size: Size,
    /// Average entry price.
    pub entry_price: Price,
    /// Unrealized profit and loss.
    pub unrealized_pnl: rust_decimal::Decimal,
    /// Margin allocated to the position.
    pub margin: rust_decimal::Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_side_opposite() {
        assert_eq!(OrderSide::Buy.opposite(), OrderSide::Sell);
        assert_eq!(OrderSide::Sell.opposite(), OrderSide::Buy);
    }

    #[test]
    fn test_order_status_active() {
        assert!(OrderStatus::Pending.is_active());
        assert!(OrderStatus::Open.is_active());
        assert!(!OrderStatus::Filled.is_active());
        assert!(!OrderStatus::Canceled.is_active());
    }

    #[test]
    fn test_time_in_force_wire_names() {
        assert_eq!(
            serde_json::to_string(&TimeInForce::GoodTilCancelled).unwrap(),
            r#""gtc""#
        );
        assert_eq!(
            serde_json::to_string(&TimeInForce::ImmediateOrCancel).unwrap(),
            r#""ioc""#
        );
    }
}
