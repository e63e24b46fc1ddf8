//! Typed REST response schemas.
//!
//! Every response body parses into one of these structs at the network
//! boundary, or the call fails with `ClientError::Schema`. Decimal fields
//! arrive as strings and go through `rust_decimal`'s serde helpers; a
//! malformed number is a parse failure, never a silently absent field.

use rust_decimal::Decimal;
use serde::Deserialize;

use obi_core::{MarketId, OrderSide, OrderStatus, OrderType, Position, Price, Size, TrackedOrder};

/// One resting level of an order book.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BookLevel {
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub size: Decimal,
}

/// Order book snapshot for one market, best price first on both sides.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderBookDetails {
    pub market: MarketId,
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
}

impl OrderBookDetails {
    /// Best bid price, if the side has depth.
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.first().map(|l| Price::new(l.price))
    }

    /// Best ask price, if the side has depth.
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.first().map(|l| Price::new(l.price))
    }
}

/// Wrapper for the all-books endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderBooksResponse {
    pub order_books: Vec<OrderBookDetails>,
}

/// Exchange-wide statistics.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeStats {
    pub total_trades: u64,
    pub daily_trades_count: u64,
    #[serde(with = "rust_decimal::serde::str")]
    pub daily_usd_volume: Decimal,
}

/// One executed trade.
#[derive(Debug, Clone, Deserialize)]
pub struct Trade {
    pub market: MarketId,
    pub side: OrderSide,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub size: Decimal,
    pub timestamp: u64,
}

/// Wrapper for the recent-trades endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RecentTradesResponse {
    pub trades: Vec<Trade>,
}

/// An exchange-reported position.
#[derive(Debug, Clone, Deserialize)]
pub struct PositionEntry {
    pub market: MarketId,
    pub side: OrderSide,
    #[serde(with = "rust_decimal::serde::str")]
    pub size: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub entry_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub unrealized_pnl: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub margin: Decimal,
}

impl PositionEntry {
    /// Convert into the ledger's position type.
    pub fn into_position(self) -> Position {
        Position {
            market: self.market,
            side: self.side,
            size: Size::new(self.size),
            entry_price: Price::new(self.entry_price),
            unrealized_pnl: self.unrealized_pnl,
            margin: self.margin,
        }
    }
}

/// An exchange-reported open order.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderEntry {
    pub client_order_index: u64,
    pub market: MarketId,
    pub side: OrderSide,
    pub order_type: OrderType,
    #[serde(with = "rust_decimal::serde::str")]
    pub size: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    pub status: OrderStatus,
}

impl OrderEntry {
    /// Convert into the ledger's tracked-order type.
    pub fn into_tracked(self) -> TrackedOrder {
        TrackedOrder {
            client_order_index: self.client_order_index,
            market: self.market,
            side: self.side,
            order_type: self.order_type,
            size: Size::new(self.size),
            price: Price::new(self.price),
            status: self.status,
        }
    }
}

/// Account snapshot: balance, margin, open positions and orders.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountResponse {
    pub account_index: u32,
    pub address: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub balance: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub available_margin: Decimal,
    #[serde(default)]
    pub positions: Vec<PositionEntry>,
    #[serde(default)]
    pub orders: Vec<OrderEntry>,
}

/// Response of the authenticated next-nonce endpoint.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct NextNonceResponse {
    pub nonce: u64,
}

/// Receipt returned for an accepted transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct TxReceipt {
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub tx_hash: Option<String>,
}

/// Error body shape the exchange uses for rejected transactions.
#[derive(Debug, Clone, Deserialize)]
pub struct RejectionBody {
    pub code: u32,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_order_book_parses_string_decimals() {
        let json = r#"{
            "market": "ETH-PERP",
            "bids": [{"price": "2451.50", "size": "12.5"}],
            "asks": [{"price": "2451.90", "size": "3.0"}]
        }"#;
        let book: OrderBookDetails = serde_json::from_str(json).unwrap();
        assert_eq!(book.bids[0].price, dec!(2451.50));
        assert_eq!(book.best_bid().unwrap().inner(), dec!(2451.50));
    }

    #[test]
    fn test_order_book_rejects_malformed_price() {
        let json = r#"{
            "market": "ETH-PERP",
            "bids": [{"price": "not-a-number", "size": "1"}],
            "asks": []
        }"#;
        let parsed: Result<OrderBookDetails, _> = serde_json::from_str(json);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_account_response_defaults_empty_collections() {
        let json = r#"{
            "account_index": 4,
            "address": "0x00000000000000000000000000000000000000aa",
            "balance": "10000",
            "available_margin": "9500.25"
        }"#;
        let account: AccountResponse = serde_json::from_str(json).unwrap();
        assert_eq!(account.balance, dec!(10000));
        assert!(account.positions.is_empty());
        assert!(account.orders.is_empty());
    }

    #[test]
    fn test_position_entry_conversion() {
        let json = r#"{
            "market": "BTC-PERP",
            "side": "sell",
            "size": "0.25",
            "entry_price": "64000.5",
            "unrealized_pnl": "-12.75",
            "margin": "1600.01"
        }"#;
        let entry: PositionEntry = serde_json::from_str(json).unwrap();
        let position = entry.into_position();
        assert_eq!(position.market.as_str(), "BTC-PERP");
        assert_eq!(position.size.inner(), dec!(0.25));
        assert_eq!(position.unrealized_pnl, dec!(-12.75));
    }

    #[test]
    fn test_trades_and_stats_parse() {
        let trades: RecentTradesResponse = serde_json::from_str(
            r#"{"trades": [
                {"market": "ETH-PERP", "side": "buy", "price": "2451.5",
                 "size": "0.4", "timestamp": 1754500000123}
            ]}"#,
        )
        .unwrap();
        assert_eq!(trades.trades.len(), 1);
        assert_eq!(trades.trades[0].price, dec!(2451.5));

        let stats: ExchangeStats = serde_json::from_str(
            r#"{"total_trades": 120000, "daily_trades_count": 4500,
                "daily_usd_volume": "18250000.75"}"#,
        )
        .unwrap();
        assert_eq!(stats.daily_usd_volume, dec!(18250000.75));
    }

    #[test]
    fn test_rejection_body_parse() {
        let body: RejectionBody =
            serde_json::from_str(r#"{"code": 21104, "message": "invalid nonce"}"#).unwrap();
        assert_eq!(body.code, 21104);
    }
}
