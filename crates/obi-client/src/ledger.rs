//! Local mirror of exchange-reported positions and orders.
//!
//! There is no event stream, only polling, so the ledger is rebuilt
//! wholesale from each successful sync rather than patched incrementally.
//! Between syncs it may hold optimistic entries for submissions that the
//! exchange has not confirmed yet; the next sync overwrites or drops them.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::schema::AccountResponse;
use obi_core::{MarketId, Position, TrackedOrder};

/// Snapshot of the ledger handed to callers after a sync.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerView {
    pub positions: Vec<Position>,
    pub orders: Vec<TrackedOrder>,
    pub account_balance: Decimal,
    pub available_margin: Decimal,
}

/// The strategy's authoritative local view of exchange state.
#[derive(Debug, Default)]
pub struct StateLedger {
    positions: HashMap<MarketId, Position>,
    orders: HashMap<u64, TrackedOrder>,
    balance: Decimal,
    available_margin: Decimal,
}

impl StateLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the full position and order maps from an account snapshot.
    ///
    /// Entries absent from the response are dropped entirely; nothing is
    /// diffed field-by-field.
    pub fn apply_snapshot(&mut self, snapshot: AccountResponse) -> LedgerView {
        self.positions = snapshot
            .positions
            .into_iter()
            .map(|entry| {
                let position = entry.into_position();
                (position.market.clone(), position)
            })
            .collect();

        self.orders = snapshot
            .orders
            .into_iter()
            .map(|entry| {
                let order = entry.into_tracked();
                (order.client_order_index, order)
            })
            .collect();

        self.balance = snapshot.balance;
        self.available_margin = snapshot.available_margin;

        self.view()
    }

    /// Optimistic insert for an order we just submitted. Superseded by the
    /// next sync.
    pub fn record_submitted_order(&mut self, order: TrackedOrder) {
        self.orders.insert(order.client_order_index, order);
    }

    /// Local removal after a locally confirmed close, pending the next
    /// sync's confirmation.
    pub fn remove_position(&mut self, market: &MarketId) -> Option<Position> {
        self.positions.remove(market)
    }

    /// Local removal after a locally confirmed cancel, pending the next
    /// sync's confirmation.
    pub fn remove_order(&mut self, client_order_index: u64) -> Option<TrackedOrder> {
        self.orders.remove(&client_order_index)
    }

    pub fn position(&self, market: &MarketId) -> Option<&Position> {
        self.positions.get(market)
    }

    pub fn has_position(&self, market: &MarketId) -> bool {
        self.positions.contains_key(market)
    }

    pub fn open_position_count(&self) -> usize {
        self.positions.len()
    }

    pub fn order(&self, client_order_index: u64) -> Option<&TrackedOrder> {
        self.orders.get(&client_order_index)
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn available_margin(&self) -> Decimal {
        self.available_margin
    }

    /// Clone out the current state for callers.
    #[must_use]
    pub fn view(&self) -> LedgerView {
        LedgerView {
            positions: self.positions.values().cloned().collect(),
            orders: self.orders.values().cloned().collect(),
            account_balance: self.balance,
            available_margin: self.available_margin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use obi_core::{OrderSide, OrderStatus, OrderType, Price, Size};
    use rust_decimal_macros::dec;

    fn snapshot(json: &str) -> AccountResponse {
        serde_json::from_str(json).unwrap()
    }

    fn snapshot_with_markets(markets: &[&str]) -> AccountResponse {
        let positions: Vec<String> = markets
            .iter()
            .map(|m| {
                format!(
                    r#"{{"market": "{m}", "side": "buy", "size": "1", "entry_price": "100",
                        "unrealized_pnl": "0", "margin": "10"}}"#
                )
            })
            .collect();
        snapshot(&format!(
            r#"{{"account_index": 0, "address": "0xaa", "balance": "10000",
                "available_margin": "9000", "positions": [{}], "orders": []}}"#,
            positions.join(",")
        ))
    }

    #[test]
    fn test_sync_replaces_wholesale() {
        let mut ledger = StateLedger::new();

        ledger.apply_snapshot(snapshot_with_markets(&["ETH-PERP", "BTC-PERP"]));
        assert_eq!(ledger.open_position_count(), 2);

        // Second sync omits BTC-PERP: no stale entry survives
        ledger.apply_snapshot(snapshot_with_markets(&["ETH-PERP"]));
        assert_eq!(ledger.open_position_count(), 1);
        assert!(ledger.has_position(&MarketId::new("ETH-PERP").unwrap()));
        assert!(!ledger.has_position(&MarketId::new("BTC-PERP").unwrap()));
    }

    #[test]
    fn test_optimistic_order_dropped_on_sync() {
        let mut ledger = StateLedger::new();

        ledger.record_submitted_order(TrackedOrder {
            client_order_index: 99,
            market: MarketId::new("ETH-PERP").unwrap(),
            side: OrderSide::Buy,
            order_type: OrderType::Limit,
            size: Size::new(dec!(1)),
            price: Price::new(dec!(2450)),
            status: OrderStatus::Pending,
        });
        assert!(ledger.order(99).is_some());
        assert_eq!(ledger.order(99).unwrap().status, OrderStatus::Pending);

        // The exchange never saw it; the sync drops it
        ledger.apply_snapshot(snapshot_with_markets(&[]));
        assert!(ledger.order(99).is_none());
    }

    #[test]
    fn test_balances_tracked_from_snapshot() {
        let mut ledger = StateLedger::new();
        let view = ledger.apply_snapshot(snapshot_with_markets(&["ETH-PERP"]));

        assert_eq!(view.account_balance, dec!(10000));
        assert_eq!(view.available_margin, dec!(9000));
        assert_eq!(ledger.balance(), dec!(10000));
    }

    #[test]
    fn test_local_removals() {
        let mut ledger = StateLedger::new();
        ledger.apply_snapshot(snapshot_with_markets(&["ETH-PERP"]));

        let market = MarketId::new("ETH-PERP").unwrap();
        assert!(ledger.remove_position(&market).is_some());
        assert!(!ledger.has_position(&market));
        assert!(ledger.remove_position(&market).is_none());
    }
}
