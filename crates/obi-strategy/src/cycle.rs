//! The strategy cycle.
//!
//! One cycle walks every configured market: analyze the book, gate the
//! signal against position state, size the trade, submit a limit order at
//! the top of the book. A failure in one market never aborts the rest of
//! the cycle; errors are collected and returned alongside the successes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::StrategyError;
use crate::metrics::{PerformanceMetrics, PerformanceTracker};
use crate::signal::{analyze, MarketAnalysis, Signal};
use crate::sizing::position_size;
use obi_client::{ClientError, ExchangeSession, OrderSpec};
use obi_core::{MarketId, OrderSide, TimeInForce, TrackedOrder};

/// Strategy parameters.
#[derive(Debug, Clone)]
pub struct StrategyConfig {
    /// Markets walked each cycle, in order.
    pub markets: Vec<MarketId>,
    /// Open-position cap across all markets.
    pub max_positions: usize,
    /// Fraction of account equity risked per trade.
    pub risk_per_trade: Decimal,
    /// Synthetic adverse-move stop distance used for sizing.
    pub stop_distance_pct: Decimal,
    /// Time-in-force for submitted orders.
    pub time_in_force: TimeInForce,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            markets: Vec::new(),
            max_positions: 3,
            // 2% of equity per trade, 2% synthetic stop
            risk_per_trade: Decimal::new(2, 2),
            stop_distance_pct: Decimal::new(2, 2),
            time_in_force: TimeInForce::GoodTilCancelled,
        }
    }
}

/// Why a market was skipped this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Imbalance inside the neutral band.
    NeutralSignal,
    /// A position is already open in this market.
    AlreadyHasPosition,
    /// The open-position cap is reached.
    PositionCapReached,
}

/// Gate decision for one analyzed market.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Submit an order on this side.
    Trade(OrderSide),
    /// Sit out this cycle.
    Skip(SkipReason),
}

/// Pure gate: signal and position state in, decision out.
pub fn decide(
    signal: Signal,
    has_position: bool,
    open_positions: usize,
    max_positions: usize,
) -> Decision {
    let side = match signal {
        Signal::Neutral => return Decision::Skip(SkipReason::NeutralSignal),
        Signal::Bullish => OrderSide::Buy,
        Signal::Bearish => OrderSide::Sell,
    };
    if has_position {
        return Decision::Skip(SkipReason::AlreadyHasPosition);
    }
    if open_positions >= max_positions {
        return Decision::Skip(SkipReason::PositionCapReached);
    }
    Decision::Trade(side)
}

/// A per-market failure collected into the cycle report.
#[derive(Debug)]
pub struct MarketFailure {
    pub market: MarketId,
    pub error: StrategyError,
}

/// Everything one cycle produced.
#[derive(Debug)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub analyses: Vec<MarketAnalysis>,
    pub submitted: Vec<TrackedOrder>,
    pub skipped: Vec<(MarketId, SkipReason)>,
    pub failures: Vec<MarketFailure>,
}

impl CycleReport {
    fn new() -> Self {
        Self {
            cycle_id: Uuid::new_v4(),
            started_at: Utc::now(),
            analyses: Vec::new(),
            submitted: Vec::new(),
            skipped: Vec::new(),
            failures: Vec::new(),
        }
    }
}

enum MarketOutcome {
    Submitted(TrackedOrder),
    Skipped(SkipReason),
}

/// Drives one strategy cycle at a time over a session.
///
/// Not safe to run concurrently with itself: the session's nonce sequencer
/// and ledger have no internal mutual exclusion, so callers await each
/// cycle before starting the next.
pub struct CycleEngine {
    config: StrategyConfig,
    tracker: PerformanceTracker,
}

impl CycleEngine {
    pub fn new(config: StrategyConfig) -> Self {
        Self {
            config,
            tracker: PerformanceTracker::new(),
        }
    }

    /// Accumulated performance counters.
    pub fn metrics(&self) -> &PerformanceMetrics {
        self.tracker.metrics()
    }

    /// Run one full cycle over the configured markets.
    ///
    /// # Errors
    /// Only the initial account sync propagates; per-market failures land
    /// in the report's `failures`.
    pub async fn run_cycle(
        &mut self,
        session: &mut ExchangeSession,
    ) -> Result<CycleReport, StrategyError> {
        let view = session.sync_account_state().await?;
        let mut report = CycleReport::new();

        // Count submissions of this cycle against the cap so a burst of
        // simultaneous signals cannot overshoot it once the orders fill.
        let mut open_slots_used = session.ledger().open_position_count();

        let markets = self.config.markets.clone();
        for market in &markets {
            match self
                .process_market(session, market, view.account_balance, open_slots_used, &mut report)
                .await
            {
                Ok(MarketOutcome::Submitted(order)) => {
                    open_slots_used += 1;
                    report.submitted.push(order);
                }
                Ok(MarketOutcome::Skipped(reason)) => {
                    debug!(market = %market, reason = ?reason, "market skipped");
                    report.skipped.push((market.clone(), reason));
                }
                Err(error) => {
                    warn!(market = %market, error = %error, "market failed this cycle");
                    if matches!(
                        error,
                        StrategyError::Client(ClientError::NonceDesync { .. })
                    ) {
                        // Recover the sequencer so the remaining markets can
                        // still submit this cycle.
                        if let Err(refetch) = session.fetch_next_nonce().await {
                            warn!(error = %refetch, "nonce refetch after desync failed");
                        }
                    }
                    report.failures.push(MarketFailure {
                        market: market.clone(),
                        error,
                    });
                }
            }
        }

        self.tracker.record_cycle(&report);
        info!(
            cycle_id = %report.cycle_id,
            analyzed = report.analyses.len(),
            submitted = report.submitted.len(),
            skipped = report.skipped.len(),
            failed = report.failures.len(),
            "cycle complete"
        );
        Ok(report)
    }

    async fn process_market(
        &self,
        session: &mut ExchangeSession,
        market: &MarketId,
        account_balance: Decimal,
        open_slots_used: usize,
        report: &mut CycleReport,
    ) -> Result<MarketOutcome, StrategyError> {
        let book = session.market_data().get_order_book(market).await?;
        let analysis = analyze(&book);
        report.analyses.push(analysis.clone());

        let side = match decide(
            analysis.signal,
            session.ledger().has_position(market),
            open_slots_used,
            self.config.max_positions,
        ) {
            Decision::Skip(reason) => return Ok(MarketOutcome::Skipped(reason)),
            Decision::Trade(side) => side,
        };

        // Limit order at the top of the book on the signal side; the stop
        // used for sizing is a synthetic adverse move from that entry.
        let entry = match side {
            OrderSide::Buy => analysis.best_bid,
            OrderSide::Sell => analysis.best_ask,
        };
        let stop = match side {
            OrderSide::Buy => entry * (Decimal::ONE - self.config.stop_distance_pct),
            OrderSide::Sell => entry * (Decimal::ONE + self.config.stop_distance_pct),
        };
        let size = position_size(account_balance, self.config.risk_per_trade, entry, stop)?;

        let mut spec = OrderSpec::limit(market.clone(), side, size, entry);
        spec.time_in_force = self.config.time_in_force;

        let order = session.create_order(spec).await?;
        info!(
            market = %market,
            side = %side,
            size = %order.size,
            price = %order.price,
            client_order_index = order.client_order_index,
            "order submitted"
        );
        Ok(MarketOutcome::Submitted(order))
    }
}
