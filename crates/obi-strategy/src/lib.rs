//! Signal-driven strategy harness for the obi trading system.
//!
//! Per cycle, per configured market: derive a directional signal from
//! order-book imbalance, gate it against position state and the
//! open-position cap, size the trade from a fractional risk budget, and
//! submit a limit order through the exchange session. Partial-failure
//! semantics throughout: one market's error never aborts the cycle.

pub mod cycle;
pub mod error;
pub mod metrics;
pub mod signal;
pub mod sizing;

pub use cycle::{
    decide, CycleEngine, CycleReport, Decision, MarketFailure, SkipReason, StrategyConfig,
};
pub use error::StrategyError;
pub use metrics::{PerformanceMetrics, PerformanceTracker};
pub use signal::{analyze, classify, imbalance, MarketAnalysis, Signal, IMBALANCE_THRESHOLD};
pub use sizing::{position_size, SizingError};
