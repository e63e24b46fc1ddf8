//! Strategy performance counters.
//!
//! Plain data consumed by the presentation layer; no exporter, no
//! registry. Updated once per completed cycle.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cycle::CycleReport;
use crate::signal::Signal;

/// Accumulated counters since process start.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PerformanceMetrics {
    pub cycles_completed: u64,
    pub markets_analyzed: u64,
    pub bullish_signals: u64,
    pub bearish_signals: u64,
    pub neutral_signals: u64,
    pub orders_submitted: u64,
    pub markets_skipped: u64,
    pub markets_failed: u64,
    pub last_cycle_at: Option<DateTime<Utc>>,
}

/// Folds cycle reports into the running counters.
#[derive(Debug, Default)]
pub struct PerformanceTracker {
    metrics: PerformanceMetrics,
}

impl PerformanceTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cycle(&mut self, report: &CycleReport) {
        self.metrics.cycles_completed += 1;
        self.metrics.markets_analyzed += report.analyses.len() as u64;
        for analysis in &report.analyses {
            match analysis.signal {
                Signal::Bullish => self.metrics.bullish_signals += 1,
                Signal::Bearish => self.metrics.bearish_signals += 1,
                Signal::Neutral => self.metrics.neutral_signals += 1,
            }
        }
        self.metrics.orders_submitted += report.submitted.len() as u64;
        self.metrics.markets_skipped += report.skipped.len() as u64;
        self.metrics.markets_failed += report.failures.len() as u64;
        self.metrics.last_cycle_at = Some(report.started_at);
    }

    pub fn metrics(&self) -> &PerformanceMetrics {
        &self.metrics
    }
}
