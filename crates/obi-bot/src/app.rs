//! Main application orchestration.
//!
//! Builds the exchange session and the cycle engine from configuration,
//! performs the startup nonce fetch and initial account sync, then drives
//! one strategy cycle per interval tick. Cycles are strictly serialized:
//! each one is awaited to completion before the next tick fires, which is
//! the concurrency contract the session requires.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::error::AppResult;
use obi_client::ExchangeSession;
use obi_strategy::{CycleEngine, PerformanceMetrics};

/// Main application.
pub struct Application {
    config: AppConfig,
    session: ExchangeSession,
    engine: CycleEngine,
}

impl Application {
    /// Create the application from configuration.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let session = ExchangeSession::new(config.session_config()?)?;
        let engine = CycleEngine::new(config.strategy_config()?);

        Ok(Self {
            config,
            session,
            engine,
        })
    }

    /// Accumulated performance counters.
    pub fn metrics(&self) -> &PerformanceMetrics {
        self.engine.metrics()
    }

    /// Run the strategy loop until ctrl-c.
    pub async fn run(mut self) -> AppResult<()> {
        if self.session.has_signing_capability() {
            let nonce = self.session.fetch_next_nonce().await?;
            info!(nonce, "startup nonce synchronized");
        } else {
            warn!("no signing key configured; orders will fail, reads still work");
        }

        let view = self.session.sync_account_state().await?;
        info!(
            positions = view.positions.len(),
            orders = view.orders.len(),
            balance = %view.account_balance,
            "initial account sync complete"
        );

        let mut cycle_interval =
            tokio::time::interval(Duration::from_millis(self.config.cycle_interval_ms));
        cycle_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cycle_interval.tick() => {
                    match self.engine.run_cycle(&mut self.session).await {
                        Ok(report) => {
                            if !report.failures.is_empty() {
                                warn!(
                                    cycle_id = %report.cycle_id,
                                    failed = report.failures.len(),
                                    "cycle finished with per-market failures"
                                );
                            }
                        }
                        Err(err) => {
                            error!(error = %err, "cycle aborted before analysis");
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("shutdown requested");
                    break;
                }
            }
        }

        let metrics = self.engine.metrics();
        info!(
            cycles = metrics.cycles_completed,
            orders = metrics.orders_submitted,
            failed = metrics.markets_failed,
            "final performance counters"
        );
        Ok(())
    }
}
