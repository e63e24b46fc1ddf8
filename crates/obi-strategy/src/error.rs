//! Strategy error types.

use thiserror::Error;

use crate::sizing::SizingError;
use obi_client::ClientError;

/// Errors surfaced by the strategy engine.
///
/// Per-market failures inside a cycle are collected into the cycle report;
/// only a failure that prevents the cycle from running at all (the initial
/// account sync) propagates out of `run_cycle`.
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Sizing(#[from] SizingError),
}
