//! Error types for obi-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid market symbol: {0:?}")]
    InvalidMarket(String),

    #[error("Value out of fixed-point range: {0}")]
    FixedPointRange(String),

    #[error("Decimal parse error: {0}")]
    DecimalParse(#[from] rust_decimal::Error),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
