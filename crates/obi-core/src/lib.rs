//! Core domain types for the obi trading harness.
//!
//! This crate provides the fundamental types shared by the exchange client
//! and the strategy engine:
//! - `Price`, `Size`: precision-safe numeric types with the fixed-point
//!   wire codec
//! - `MarketId`: validated market symbol
//! - `OrderSide`, `OrderType`, `TimeInForce`, `OrderStatus`: trading enums
//! - `Position`, `TrackedOrder`: exchange-reported and locally tracked state

pub mod decimal;
pub mod error;
pub mod market;
pub mod order;

pub use decimal::{Price, Size, WIRE_PRICE_SCALE};
pub use error::{CoreError, Result};
pub use market::MarketId;
pub use order::{OrderSide, OrderStatus, OrderType, Position, TimeInForce, TrackedOrder};
