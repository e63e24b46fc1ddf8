//! Order-book-imbalance taker bot.
//!
//! Wires configuration, the exchange session and the strategy engine into
//! a long-running process: one serialized strategy cycle per interval.

pub mod app;
pub mod config;
pub mod error;
pub mod logging;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
