//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Client error: {0}")]
    Client(#[from] obi_client::ClientError),

    #[error("Strategy error: {0}")]
    Strategy(#[from] obi_strategy::StrategyError),

    #[error("Core error: {0}")]
    Core(#[from] obi_core::CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
