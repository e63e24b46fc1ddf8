//! Application configuration.

use std::path::PathBuf;
use std::str::FromStr;

use alloy::primitives::Address;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use obi_client::{KeySource, SessionConfig};
use obi_core::{MarketId, TimeInForce};
use obi_strategy::StrategyConfig;

/// Application configuration, loaded from TOML.
///
/// Key material is never inline: the config points at an environment
/// variable or a file and the key is read at session construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Exchange REST base URL.
    pub base_url: String,
    /// Account index to trade for.
    #[serde(default)]
    pub account_index: u32,
    /// API key slot within the account.
    #[serde(default)]
    pub api_key_index: u8,
    /// Environment variable holding the hex signing key.
    #[serde(default)]
    pub key_env_var: Option<String>,
    /// File holding the hex signing key (recommend 0600 permissions).
    #[serde(default)]
    pub key_file: Option<PathBuf>,
    /// When set, the derived wallet address must match this.
    #[serde(default)]
    pub expected_address: Option<String>,
    /// Auth token lifetime (ms). Default: 10 minutes.
    #[serde(default = "default_auth_ttl_ms")]
    pub auth_ttl_ms: u64,
    /// Markets walked each cycle.
    pub markets: Vec<String>,
    /// Open-position cap. Default: 3.
    #[serde(default = "default_max_positions")]
    pub max_positions: usize,
    /// Fraction of equity risked per trade. Default: 0.02.
    #[serde(default = "default_risk_per_trade")]
    pub risk_per_trade: Decimal,
    /// Synthetic stop distance used for sizing. Default: 0.02.
    #[serde(default = "default_stop_distance_pct")]
    pub stop_distance_pct: Decimal,
    /// Time-in-force for submitted orders. Default: gtc.
    #[serde(default)]
    pub time_in_force: TimeInForce,
    /// Strategy cycle interval (ms). Default: 5000.
    #[serde(default = "default_cycle_interval_ms")]
    pub cycle_interval_ms: u64,
}

fn default_auth_ttl_ms() -> u64 {
    obi_client::DEFAULT_AUTH_TTL_MS
}

fn default_max_positions() -> usize {
    3
}

fn default_risk_per_trade() -> Decimal {
    Decimal::new(2, 2)
}

fn default_stop_distance_pct() -> Decimal {
    Decimal::new(2, 2)
}

fn default_cycle_interval_ms() -> u64 {
    5_000
}

impl AppConfig {
    /// Load from a TOML file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config {path}: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config {path}: {e}")))
    }

    /// Where the signing key comes from, if trading is enabled.
    fn key_source(&self) -> AppResult<Option<KeySource>> {
        match (&self.key_env_var, &self.key_file) {
            (Some(_), Some(_)) => Err(AppError::Config(
                "set key_env_var or key_file, not both".to_string(),
            )),
            (Some(var_name), None) => Ok(Some(KeySource::EnvVar {
                var_name: var_name.clone(),
            })),
            (None, Some(path)) => Ok(Some(KeySource::File { path: path.clone() })),
            (None, None) => Ok(None),
        }
    }

    /// Session construction parameters.
    pub fn session_config(&self) -> AppResult<SessionConfig> {
        let expected_address = self
            .expected_address
            .as_deref()
            .map(Address::from_str)
            .transpose()
            .map_err(|e| AppError::Config(format!("invalid expected_address: {e}")))?;

        Ok(SessionConfig {
            base_url: self.base_url.clone(),
            account_index: self.account_index,
            api_key_index: self.api_key_index,
            key_source: self.key_source()?,
            expected_address,
            auth_ttl_ms: self.auth_ttl_ms,
        })
    }

    /// Strategy parameters.
    pub fn strategy_config(&self) -> AppResult<StrategyConfig> {
        let markets = self
            .markets
            .iter()
            .map(|symbol| {
                MarketId::new(symbol.clone())
                    .map_err(|e| AppError::Config(format!("invalid market: {e}")))
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(StrategyConfig {
            markets,
            max_positions: self.max_positions,
            risk_per_trade: self.risk_per_trade,
            stop_distance_pct: self.stop_distance_pct,
            time_in_force: self.time_in_force,
        })
    }
}
