//! Unauthenticated market-data reads.
//!
//! One blocking-from-the-caller's-view HTTP GET per operation, parsed
//! through the typed schemas. No internal retries and no internal timeout
//! beyond the transport-level request timeout; callers needing bounded
//! latency impose their own deadline.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{ClientError, ClientResult};
use crate::schema::{
    AccountResponse, ExchangeStats, OrderBookDetails, OrderBooksResponse, RecentTradesResponse,
    Trade,
};
use obi_core::MarketId;

/// Request timeout applied to every call.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Selector for the account endpoint.
#[derive(Debug, Clone)]
pub enum AccountQuery {
    /// Look up by account index.
    Index(u32),
    /// Look up by wallet address.
    Address(String),
}

impl AccountQuery {
    pub(crate) fn params(&self) -> [(&'static str, String); 2] {
        match self {
            Self::Index(index) => [("by", "index".to_string()), ("value", index.to_string())],
            Self::Address(address) => [("by", "address".to_string()), ("value", address.clone())],
        }
    }
}

/// Client for the exchange's public REST surface.
pub struct MarketDataGateway {
    client: Client,
    base_url: String,
}

impl MarketDataGateway {
    /// Create a gateway for the given base URL (e.g. "https://api.example.exchange").
    pub fn new(base_url: impl Into<String>) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// The shared HTTP client, reused by the authenticated paths.
    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    /// Absolute URL for an API path.
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ClientResult<T> {
        let url = self.url(path);
        debug!(url = %url, "GET");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Remote {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| ClientError::Schema(format!("{path}: {e}")))
    }

    /// Fetch an account snapshot by index or address.
    pub async fn get_account(&self, query: &AccountQuery) -> ClientResult<AccountResponse> {
        let params = query.params();
        self.get_json("/api/v1/account", &params).await
    }

    /// Fetch the order book for one market.
    pub async fn get_order_book(&self, market: &MarketId) -> ClientResult<OrderBookDetails> {
        self.get_json(
            "/api/v1/orderBookDetails",
            &[("market", market.as_str().to_string())],
        )
        .await
    }

    /// Fetch order books for every market.
    pub async fn get_all_order_books(&self) -> ClientResult<Vec<OrderBookDetails>> {
        let response: OrderBooksResponse = self.get_json("/api/v1/orderBooks", &[]).await?;
        Ok(response.order_books)
    }

    /// Fetch exchange-wide statistics.
    pub async fn get_exchange_stats(&self) -> ClientResult<ExchangeStats> {
        self.get_json("/api/v1/exchangeStats", &[]).await
    }

    /// Fetch up to `limit` recent trades for one market.
    pub async fn get_recent_trades(
        &self,
        market: &MarketId,
        limit: u32,
    ) -> ClientResult<Vec<Trade>> {
        let response: RecentTradesResponse = self
            .get_json(
                "/api/v1/recentTrades",
                &[
                    ("market", market.as_str().to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        Ok(response.trades)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let gateway = MarketDataGateway::new("https://api.example.exchange/").unwrap();
        assert_eq!(
            gateway.url("/api/v1/exchangeStats"),
            "https://api.example.exchange/api/v1/exchangeStats"
        );
    }

    #[test]
    fn test_account_query_params() {
        let by_index = AccountQuery::Index(12).params();
        assert_eq!(by_index[0], ("by", "index".to_string()));
        assert_eq!(by_index[1], ("value", "12".to_string()));

        let by_address = AccountQuery::Address("0xabc".to_string()).params();
        assert_eq!(by_address[0], ("by", "address".to_string()));
        assert_eq!(by_address[1], ("value", "0xabc".to_string()));
    }
}
