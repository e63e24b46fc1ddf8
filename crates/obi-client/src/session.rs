//! The exchange session.
//!
//! One session object is constructed at process start from configuration
//! and passed by reference to every caller. It owns the only mutable shared
//! state in the system (the nonce sequencer and the ledger) and assumes a
//! single logical thread of control: callers serialize cycles externally.
//!
//! Capability split: every session carries the public read surface; the
//! authenticated write surface exists only when a signing key is
//! configured, otherwise those operations fail with
//! `SignerError::NoSigningKey`.

use std::sync::Arc;

use alloy::primitives::Address;
use tracing::{info, warn};

use crate::auth::{AuthHeaders, AuthSession, DEFAULT_AUTH_TTL_MS};
use crate::clock::{Clock, SystemClock};
use crate::error::{ClientError, ClientResult};
use crate::gateway::{AccountQuery, MarketDataGateway};
use crate::ledger::{LedgerView, StateLedger};
use crate::nonce::{NonceSequencer, NonceState};
use crate::schema::{AccountResponse, NextNonceResponse};
use crate::signer::{KeySource, SignerError, SigningIdentity};

/// Session construction parameters.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Exchange REST base URL.
    pub base_url: String,
    /// Account index the session trades for.
    pub account_index: u32,
    /// API key slot within the account.
    pub api_key_index: u8,
    /// Where to load the signing key from; `None` builds a public-only
    /// session.
    pub key_source: Option<KeySource>,
    /// When set, the derived wallet address must match.
    pub expected_address: Option<Address>,
    /// Auth token lifetime in milliseconds.
    pub auth_ttl_ms: u64,
}

impl SessionConfig {
    /// A public-only (read) session.
    pub fn public(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            account_index: 0,
            api_key_index: 0,
            key_source: None,
            expected_address: None,
            auth_ttl_ms: DEFAULT_AUTH_TTL_MS,
        }
    }
}

/// Authenticated client session for one (account, API key) pair.
pub struct ExchangeSession {
    pub(crate) account_index: u32,
    pub(crate) api_key_index: u8,
    pub(crate) gateway: MarketDataGateway,
    pub(crate) identity: Option<Arc<SigningIdentity>>,
    pub(crate) auth: Option<AuthSession>,
    pub(crate) nonce: NonceSequencer,
    pub(crate) ledger: StateLedger,
    pub(crate) order_seq: u64,
}

impl ExchangeSession {
    /// Build a session from configuration, loading the signing key when one
    /// is configured.
    pub fn new(config: SessionConfig) -> ClientResult<Self> {
        let gateway = MarketDataGateway::new(config.base_url.as_str())?;

        let identity = match &config.key_source {
            Some(source) => Some(Arc::new(SigningIdentity::load(
                source,
                config.expected_address,
            )?)),
            None => None,
        };

        let auth = identity.as_ref().map(|identity| {
            AuthSession::new(
                Arc::clone(identity),
                config.account_index,
                config.api_key_index,
                config.auth_ttl_ms,
            )
        });

        match &identity {
            Some(identity) => info!(
                address = %identity.address(),
                account_index = config.account_index,
                "session has signing capability"
            ),
            None => info!("session is public-only; authenticated operations unavailable"),
        }

        Ok(Self {
            account_index: config.account_index,
            api_key_index: config.api_key_index,
            gateway,
            identity,
            auth,
            nonce: NonceSequencer::new(),
            ledger: StateLedger::new(),
            order_seq: SystemClock.now_ms(),
        })
    }

    /// True when the session can sign and submit transactions.
    pub fn has_signing_capability(&self) -> bool {
        self.identity.is_some()
    }

    /// The public read gateway.
    pub fn market_data(&self) -> &MarketDataGateway {
        &self.gateway
    }

    /// Read access to the ledger.
    pub fn ledger(&self) -> &StateLedger {
        &self.ledger
    }

    /// Current nonce sequencer state.
    pub fn nonce_state(&self) -> NonceState {
        self.nonce.state()
    }

    /// Next client order index; unique per session, seeded from wall time.
    pub(crate) fn next_client_order_index(&mut self) -> u64 {
        let index = self.order_seq;
        self.order_seq += 1;
        index
    }

    /// Auth headers for the next request, or `NoSigningKey` on a
    /// public-only session.
    pub(crate) async fn auth_headers(&mut self) -> ClientResult<AuthHeaders> {
        let auth = self
            .auth
            .as_mut()
            .ok_or(ClientError::Signing(SignerError::NoSigningKey))?;
        Ok(auth.headers().await?)
    }

    /// Fetch the remote's next expected nonce and resynchronize the
    /// sequencer. Must be called after process start and after any
    /// detected desync.
    pub async fn fetch_next_nonce(&mut self) -> ClientResult<u64> {
        let headers = self.auth_headers().await?;
        let url = self.gateway.url("/api/v1/transaction/next_nonce");

        let response = headers
            .apply(self.gateway.http().get(url))
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

        let parsed: NextNonceResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Schema(format!("next_nonce: {e}")))?;

        self.nonce.resync(parsed.nonce);
        info!(nonce = parsed.nonce, "nonce sequencer resynchronized");
        Ok(parsed.nonce)
    }

    async fn get_account_authenticated(
        &mut self,
        query: &AccountQuery,
    ) -> ClientResult<AccountResponse> {
        let headers = self.auth_headers().await?;
        let url = self.gateway.url("/api/v1/account");

        let response = headers
            .apply(self.gateway.http().get(url).query(&query.params()))
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

        response
            .json()
            .await
            .map_err(|e| ClientError::Schema(format!("account: {e}")))
    }

    /// Refresh the ledger wholesale from the exchange's account snapshot.
    ///
    /// Falls back to the public read-only account endpoint when the
    /// authenticated fetch fails on auth grounds; the degradation is
    /// logged, never silent.
    pub async fn sync_account_state(&mut self) -> ClientResult<LedgerView> {
        let query = AccountQuery::Index(self.account_index);

        let snapshot = match self.get_account_authenticated(&query).await {
            Ok(snapshot) => snapshot,
            Err(err) if err.is_auth_failure() => {
                warn!(
                    error = %err,
                    "authenticated account fetch failed; falling back to public read-only endpoint"
                );
                self.gateway.get_account(&query).await?
            }
            Err(err) => return Err(err),
        };

        Ok(self.ledger.apply_snapshot(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::OrderSpec;
    use crate::signer::SignerError;
    use obi_core::{MarketId, OrderSide, Price, Size};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_public_session_lacks_signing_capability() {
        let mut session =
            ExchangeSession::new(SessionConfig::public("https://api.example.exchange")).unwrap();
        assert!(!session.has_signing_capability());
        assert_eq!(session.nonce_state(), NonceState::Desynced);

        // The authenticated capability set is selected by configuration;
        // without a key the write path fails before touching the network.
        session.nonce.resync(1);
        let spec = OrderSpec::limit(
            MarketId::new("ETH-PERP").unwrap(),
            OrderSide::Buy,
            Size::new(dec!(1)),
            Price::new(dec!(100)),
        );
        let result = session.sign_create_order(spec).await;
        assert!(matches!(
            result,
            Err(ClientError::Signing(SignerError::NoSigningKey))
        ));
    }

    #[test]
    fn test_client_order_indices_increase() {
        let mut session =
            ExchangeSession::new(SessionConfig::public("https://api.example.exchange")).unwrap();
        let first = session.next_client_order_index();
        let second = session.next_client_order_index();
        assert_eq!(second, first + 1);
    }
}
