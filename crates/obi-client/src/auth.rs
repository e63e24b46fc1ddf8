//! Time-bound authentication credentials.
//!
//! The auth session caches one token and regenerates it wholesale when it
//! nears expiry. A token is never patched in place: replacement is a single
//! whole-value assignment.

use std::sync::Arc;

use alloy::primitives::Address;
use serde::Serialize;

use crate::clock::{Clock, SystemClock};
use crate::signer::{SignerError, SigningIdentity};

/// Tokens are regenerated this many milliseconds before their expiry so a
/// credential is never presented right at the edge of its lifetime.
const REFRESH_SKEW_MS: u64 = 5_000;

/// Default token lifetime (10 minutes).
pub const DEFAULT_AUTH_TTL_MS: u64 = 600_000;

/// The signed auth message. Field order is part of the signed bytes.
#[derive(Debug, Clone, Serialize)]
struct AuthMessage {
    timestamp: u64,
    expiry: u64,
    account_index: u32,
    api_key_index: u8,
}

/// An ephemeral signed credential.
#[derive(Debug, Clone)]
pub struct AuthToken {
    /// Canonical JSON of the signed message.
    pub message: String,
    /// Hex signature over the keccak256 digest of `message`.
    pub signature: String,
    /// Address of the signing wallet.
    pub signer_address: Address,
    /// Expiry in milliseconds since Unix epoch.
    pub expires_at_ms: u64,
}

impl AuthToken {
    /// True while the token may still be presented.
    pub fn is_valid_at(&self, now_ms: u64) -> bool {
        now_ms.saturating_add(REFRESH_SKEW_MS) < self.expires_at_ms
    }
}

/// Header set attached to every authenticated request.
#[derive(Debug, Clone)]
pub struct AuthHeaders {
    pub token: String,
    pub message: String,
    pub account_index: u32,
    pub api_key_index: u8,
}

impl AuthHeaders {
    /// Attach the headers to a request.
    pub fn apply(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("X-Auth-Token", &self.token)
            .header("X-Auth-Message", &self.message)
            .header("X-API-Key-Index", self.api_key_index.to_string())
            .header("X-Account-Index", self.account_index.to_string())
    }
}

/// Builds and caches time-bound credentials from the signing identity.
pub struct AuthSession<C: Clock = SystemClock> {
    identity: Arc<SigningIdentity>,
    account_index: u32,
    api_key_index: u8,
    ttl_ms: u64,
    cached: Option<AuthToken>,
    clock: C,
}

impl AuthSession<SystemClock> {
    /// Create an auth session on the system clock.
    pub fn new(
        identity: Arc<SigningIdentity>,
        account_index: u32,
        api_key_index: u8,
        ttl_ms: u64,
    ) -> Self {
        Self::with_clock(identity, account_index, api_key_index, ttl_ms, SystemClock)
    }
}

impl<C: Clock> AuthSession<C> {
    /// Create an auth session with an explicit clock.
    pub fn with_clock(
        identity: Arc<SigningIdentity>,
        account_index: u32,
        api_key_index: u8,
        ttl_ms: u64,
        clock: C,
    ) -> Self {
        Self {
            identity,
            account_index,
            api_key_index,
            ttl_ms,
            cached: None,
            clock,
        }
    }

    /// Build a fresh token with the configured lifetime.
    async fn create_token(&self) -> Result<AuthToken, SignerError> {
        let timestamp = self.clock.now_ms();
        let expiry = timestamp.saturating_add(self.ttl_ms);
        let message = AuthMessage {
            timestamp,
            expiry,
            account_index: self.account_index,
            api_key_index: self.api_key_index,
        };

        let message_json =
            serde_json::to_string(&message).expect("auth message serialization is infallible");
        let signature = self.identity.sign_payload(message_json.as_bytes()).await?;

        Ok(AuthToken {
            message: message_json,
            signature,
            signer_address: self.identity.address(),
            expires_at_ms: expiry,
        })
    }

    /// The cached token if unexpired, else a freshly signed replacement.
    pub async fn token(&mut self) -> Result<&AuthToken, SignerError> {
        let now = self.clock.now_ms();
        let needs_refresh = match &self.cached {
            Some(token) => !token.is_valid_at(now),
            None => true,
        };

        if needs_refresh {
            let token = self.create_token().await?;
            self.cached = Some(token);
        }

        Ok(self.cached.as_ref().expect("token cached above"))
    }

    /// Authenticated header set for the next request.
    pub async fn headers(&mut self) -> Result<AuthHeaders, SignerError> {
        let account_index = self.account_index;
        let api_key_index = self.api_key_index;
        let token = self.token().await?;
        Ok(AuthHeaders {
            token: token.signature.clone(),
            message: token.message.clone(),
            account_index,
            api_key_index,
        })
    }
}
