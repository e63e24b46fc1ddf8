//! Client error taxonomy.
//!
//! Gateways surface these unmodified; only the strategy cycle aggregates
//! per-market failures. Retry policy is always the caller's decision.

use thiserror::Error;

use crate::nonce::NonceError;
use crate::signer::SignerError;
use obi_core::CoreError;

/// Errors produced by the exchange session and its gateways.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Missing or malformed key material. Fatal, non-retryable.
    #[error("signing error: {0}")]
    Signing(#[from] SignerError),

    /// Malformed order spec; the caller must fix the input.
    #[error("invalid order spec: {0}")]
    Validation(String),

    /// Local sequencer misuse (reserve while desynced or in flight).
    #[error(transparent)]
    Nonce(#[from] NonceError),

    /// The remote rejected our nonce. Recoverable via `fetch_next_nonce`.
    #[error("nonce {nonce} rejected by remote; resync required")]
    NonceDesync { nonce: u64 },

    /// Transport-level failure. Retryable at the caller's discretion.
    #[error("transport failure: {0}")]
    Network(String),

    /// Non-2xx response from a read endpoint.
    #[error("remote returned HTTP {status}: {body}")]
    Remote { status: u16, body: String },

    /// The exchange rejected a signed transaction.
    #[error("transaction rejected (code {code}): {message}")]
    Rejected { code: u32, message: String },

    /// A response body did not match the expected schema.
    #[error("malformed response: {0}")]
    Schema(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// True for failures of the authenticated path that the account fetch
    /// may degrade around (missing key, expired/invalid credential).
    pub(crate) fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::Signing(_)
                | Self::Remote {
                    status: 401 | 403,
                    ..
                }
        )
    }
}
