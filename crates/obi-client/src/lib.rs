//! Exchange connectivity for the obi trading harness.
//!
//! Everything revolves around [`ExchangeSession`], a dependency-injected
//! session object constructed once from configuration:
//!
//! - [`SigningIdentity`]: wallet key material and message signatures
//! - [`AuthSession`]: cached time-bound credentials
//! - [`NonceSequencer`]: explicit Fresh/Reserved/Confirmed/Desynced machine
//! - [`MarketDataGateway`]: unauthenticated reads
//! - order gateway methods on the session: sign, submit, cancel
//! - [`StateLedger`]: wholesale-rebuilt mirror of exchange state
//!
//! # Concurrency contract
//!
//! The session is single-threaded mutable state. Nothing here spawns
//! background work, takes locks, or cancels in-flight requests; callers
//! serialize cycles externally and impose their own deadlines.

pub mod auth;
pub mod clock;
pub mod error;
pub mod gateway;
pub mod ledger;
pub mod nonce;
pub mod orders;
pub mod schema;
pub mod session;
pub mod signer;

pub use auth::{AuthHeaders, AuthSession, AuthToken, DEFAULT_AUTH_TTL_MS};
pub use clock::{Clock, SystemClock};
pub use error::{ClientError, ClientResult};
pub use gateway::{AccountQuery, MarketDataGateway};
pub use ledger::{LedgerView, StateLedger};
pub use nonce::{NonceError, NonceSequencer, NonceState};
pub use orders::{CancelTx, OrderSpec, OrderTx, SignedCancel, SignedOrder};
pub use schema::{
    AccountResponse, BookLevel, ExchangeStats, NextNonceResponse, OrderBookDetails, OrderEntry,
    PositionEntry, RecentTradesResponse, Trade, TxReceipt,
};
pub use session::{ExchangeSession, SessionConfig};
pub use signer::{KeySource, SignerError, SigningIdentity};
