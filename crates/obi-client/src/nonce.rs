//! Nonce sequencing for transaction submission.
//!
//! The remote is authoritative: the sequencer only hands out values it was
//! told about via `resync` (fed from the next-nonce endpoint). State is an
//! explicit machine so a rejected submission cannot silently reuse or skip
//! a value; after any failure the caller must resync before reserving
//! again. No internal locking: the session serializes access, one in-flight
//! transaction at a time.

use thiserror::Error;

/// Error types for nonce sequencing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NonceError {
    /// The sequencer lost track of the remote's expected value.
    #[error("nonce sequencer desynchronized; fetch the next nonce before reserving")]
    Desynced,

    /// A reserved nonce is still attached to an in-flight transaction.
    #[error("nonce {0} already reserved and in flight")]
    InFlight(u64),
}

/// Sequencer state, scoped to one (account_index, api_key_index) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonceState {
    /// Synced from the remote; `next` has not been handed out yet.
    Fresh { next: u64 },
    /// `nonce` is attached to an in-flight transaction.
    Reserved { nonce: u64, next: u64 },
    /// The last reservation was accepted by the remote.
    Confirmed { next: u64 },
    /// A submission was rejected; reservations refuse until a resync.
    Desynced,
}

/// Issues nonces guaranteed unused for this signer, assuming single-threaded
/// use (see the session's concurrency contract).
#[derive(Debug)]
pub struct NonceSequencer {
    state: NonceState,
}

impl NonceSequencer {
    /// A new sequencer starts desynchronized so the first `reserve` without
    /// a remote fetch fails fast instead of guessing a value.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: NonceState::Desynced,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> NonceState {
        self.state
    }

    /// The value the next `reserve` would return, if one is available.
    #[must_use]
    pub fn peek(&self) -> Option<u64> {
        match self.state {
            NonceState::Fresh { next } | NonceState::Confirmed { next } => Some(next),
            NonceState::Reserved { .. } | NonceState::Desynced => None,
        }
    }

    /// Adopt the remote's next expected value. Valid from any state.
    pub fn resync(&mut self, next: u64) {
        self.state = NonceState::Fresh { next };
    }

    /// Hand out the next nonce and optimistically advance the counter.
    ///
    /// # Errors
    /// - `NonceError::Desynced` until `resync` is called.
    /// - `NonceError::InFlight` while a reservation is outstanding.
    pub fn reserve(&mut self) -> Result<u64, NonceError> {
        match self.state {
            NonceState::Fresh { next } | NonceState::Confirmed { next } => {
                self.state = NonceState::Reserved {
                    nonce: next,
                    next: next + 1,
                };
                Ok(next)
            }
            NonceState::Reserved { nonce, .. } => Err(NonceError::InFlight(nonce)),
            NonceState::Desynced => Err(NonceError::Desynced),
        }
    }

    /// Mark the outstanding reservation as accepted by the remote.
    pub fn confirm(&mut self) {
        if let NonceState::Reserved { next, .. } = self.state {
            self.state = NonceState::Confirmed { next };
        }
    }

    /// Drop to `Desynced`. Called on any rejected submission; there is no
    /// automatic rollback of the reserved value.
    pub fn desync(&mut self) {
        self.state = NonceState::Desynced;
    }
}

impl Default for NonceSequencer {
    fn default() -> Self {
        Self::new()
    }
}
