//! Wallet signing identity.
//!
//! Exactly one identity signs all requests for a session. Payloads are
//! hashed with keccak256 and signed with the wallet's secp256k1 key; the
//! 65-byte r‖s‖v signature travels hex-encoded on the wire.

use std::path::PathBuf;

use alloy::primitives::{keccak256, Address, PrimitiveSignature, B256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer as AlloySigner;
use thiserror::Error;
use zeroize::Zeroizing;

/// Source of the private key.
#[derive(Debug, Clone)]
pub enum KeySource {
    /// Load from environment variable (development).
    EnvVar { var_name: String },
    /// Load from file (production, recommend 0600 permissions).
    File { path: PathBuf },
}

/// Signing errors. All fatal and non-retryable.
#[derive(Debug, Error)]
pub enum SignerError {
    #[error("No signing key configured for this session")]
    NoSigningKey,

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Failed to decode hex: {0}")]
    HexDecode(#[from] hex::FromHexError),

    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Address mismatch: expected {expected}, got {actual}")]
    AddressMismatch { expected: Address, actual: Address },

    #[error("Signing failed: {0}")]
    SigningFailed(#[from] alloy::signers::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Holds the wallet key and produces message signatures.
///
/// Security notes:
/// - Private keys live inside `PrivateKeySigner`; raw bytes pass through
///   `Zeroizing` during load.
/// - Keys are loaded once at process start; no runtime rotation.
/// - Never log key material or signatures.
pub struct SigningIdentity {
    signer: PrivateKeySigner,
    address: Address,
}

impl std::fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key material is deliberately absent from the Debug output.
        f.debug_struct("SigningIdentity")
            .field("address", &self.address)
            .finish()
    }
}

impl SigningIdentity {
    /// Load the key from the given source and verify the derived address.
    ///
    /// # Errors
    /// Returns `SignerError` if the environment variable is missing, the
    /// file cannot be read, the hex does not decode, the key is invalid,
    /// or the derived address does not match `expected_address`.
    pub fn load(
        source: &KeySource,
        expected_address: Option<Address>,
    ) -> Result<Self, SignerError> {
        fn parse_hex_key(hex_str: &str) -> Result<Zeroizing<Vec<u8>>, SignerError> {
            let trimmed = hex_str.trim().trim_start_matches("0x");
            Ok(Zeroizing::new(hex::decode(trimmed)?))
        }

        let secret_bytes: Zeroizing<Vec<u8>> = match source {
            KeySource::EnvVar { var_name } => {
                let hex = std::env::var(var_name)
                    .map_err(|_| SignerError::EnvVarNotFound(var_name.clone()))?;
                parse_hex_key(&hex)?
            }
            KeySource::File { path } => {
                let content = std::fs::read_to_string(path)?;
                parse_hex_key(&content)?
            }
        };

        Self::from_key_bytes(&secret_bytes, expected_address)
    }

    /// Build from raw key bytes, verifying the derived address.
    pub fn from_key_bytes(
        secret_bytes: &[u8],
        expected_address: Option<Address>,
    ) -> Result<Self, SignerError> {
        let signer = PrivateKeySigner::from_slice(secret_bytes)
            .map_err(|e| SignerError::InvalidKey(e.to_string()))?;

        if let Some(expected) = expected_address {
            if signer.address() != expected {
                return Err(SignerError::AddressMismatch {
                    expected,
                    actual: signer.address(),
                });
            }
        }

        Ok(Self {
            address: signer.address(),
            signer,
        })
    }

    /// The wallet address derived from the key.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign a keccak256 digest.
    pub async fn sign_digest(&self, digest: B256) -> Result<PrimitiveSignature, SignerError> {
        Ok(self.signer.sign_hash(&digest).await?)
    }

    /// Hash a canonical payload and sign it, returning the hex signature
    /// that goes on the wire.
    pub async fn sign_payload(&self, payload: &[u8]) -> Result<String, SignerError> {
        let digest = keccak256(payload);
        let signature = self.sign_digest(digest).await?;
        Ok(format!("0x{}", hex::encode(signature.as_bytes())))
    }
}
