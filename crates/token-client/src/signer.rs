//! Hardware signer boundary.

use alloy_primitives::Address;
use async_trait::async_trait;
use chain_eth::transaction::sign_payload;
use secrecy::{ExposeSecret, SecretBox};
use thiserror::Error;
use zeroize::Zeroize;

use crate::error::KeyError;
use crate::hd_derivation::{derive_secp256k1_key, mnemonic_to_seed};
use crate::resolver::Resolution;

/// Device error name raised when contract data signing is disabled.
pub const BLIND_SIGNING_DISABLED: &str = "EthAppPleaseEnableContractData";

/// Device status text for a declined or aborted request.
pub const CONDITIONS_OF_USE_NOT_SATISFIED: &str = "CONDITIONS_OF_USE_NOT_SATISFIED";

/// Signature components as an Ethereum device app returns them: hex strings
/// without a `0x` prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSignature {
    pub r: String,
    pub s: String,
    pub v: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{name}: {message}")]
pub struct DeviceError {
    pub name: String,
    pub status_text: Option<String>,
    pub message: String,
}

impl DeviceError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status_text: None,
            message: message.into(),
        }
    }

    pub fn with_status_text(mut self, status_text: impl Into<String>) -> Self {
        self.status_text = Some(status_text.into());
        self
    }

    pub fn blind_signing_disabled() -> Self {
        Self::new(
            BLIND_SIGNING_DISABLED,
            "Please enable Blind signing or Contract data in the Ethereum app Settings",
        )
    }

    pub fn declined() -> Self {
        Self::new("TransportStatusError", "Ledger device: Condition of use not satisfied")
            .with_status_text(CONDITIONS_OF_USE_NOT_SATISFIED)
    }
}

impl From<KeyError> for DeviceError {
    fn from(e: KeyError) -> Self {
        DeviceError::new("KeyError", e.to_string())
    }
}

#[async_trait]
pub trait HardwareSigner: Send + Sync {
    /// Signs a hex EIP-155 payload (no `0x`) with the key at `path`.
    async fn sign_transaction(
        &self,
        path: &str,
        raw_tx_hex: &str,
        resolution: &Resolution,
    ) -> Result<DeviceSignature, DeviceError>;
}

/// In-process signer backed by a BIP-39 seed. Answers exactly like a device
/// would, so the manual pipeline can run without hardware.
pub struct SeedSigner {
    seed: SecretBox<[u8; 64]>,
}

impl SeedSigner {
    pub fn from_mnemonic(phrase: &str, passphrase: &str) -> Result<Self, KeyError> {
        let mut seed = mnemonic_to_seed(phrase, passphrase)?;
        let signer = Self {
            seed: SecretBox::new(Box::new(seed)),
        };
        seed.zeroize();
        Ok(signer)
    }

    /// Account controlled by the key at `path`.
    pub fn address(&self, path: &str) -> Result<Address, KeyError> {
        let key = derive_secp256k1_key(self.seed.expose_secret(), path)?;
        Ok(key.address)
    }
}

#[async_trait]
impl HardwareSigner for SeedSigner {
    async fn sign_transaction(
        &self,
        path: &str,
        raw_tx_hex: &str,
        _resolution: &Resolution,
    ) -> Result<DeviceSignature, DeviceError> {
        let payload = hex::decode(raw_tx_hex)
            .map_err(|e| DeviceError::new("InvalidPayload", e.to_string()))?;
        let key = derive_secp256k1_key(self.seed.expose_secret(), path)?;

        let signature = sign_payload(&payload, &key.private_key)
            .map_err(|e| DeviceError::new("SigningError", e.to_string()))?;
        tracing::debug!(path, from = %signature.from, "payload signed with seed key");

        Ok(DeviceSignature {
            r: hex::encode(signature.r.to_be_bytes::<32>()),
            s: hex::encode(signature.s.to_be_bytes::<32>()),
            v: format!("{:x}", signature.v),
        })
    }
}
