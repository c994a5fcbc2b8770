use alloy_primitives::Address;
use bip32::{DerivationPath, XPrv};
use bip39::{Language, Mnemonic};
use chain_eth::address::verifying_key_to_address;
use k256::ecdsa::SigningKey;
use zeroize::Zeroize;

use crate::error::KeyError;

/// Account path hardware Ethereum apps sign with by default.
pub const DEFAULT_ETH_PATH: &str = "44'/60'/0'/0/0";

/// BIP-44 Ethereum path for an account/index pair, in device form (no `m/`).
pub fn eth_derivation_path(account: u32, index: u32) -> String {
    format!("44'/60'/{account}'/0/{index}")
}

/// Derive the 64-byte BIP-39 seed for a mnemonic and optional passphrase.
/// Caller MUST zeroize the returned seed when done.
pub fn mnemonic_to_seed(phrase: &str, passphrase: &str) -> Result<[u8; 64], KeyError> {
    let mnemonic = Mnemonic::parse_in_normalized(Language::English, phrase)
        .map_err(|e| KeyError::InvalidMnemonic(e.to_string()))?;
    Ok(mnemonic.to_seed(passphrase))
}

/// Derive the secp256k1 key at `path` (`m/` prefix optional).
pub fn derive_secp256k1_key(seed: &[u8], path: &str) -> Result<DerivedKey, KeyError> {
    let path_str = if path.starts_with("m/") {
        path.to_string()
    } else {
        format!("m/{path}")
    };

    let derivation: DerivationPath = path_str
        .parse()
        .map_err(|e: bip32::Error| KeyError::DerivationFailed(e.to_string()))?;

    let xprv = XPrv::derive_from_path(seed, &derivation)
        .map_err(|e| KeyError::DerivationFailed(e.to_string()))?;

    let mut private_key: [u8; 32] = xprv.to_bytes().into();
    let signing_key = match SigningKey::from_bytes(&private_key.into()) {
        Ok(key) => key,
        Err(e) => {
            private_key.zeroize();
            return Err(KeyError::DerivationFailed(e.to_string()));
        }
    };

    Ok(DerivedKey {
        private_key,
        address: verifying_key_to_address(signing_key.verifying_key()),
        derivation_path: path_str,
    })
}

/// Derived secp256k1 key and the account it controls.
pub struct DerivedKey {
    pub private_key: [u8; 32],
    pub address: Address,
    pub derivation_path: String,
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.private_key.zeroize();
    }
}
