use alloy_primitives::Address;
use k256::ecdsa::VerifyingKey;
use sha3::{Digest, Keccak256};

use crate::error::EthError;

/// The all-zero address. Contracts use it as "no value" for optional address
/// fields, e.g. an allow-list entry that is not restricted to one contract.
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Parses a `0x`-prefixed address string.
///
/// All-lowercase and all-uppercase inputs are accepted as-is. Mixed-case input
/// must carry a valid EIP-55 checksum.
pub fn parse_address(address: &str) -> Result<Address, EthError> {
    let hex_part = strip_hex_prefix(address)?;

    if hex_part.len() != 40 {
        return Err(EthError::InvalidAddress(format!(
            "expected 40 hex characters, got {}",
            hex_part.len()
        )));
    }

    if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(EthError::InvalidAddress(
            "address contains non-hex characters".into(),
        ));
    }

    let is_all_lower = hex_part.chars().all(|c| !c.is_ascii_uppercase());
    let is_all_upper = hex_part.chars().all(|c| !c.is_ascii_lowercase());

    if !is_all_lower && !is_all_upper {
        let checksummed = checksum_address(address)?;
        if &checksummed[2..] != hex_part {
            return Err(EthError::InvalidAddress(format!(
                "bad EIP-55 checksum, expected {checksummed}"
            )));
        }
    }

    let bytes = hex::decode(hex_part)
        .map_err(|e| EthError::InvalidAddress(format!("invalid hex: {e}")))?;
    Ok(Address::from_slice(&bytes))
}

/// Maps an optional address onto the zero-address sentinel.
pub fn address_or_zero(address: Option<Address>) -> Address {
    address.unwrap_or(Address::ZERO)
}

/// Inverse of [`address_or_zero`]: the zero sentinel reads back as `None`.
pub fn non_zero(address: Address) -> Option<Address> {
    if address.is_zero() {
        None
    } else {
        Some(address)
    }
}

/// Derives the account address controlled by a secp256k1 public key.
///
/// Keccak-256 over the 64-byte uncompressed key (without the 0x04 prefix);
/// the last 20 bytes are the address.
pub fn verifying_key_to_address(key: &VerifyingKey) -> Address {
    let uncompressed = key.to_encoded_point(false);
    let hash = Keccak256::digest(&uncompressed.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

/// Applies EIP-55 mixed-case checksum encoding to an address string.
pub fn checksum_address(address: &str) -> Result<String, EthError> {
    let hex_part = strip_hex_prefix(address)?.to_lowercase();

    if hex_part.len() != 40 {
        return Err(EthError::InvalidAddress(format!(
            "expected 40 hex characters, got {}",
            hex_part.len()
        )));
    }

    if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(EthError::InvalidAddress(
            "address contains non-hex characters".into(),
        ));
    }

    let hash = Keccak256::digest(hex_part.as_bytes());

    let mut checksummed = String::with_capacity(42);
    checksummed.push_str("0x");

    for (i, c) in hex_part.chars().enumerate() {
        // High nibble for even positions, low nibble for odd ones.
        let nibble = if i % 2 == 0 { hash[i / 2] >> 4 } else { hash[i / 2] & 0x0f };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            checksummed.push(c.to_ascii_uppercase());
        } else {
            checksummed.push(c);
        }
    }

    Ok(checksummed)
}

fn strip_hex_prefix(address: &str) -> Result<&str, EthError> {
    address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .ok_or_else(|| EthError::InvalidAddress("address must start with 0x".into()))
}
