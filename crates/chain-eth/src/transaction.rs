use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_rlp::{Decodable, Encodable, RlpDecodable, RlpEncodable};
use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use sha3::{Digest, Keccak256};
use zeroize::Zeroize;

use crate::address::verifying_key_to_address;
use crate::error::EthError;

/// An unsigned legacy contract call, signed EIP-155 style.
///
/// One value is built per broadcast attempt. Reassembly consumes it, so the
/// same transaction cannot be signed and submitted twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    pub to: Address,
    /// Encoded contract call.
    pub data: Bytes,
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
    pub chain_id: u64,
}

/// Signature components returned by an external signer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureEnvelope {
    pub r: U256,
    pub s: U256,
    /// `v` exactly as the signer reported it.
    pub v: u64,
    pub from: Address,
}

/// A signed transaction ready for broadcast.
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    /// RLP-encoded signed transaction bytes.
    pub raw_tx: Vec<u8>,
    pub tx_hash: B256,
}

/// The fields recovered from a broadcast-ready legacy transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTransaction {
    pub tx: UnsignedTransaction,
    pub v: u64,
    pub r: U256,
    pub s: U256,
}

impl SignatureEnvelope {
    /// Normalizes hex components as hardware wallets return them (with or
    /// without a `0x` prefix).
    pub fn from_hex_parts(r: &str, s: &str, v: &str, from: Address) -> Result<Self, EthError> {
        Ok(Self {
            r: parse_hex_u256(r, "r")?,
            s: parse_hex_u256(s, "s")?,
            v: parse_hex_u64(v, "v")?,
            from,
        })
    }

    /// Reduces `v` to the secp256k1 recovery parity for `chain_id`.
    ///
    /// Accepts `0/1`, pre-EIP-155 `27/28`, full EIP-155 values and EIP-155
    /// values truncated to their low byte.
    ///
    /// When the chain's EIP-155 `v` no longer fits a byte, a single-byte `v`
    /// is read as truncated first, even if it also looks like `0/1` or `27/28`.
    pub fn y_parity(&self, chain_id: u64) -> Result<bool, EthError> {
        let base = eip155_v_base(chain_id)?;
        let truncated = self.v.wrapping_sub(base) & 0xff;
        if base > 0xff && self.v <= 0xff && truncated <= 1 {
            return Ok(truncated == 1);
        }
        match self.v {
            0 | 1 => return Ok(self.v == 1),
            27 | 28 => return Ok(self.v == 28),
            _ => {}
        }
        match truncated {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(EthError::InvalidSignature(format!(
                "v {} does not match chain id {chain_id}",
                self.v
            ))),
        }
    }
}

impl UnsignedTransaction {
    /// EIP-155 signing payload:
    /// `rlp([nonce, gas_price, gas_limit, to, 0, data, chain_id, 0, 0])`.
    pub fn signing_payload(&self) -> Vec<u8> {
        let fields = SigningFields {
            nonce: self.nonce,
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            to: self.to,
            value: U256::ZERO,
            data: self.data.clone(),
            chain_id: self.chain_id,
            empty_r: 0,
            empty_s: 0,
        };

        let mut rlp_buf = Vec::with_capacity(fields.length());
        fields.encode(&mut rlp_buf);
        rlp_buf
    }

    /// The payload as the hex string a hardware device expects (no `0x`).
    pub fn signing_payload_hex(&self) -> String {
        hex::encode(self.signing_payload())
    }

    /// Keccak-256 of the signing payload.
    pub fn signing_hash(&self) -> B256 {
        B256::from_slice(&Keccak256::digest(self.signing_payload()))
    }

    /// Combines the transaction with an external signature.
    ///
    /// `r` and `s` are copied through untouched; `v` is written in canonical
    /// EIP-155 form for this transaction's chain id.
    pub fn into_signed(self, signature: &SignatureEnvelope) -> Result<SignedTransaction, EthError> {
        let parity = signature.y_parity(self.chain_id)?;
        let v = eip155_v_base(self.chain_id)? + u64::from(parity);

        let fields = SignedFields {
            nonce: self.nonce,
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            to: self.to,
            value: U256::ZERO,
            data: self.data,
            v,
            r: signature.r,
            s: signature.s,
        };

        let mut raw_tx = Vec::with_capacity(fields.length());
        fields.encode(&mut raw_tx);

        let tx_hash = B256::from_slice(&Keccak256::digest(&raw_tx));
        Ok(SignedTransaction { raw_tx, tx_hash })
    }
}

impl DecodedTransaction {
    /// Recovers the account that produced the signature.
    pub fn recover_signer(&self) -> Result<Address, EthError> {
        let envelope = SignatureEnvelope {
            r: self.r,
            s: self.s,
            v: self.v,
            from: Address::ZERO,
        };
        let recovery_id = RecoveryId::new(envelope.y_parity(self.tx.chain_id)?, false);
        let signature = Signature::from_scalars(self.r.to_be_bytes::<32>(), self.s.to_be_bytes::<32>())
            .map_err(|e| EthError::InvalidSignature(e.to_string()))?;

        let key = VerifyingKey::recover_from_prehash(
            self.tx.signing_hash().as_slice(),
            &signature,
            recovery_id,
        )
        .map_err(|e| EthError::InvalidSignature(e.to_string()))?;
        Ok(verifying_key_to_address(&key))
    }
}

/// Decodes an EIP-155 signing payload back into the unsigned transaction.
pub fn decode_signing_payload(payload: &[u8]) -> Result<UnsignedTransaction, EthError> {
    let mut buf = payload;
    let fields = SigningFields::decode(&mut buf)?;
    if !buf.is_empty() {
        return Err(EthError::EncodingError("trailing bytes after payload".into()));
    }
    if fields.empty_r != 0 || fields.empty_s != 0 {
        return Err(EthError::EncodingError("payload is not an EIP-155 signing payload".into()));
    }
    ensure_no_value(fields.value)?;

    Ok(UnsignedTransaction {
        to: fields.to,
        data: fields.data,
        nonce: fields.nonce,
        gas_price: fields.gas_price,
        gas_limit: fields.gas_limit,
        chain_id: fields.chain_id,
    })
}

/// Decodes a signed legacy transaction. Only EIP-155 (replay-protected)
/// transactions are accepted, since the chain id is recovered from `v`.
pub fn decode_signed(raw_tx: &[u8]) -> Result<DecodedTransaction, EthError> {
    let mut buf = raw_tx;
    let fields = SignedFields::decode(&mut buf)?;
    if !buf.is_empty() {
        return Err(EthError::EncodingError("trailing bytes after transaction".into()));
    }
    ensure_no_value(fields.value)?;

    if fields.v < 35 {
        return Err(EthError::InvalidSignature(format!(
            "v {} is not replay protected",
            fields.v
        )));
    }
    let chain_id = (fields.v - 35) / 2;

    Ok(DecodedTransaction {
        tx: UnsignedTransaction {
            to: fields.to,
            data: fields.data,
            nonce: fields.nonce,
            gas_price: fields.gas_price,
            gas_limit: fields.gas_limit,
            chain_id,
        },
        v: fields.v,
        r: fields.r,
        s: fields.s,
    })
}

/// Signs an EIP-155 signing payload with a secp256k1 private key.
///
/// Returns the signature with `v` in EIP-155 form and `from` set to the
/// key's address.
pub fn sign_payload(payload: &[u8], private_key: &[u8; 32]) -> Result<SignatureEnvelope, EthError> {
    let tx = decode_signing_payload(payload)?;
    let msg_hash = Keccak256::digest(payload);

    let mut key_bytes = *private_key;
    let signing_key = SigningKey::from_bytes((&key_bytes).into())
        .map_err(|e| EthError::InvalidPrivateKey(e.to_string()));
    key_bytes.zeroize();
    let signing_key = signing_key?;

    let (signature, recovery_id): (Signature, RecoveryId) = signing_key
        .sign_prehash(msg_hash.as_slice())
        .map_err(|e| EthError::SigningError(e.to_string()))?;

    let r_generic = signature.r().to_bytes();
    let s_generic = signature.s().to_bytes();
    let mut r_bytes = [0u8; 32];
    let mut s_bytes = [0u8; 32];
    r_bytes.copy_from_slice(&r_generic);
    s_bytes.copy_from_slice(&s_generic);

    Ok(SignatureEnvelope {
        r: U256::from_be_bytes(r_bytes),
        s: U256::from_be_bytes(s_bytes),
        v: eip155_v_base(tx.chain_id)? + u64::from(recovery_id.is_y_odd()),
        from: verifying_key_to_address(signing_key.verifying_key()),
    })
}

fn eip155_v_base(chain_id: u64) -> Result<u64, EthError> {
    chain_id
        .checked_mul(2)
        .and_then(|v| v.checked_add(35))
        .ok_or(EthError::UnsupportedChain(chain_id))
}

fn ensure_no_value(value: U256) -> Result<(), EthError> {
    if value.is_zero() {
        Ok(())
    } else {
        Err(EthError::EncodingError("native value transfers are not supported".into()))
    }
}

fn strip_hex(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

fn parse_hex_u256(value: &str, field: &str) -> Result<U256, EthError> {
    let digits = strip_hex(value);
    if digits.is_empty() || digits.len() > 64 {
        return Err(EthError::InvalidSignature(format!(
            "{field} must be 1..=64 hex digits, got {}",
            digits.len()
        )));
    }
    U256::from_str_radix(digits, 16)
        .map_err(|e| EthError::InvalidSignature(format!("{field}: {e}")))
}

fn parse_hex_u64(value: &str, field: &str) -> Result<u64, EthError> {
    u64::from_str_radix(strip_hex(value), 16)
        .map_err(|e| EthError::InvalidSignature(format!("{field}: {e}")))
}

// ---------------------------------------------------------------------------
// RLP-encodable structures
// ---------------------------------------------------------------------------

/// EIP-155 signing fields: the legacy list with `[chain_id, 0, 0]` appended.
#[derive(RlpEncodable, RlpDecodable)]
struct SigningFields {
    nonce: u64,
    gas_price: u128,
    gas_limit: u64,
    to: Address,
    value: U256,
    data: Bytes,
    chain_id: u64,
    empty_r: u8,
    empty_s: u8,
}

/// Signed legacy transaction fields.
#[derive(RlpEncodable, RlpDecodable)]
struct SignedFields {
    nonce: u64,
    gas_price: u128,
    gas_limit: u64,
    to: Address,
    value: U256,
    data: Bytes,
    v: u64,
    r: U256,
    s: U256,
}
