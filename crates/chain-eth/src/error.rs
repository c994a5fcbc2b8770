use thiserror::Error;

/// EVM primitive errors: addresses, encoding, signing and network settings.
#[derive(Debug, Error)]
pub enum EthError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("signing error: {0}")]
    SigningError(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("unsupported chain: {0}")]
    UnsupportedChain(u64),

    #[error("invalid network settings: {0}")]
    InvalidNetwork(String),
}

impl From<alloy_rlp::Error> for EthError {
    fn from(e: alloy_rlp::Error) -> Self {
        EthError::EncodingError(format!("rlp: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_address() {
        let err = EthError::InvalidAddress("bad checksum".into());
        assert_eq!(err.to_string(), "invalid address: bad checksum");
    }

    #[test]
    fn display_invalid_signature() {
        let err = EthError::InvalidSignature("v out of range".into());
        assert_eq!(err.to_string(), "invalid signature: v out of range");
    }

    #[test]
    fn display_unsupported_chain() {
        let err = EthError::UnsupportedChain(999);
        assert_eq!(err.to_string(), "unsupported chain: 999");
    }

    #[test]
    fn display_invalid_network() {
        let err = EthError::InvalidNetwork("duplicate chain id 1".into());
        assert_eq!(err.to_string(), "invalid network settings: duplicate chain id 1");
    }

    #[test]
    fn rlp_errors_become_encoding_errors() {
        let err: EthError = alloy_rlp::Error::InputTooShort.into();
        assert!(matches!(err, EthError::EncodingError(_)));
        assert!(err.to_string().starts_with("encoding error: rlp:"));
    }
}
