use chain_eth::error::EthError;
use thiserror::Error;

/// The error vocabulary every client operation reports.
///
/// Mutation paths (approve, mint, transfer, bundle, manual signing) always
/// surface one of these; read paths log and degrade instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The signer explicitly declined, either by rejection code or device policy.
    #[error("user rejected the transaction")]
    UserRejected,

    /// The hardware device refuses to sign contract data until blind signing is enabled.
    #[error("enable blind signing (contract data) in the device's Ethereum app")]
    BlindSigningRequired,

    #[error("transaction failed: {0}")]
    TransactionFailed(String),

    #[error("configuration error: {0}")]
    ConfigurationError(String),
}

/// Key material errors raised while deriving development signing keys.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("key derivation failed: {0}")]
    DerivationFailed(String),
}

impl From<EthError> for ClientError {
    fn from(e: EthError) -> Self {
        match e {
            EthError::UnsupportedChain(_) | EthError::InvalidNetwork(_) => {
                ClientError::ConfigurationError(e.to_string())
            }
            other => ClientError::TransactionFailed(other.to_string()),
        }
    }
}
