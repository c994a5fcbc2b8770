//! Error classification.
//!
//! Every signing or submission boundary reports its failure as a
//! [`RawFailure`] and converts it with [`classify`], so callers see the same
//! [`ClientError`] vocabulary whichever path failed.

use chain_eth::error::EthError;

use crate::contract::ContractError;
use crate::error::ClientError;
use crate::resolver::ResolverError;
use crate::rpc::RpcError;
use crate::signer::{DeviceError, BLIND_SIGNING_DISABLED, CONDITIONS_OF_USE_NOT_SATISFIED};

/// EIP-1193 code a wallet returns when the user declines a request.
pub const USER_REJECTED_CODE: i64 = 4001;

/// Common shape of a failure before classification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFailure {
    pub code: Option<i64>,
    pub name: Option<String>,
    pub status_text: Option<String>,
    pub message: String,
}

impl RawFailure {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_code(mut self, code: i64) -> Self {
        self.code = Some(code);
        self
    }
}

/// Maps a raw failure onto the client taxonomy.
pub fn classify(failure: &RawFailure) -> ClientError {
    if failure.name.as_deref() == Some(BLIND_SIGNING_DISABLED) {
        return ClientError::BlindSigningRequired;
    }
    if failure.status_text.as_deref() == Some(CONDITIONS_OF_USE_NOT_SATISFIED) {
        return ClientError::UserRejected;
    }
    if failure.code == Some(USER_REJECTED_CODE) {
        return ClientError::UserRejected;
    }
    ClientError::TransactionFailed(failure.message.clone())
}

/// Logs a mutation failure and classifies it.
pub(crate) fn fail(operation: &str, failure: impl Into<RawFailure>) -> ClientError {
    let failure = failure.into();
    let error = classify(&failure);
    tracing::warn!(
        operation,
        code = ?failure.code,
        name = ?failure.name,
        status_text = ?failure.status_text,
        message = %failure.message,
        classified = %error,
        "operation failed"
    );
    error
}

impl From<RawFailure> for ClientError {
    fn from(failure: RawFailure) -> Self {
        classify(&failure)
    }
}

impl From<RpcError> for RawFailure {
    fn from(e: RpcError) -> Self {
        match e {
            RpcError::Response { code, message } => RawFailure::message(message).with_code(code),
            other => RawFailure::message(other.to_string()),
        }
    }
}

impl From<DeviceError> for RawFailure {
    fn from(e: DeviceError) -> Self {
        Self {
            code: None,
            message: e.to_string(),
            name: Some(e.name),
            status_text: e.status_text,
        }
    }
}

impl From<ContractError> for RawFailure {
    fn from(e: ContractError) -> Self {
        match e {
            ContractError::Rpc(rpc) => rpc.into(),
            other => RawFailure::message(other.to_string()),
        }
    }
}

impl From<ResolverError> for RawFailure {
    fn from(e: ResolverError) -> Self {
        RawFailure::message(e.to_string())
    }
}

impl From<EthError> for RawFailure {
    fn from(e: EthError) -> Self {
        RawFailure::message(e.to_string())
    }
}
