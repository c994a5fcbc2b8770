//! Chain RPC boundary.
//!
//! [`ChainRpc`] is the narrow set of JSON-RPC operations the client consumes.
//! [`AlloyRpc`] implements it over an HTTP [`RootProvider`]; tests substitute
//! an in-memory double.

use std::time::Duration;

use alloy_network::{Ethereum, ReceiptResponse, TransactionBuilder};
use alloy_primitives::{Address, Bytes, B256};
use alloy_provider::{PendingTransactionBuilder, PendingTransactionError, Provider, RootProvider};
use alloy_rpc_types_eth::TransactionRequest;
use alloy_transport::TransportError;
use async_trait::async_trait;
use thiserror::Error;
use url::Url;

/// Block a nonce is read at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTag {
    Latest,
    Pending,
}

/// A contract call the connected wallet signs and submits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
}

/// The parts of a mined receipt the client reports back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub transaction_hash: B256,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    /// `true` when execution succeeded.
    pub status: bool,
    pub from: Address,
    pub to: Option<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    /// JSON-RPC error response; `code` is kept so wallet rejections (4001)
    /// can be told apart from node errors.
    #[error("rpc error {code}: {message}")]
    Response { code: i64, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("receipt for {0} not available: {1}")]
    Receipt(B256, String),
}

#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// `eth_call` against the latest block.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, RpcError>;

    /// `eth_sendTransaction`; the connected wallet signs.
    async fn send_transaction(&self, request: CallRequest) -> Result<B256, RpcError>;

    async fn transaction_count(&self, address: Address, block: BlockTag) -> Result<u64, RpcError>;

    async fn gas_price(&self) -> Result<u128, RpcError>;

    async fn send_raw_transaction(&self, raw_tx: &[u8]) -> Result<B256, RpcError>;

    /// Waits until `tx_hash` is mined and returns its receipt.
    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TxReceipt, RpcError>;
}

/// [`ChainRpc`] over an HTTP JSON-RPC endpoint.
#[derive(Debug, Clone)]
pub struct AlloyRpc {
    provider: RootProvider<Ethereum>,
    receipt_timeout: Duration,
}

impl AlloyRpc {
    pub fn connect_http(url: Url, receipt_timeout: Duration) -> Self {
        tracing::debug!(%url, "connecting json-rpc provider");
        Self {
            provider: RootProvider::new_http(url),
            receipt_timeout,
        }
    }
}

#[async_trait]
impl ChainRpc for AlloyRpc {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, RpcError> {
        let request = TransactionRequest::default().with_to(to).with_input(data);
        Ok(self.provider.call(request).await?)
    }

    async fn send_transaction(&self, request: CallRequest) -> Result<B256, RpcError> {
        let tx = TransactionRequest::default()
            .with_from(request.from)
            .with_to(request.to)
            .with_input(request.data);
        let pending = self.provider.send_transaction(tx).await?;
        Ok(*pending.tx_hash())
    }

    async fn transaction_count(&self, address: Address, block: BlockTag) -> Result<u64, RpcError> {
        let count = self.provider.get_transaction_count(address);
        let nonce = match block {
            BlockTag::Latest => count.latest().await?,
            BlockTag::Pending => count.pending().await?,
        };
        Ok(nonce)
    }

    async fn gas_price(&self) -> Result<u128, RpcError> {
        Ok(self.provider.get_gas_price().await?)
    }

    async fn send_raw_transaction(&self, raw_tx: &[u8]) -> Result<B256, RpcError> {
        let pending = self.provider.send_raw_transaction(raw_tx).await?;
        Ok(*pending.tx_hash())
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TxReceipt, RpcError> {
        let receipt = PendingTransactionBuilder::new(self.provider.clone(), tx_hash)
            .with_timeout(Some(self.receipt_timeout))
            .get_receipt()
            .await
            .map_err(|e| match e {
                PendingTransactionError::TransportError(e) => RpcError::from(e),
                other => RpcError::Receipt(tx_hash, other.to_string()),
            })?;

        Ok(TxReceipt {
            transaction_hash: receipt.transaction_hash(),
            block_number: receipt.block_number(),
            gas_used: receipt.gas_used(),
            status: receipt.status(),
            from: receipt.from(),
            to: receipt.to(),
        })
    }
}

impl From<TransportError> for RpcError {
    fn from(e: TransportError) -> Self {
        match e.as_error_resp() {
            Some(payload) => RpcError::Response {
                code: payload.code,
                message: payload.message.to_string(),
            },
            None => RpcError::Transport(e.to_string()),
        }
    }
}

/// A [`ChainRpc`] with no chain behind it; every request fails.
#[cfg(test)]
pub(crate) struct OfflineRpc;

#[cfg(test)]
#[async_trait]
impl ChainRpc for OfflineRpc {
    async fn call(&self, _to: Address, _data: Bytes) -> Result<Bytes, RpcError> {
        Err(RpcError::Transport("offline".into()))
    }

    async fn send_transaction(&self, _request: CallRequest) -> Result<B256, RpcError> {
        Err(RpcError::Transport("offline".into()))
    }

    async fn transaction_count(&self, _address: Address, _block: BlockTag) -> Result<u64, RpcError> {
        Err(RpcError::Transport("offline".into()))
    }

    async fn gas_price(&self) -> Result<u128, RpcError> {
        Err(RpcError::Transport("offline".into()))
    }

    async fn send_raw_transaction(&self, _raw_tx: &[u8]) -> Result<B256, RpcError> {
        Err(RpcError::Transport("offline".into()))
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TxReceipt, RpcError> {
        Err(RpcError::Receipt(tx_hash, "offline".into()))
    }
}
