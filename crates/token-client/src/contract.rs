//! Provider accessor and contract facade.
//!
//! A [`ContractHandle`] binds one contract address to one [`AbiKind`]. Both
//! the RPC handle and the [`BoundContract`] built on it are created on first
//! use and then reused for the handle's lifetime. Handles are never shared
//! between addresses; addressing another contract means building another
//! handle.

use std::sync::{Arc, OnceLock};

use alloy_primitives::{Address, Bytes, B256};
use alloy_sol_types::SolCall;
use chain_eth::contracts::AbiKind;
use thiserror::Error;

use crate::error::ClientError;
use crate::rpc::{CallRequest, ChainRpc, RpcError};
use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    /// The method is not in the handle's method table. Raised before any I/O.
    #[error("method {method} is not in the {kind} ABI")]
    UnsupportedMethod { method: &'static str, kind: AbiKind },

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error("cannot decode {method} result: {message}")]
    Decode { method: &'static str, message: String },
}

pub struct ContractHandle {
    session: Session,
    address: Address,
    kind: AbiKind,
    provider: OnceLock<Arc<dyn ChainRpc>>,
    instance: OnceLock<BoundContract>,
}

impl ContractHandle {
    /// Binds `address`, or the active network's default deployment for `kind`
    /// when no address is given.
    pub fn new(
        session: &Session,
        address: Option<Address>,
        kind: AbiKind,
    ) -> Result<Self, ClientError> {
        let address = match address {
            Some(address) => address,
            None => session.network().default_contract(kind).ok_or_else(|| {
                ClientError::ConfigurationError(format!(
                    "no {kind} contract configured for {}",
                    session.network().name
                ))
            })?,
        };
        Ok(Self::at(session, address, kind))
    }

    pub fn at(session: &Session, address: Address, kind: AbiKind) -> Self {
        Self {
            session: session.clone(),
            address,
            kind,
            provider: OnceLock::new(),
            instance: OnceLock::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn kind(&self) -> AbiKind {
        self.kind
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// RPC handle for the active network.
    pub fn provider(&self) -> &Arc<dyn ChainRpc> {
        self.provider.get_or_init(|| {
            tracing::trace!(contract = %self.address, "provider attached");
            Arc::clone(self.session.rpc())
        })
    }

    /// The callable contract instance.
    pub fn instance(&self) -> &BoundContract {
        self.instance.get_or_init(|| {
            tracing::trace!(contract = %self.address, kind = %self.kind, "contract instance created");
            BoundContract {
                address: self.address,
                kind: self.kind,
                rpc: Arc::clone(self.provider()),
            }
        })
    }
}

impl std::fmt::Debug for ContractHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractHandle")
            .field("address", &self.address)
            .field("kind", &self.kind)
            .field("instance_created", &self.instance.get().is_some())
            .finish()
    }
}

/// A contract address bound to its method table and an RPC handle.
pub struct BoundContract {
    address: Address,
    kind: AbiKind,
    rpc: Arc<dyn ChainRpc>,
}

impl BoundContract {
    pub fn address(&self) -> Address {
        self.address
    }

    /// Encodes `call`, refusing methods outside this contract's ABI.
    pub fn encode<C: SolCall>(&self, call: &C) -> Result<Bytes, ContractError> {
        if !self.kind.supports_call::<C>() {
            return Err(ContractError::UnsupportedMethod {
                method: C::SIGNATURE,
                kind: self.kind,
            });
        }
        Ok(Bytes::from(call.abi_encode()))
    }

    /// Executes a view call and decodes its return value.
    pub async fn read<C: SolCall>(&self, call: C) -> Result<C::Return, ContractError> {
        let data = self.encode(&call)?;
        let output = self.rpc.call(self.address, data).await?;
        C::abi_decode_returns(&output).map_err(|e| ContractError::Decode {
            method: C::SIGNATURE,
            message: e.to_string(),
        })
    }

    /// Submits `call` from `from` through the connected wallet and returns
    /// the transaction hash.
    pub async fn submit<C: SolCall>(&self, from: Address, call: C) -> Result<B256, ContractError> {
        let data = self.encode(&call)?;
        let tx_hash = self
            .rpc
            .send_transaction(CallRequest {
                from,
                to: self.address,
                data,
            })
            .await?;
        Ok(tx_hash)
    }
}
