//! Client for NFT collection, bundle and allow-list contracts on EVM chains.
//!
//! Two authorization paths are supported:
//! - connected wallet: [`TokenContract::call_method`] submits through the RPC
//!   endpoint, which signs on the caller's behalf
//! - hardware wallet: [`TokenContract::make_plain_transaction`] assembles,
//!   resolves, signs and broadcasts the transaction itself
//!
//! Failures on either path are reported as [`ClientError`]. Reads degrade
//! gracefully instead.

pub mod allow_list;
pub mod approval;
pub mod classify;
pub mod config;
pub mod contract;
pub mod dispatch;
pub mod error;
pub mod hd_derivation;
pub mod manual;
pub mod progress;
pub mod read;
pub mod resolver;
pub mod rpc;
pub mod session;
pub mod signer;
pub mod telemetry;
pub mod token;
pub mod types;

pub use chain_eth::contracts::AbiKind;
pub use classify::{classify, RawFailure};
pub use config::ClientConfig;
pub use contract::{BoundContract, ContractError, ContractHandle};
pub use error::ClientError;
pub use manual::HardwareWallet;
pub use progress::{ProcessStatus, ProgressSink, SilentProgress};
pub use resolver::{HttpResolver, NoResolution, Resolution, ResolutionConfig, TransactionResolver};
pub use rpc::{AlloyRpc, BlockTag, CallRequest, ChainRpc, RpcError, TxReceipt};
pub use session::Session;
pub use signer::{DeviceError, DeviceSignature, HardwareSigner, SeedSigner};
pub use token::TokenContract;
pub use types::{
    AllowListRegistration, ApprovalTarget, AssetMetadata, BalanceState, ContractMeta, TokenRef,
    WhiteListEntry,
};
