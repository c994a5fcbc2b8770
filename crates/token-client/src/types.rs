use std::fmt;
use std::str::FromStr;

use alloy_primitives::{Address, U256};
use chain_eth::address::parse_address;
use chain_eth::contracts::{BundleItem, EffectInfo};
use serde::Serialize;

use crate::error::ClientError;

/// One token owned by an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRef {
    pub token_id: U256,
    pub contract_address: Address,
    pub owner_address: Address,
}

/// Whether a balance has been read yet, and for whom. A fetched zero is a
/// real answer, unlike [`BalanceState::Unknown`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "value")]
pub enum BalanceState {
    #[default]
    Unknown,
    Fetched { owner: Address, balance: u64 },
}

impl BalanceState {
    pub fn known(&self) -> Option<u64> {
        match self {
            BalanceState::Unknown => None,
            BalanceState::Fetched { balance, .. } => Some(*balance),
        }
    }

    /// The fetched balance, only if it was read for `identity`.
    pub fn known_for(&self, identity: Address) -> Option<u64> {
        match self {
            BalanceState::Fetched { owner, balance } if *owner == identity => Some(*balance),
            _ => None,
        }
    }

    pub fn owner(&self) -> Option<Address> {
        match self {
            BalanceState::Unknown => None,
            BalanceState::Fetched { owner, .. } => Some(*owner),
        }
    }

    /// Balance for display; unknown reads as zero.
    pub fn value(&self) -> u64 {
        self.known().unwrap_or(0)
    }
}

/// Collection view for one account, filled in place by the read path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetMetadata {
    pub address: Address,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub tokens: Vec<TokenRef>,
    pub balance: BalanceState,
}

impl AssetMetadata {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            name: None,
            symbol: None,
            tokens: Vec::new(),
            balance: BalanceState::Unknown,
        }
    }
}

/// A token to approve, written `"<contract>:<tokenId>"` in text form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalTarget {
    pub contract: Address,
    pub token_id: U256,
}

impl ApprovalTarget {
    pub fn new(contract: Address, token_id: U256) -> Self {
        Self { contract, token_id }
    }
}

impl FromStr for ApprovalTarget {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (contract, token_id) = s.split_once(':').ok_or_else(|| {
            ClientError::TransactionFailed(format!("expected <contract>:<tokenId>, got {s}"))
        })?;
        let contract = parse_address(contract.trim())?;
        let token_id = U256::from_str(token_id.trim()).map_err(|e| {
            ClientError::TransactionFailed(format!("invalid token id {token_id}: {e}"))
        })?;
        Ok(Self { contract, token_id })
    }
}

impl fmt::Display for ApprovalTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.contract, self.token_id)
    }
}

impl From<ApprovalTarget> for BundleItem {
    fn from(target: ApprovalTarget) -> Self {
        BundleItem {
            token: target.contract,
            tokenId: target.token_id,
        }
    }
}

impl From<BundleItem> for ApprovalTarget {
    fn from(item: BundleItem) -> Self {
        ApprovalTarget::new(item.token, item.tokenId)
    }
}

/// Name, symbol and supply of a registered modifier contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractMeta {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub total_supply: U256,
}

/// One allow-list entry as read from chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WhiteListEntry {
    pub contract_address: Address,
    pub server_url: String,
    pub owner: Address,
    /// Original contract the modifier is restricted to, if any.
    pub only_for: Option<Address>,
    pub meta: Option<ContractMeta>,
}

impl From<EffectInfo> for WhiteListEntry {
    fn from(info: EffectInfo) -> Self {
        WhiteListEntry {
            contract_address: info.modificatorsContract,
            server_url: info.serverUrl,
            owner: info.owner,
            only_for: chain_eth::address::non_zero(info.originalContract),
            meta: None,
        }
    }
}

/// A modifier contract to register on the allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowListRegistration {
    pub contract_address: Address,
    pub server_url: String,
    pub owner: Address,
    pub only_for: Option<Address>,
}

impl From<AllowListRegistration> for EffectInfo {
    fn from(entry: AllowListRegistration) -> Self {
        EffectInfo {
            modificatorsContract: entry.contract_address,
            serverUrl: entry.server_url,
            owner: entry.owner,
            originalContract: chain_eth::address::address_or_zero(entry.only_for),
        }
    }
}
