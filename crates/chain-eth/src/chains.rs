use alloy_primitives::{address, Address, U256};
use serde::Serialize;

use crate::contracts::AbiKind;
use crate::error::EthError;

/// Per-network parameters and default contract deployments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkSettings {
    pub chain_id: u64,
    /// Registry key, e.g. `polygon_mainnet`.
    pub name: &'static str,
    pub display_name: &'static str,
    pub transaction_explorer: &'static str,
    pub account_explorer: &'static str,
    pub marketplace_explorer: &'static str,
    /// Gas limit used when a caller does not supply one.
    pub gas_limit: u64,
    pub api_url: &'static str,
    pub blockchain: &'static str,
    pub admin_address: Address,
    pub token_contract: Option<Address>,
    pub bundle_contract: Option<Address>,
    pub allow_list_contract: Option<Address>,
    pub is_testnet: bool,
}

impl NetworkSettings {
    /// Default deployment for the given ABI variant, if one is configured.
    pub fn default_contract(&self, kind: AbiKind) -> Option<Address> {
        match kind {
            AbiKind::Collection => self.token_contract,
            AbiKind::Bundle => self.bundle_contract,
            AbiKind::AllowList => self.allow_list_contract,
        }
    }

    pub fn set_default_contract(&mut self, kind: AbiKind, address: Address) {
        match kind {
            AbiKind::Collection => self.token_contract = Some(address),
            AbiKind::Bundle => self.bundle_contract = Some(address),
            AbiKind::AllowList => self.allow_list_contract = Some(address),
        }
    }

    pub fn transaction_url(&self, tx_hash: &str) -> String {
        format!("{}{}", self.transaction_explorer, tx_hash)
    }

    pub fn account_url(&self, account: Address) -> String {
        format!("{}{}", self.account_explorer, account)
    }

    pub fn marketplace_url(&self, contract: Address, token_id: U256) -> String {
        format!("{}/{}/{}", self.marketplace_explorer, contract, token_id)
    }

    fn validate(&self) -> Result<(), EthError> {
        if self.name.is_empty() {
            return Err(EthError::InvalidNetwork(format!(
                "chain {} has an empty name",
                self.chain_id
            )));
        }
        if self.gas_limit == 0 {
            return Err(EthError::InvalidNetwork(format!(
                "{} has a zero gas limit",
                self.name
            )));
        }
        for url in [
            self.transaction_explorer,
            self.account_explorer,
            self.marketplace_explorer,
        ] {
            if !url.starts_with("https://") {
                return Err(EthError::InvalidNetwork(format!(
                    "{}: explorer url {url} must start with https://",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

const ADMIN_ADDRESS: Address = address!("0xD25A41039DEfD7c7F0fBF6Db3D1Df60b232c6067");

/// Ethereum Mainnet (chain ID 1).
pub const MAINNET: NetworkSettings = NetworkSettings {
    chain_id: 1,
    name: "mainnet",
    display_name: "Ethereum",
    transaction_explorer: "https://etherscan.io/tx/",
    account_explorer: "https://etherscan.io/address/",
    marketplace_explorer: "https://opensea.io/assets/ethereum",
    gas_limit: 400_000,
    api_url: "https://api.rarible.org/v0.1",
    blockchain: "ETHEREUM",
    admin_address: ADMIN_ADDRESS,
    token_contract: Some(address!("0x6B175474E89094C44Da98b954EedeAC495271d0F")),
    bundle_contract: None,
    allow_list_contract: None,
    is_testnet: false,
};

/// Polygon PoS (chain ID 137).
pub const POLYGON_MAINNET: NetworkSettings = NetworkSettings {
    chain_id: 137,
    name: "polygon_mainnet",
    display_name: "Polygon",
    transaction_explorer: "https://polygonscan.com/tx/",
    account_explorer: "https://polygonscan.com/address/",
    marketplace_explorer: "https://opensea.io/assets/matic",
    gas_limit: 400_000,
    api_url: "https://api.rarible.org/v0.1",
    blockchain: "POLYGON",
    admin_address: ADMIN_ADDRESS,
    token_contract: Some(address!("0x8f3Cf7ad23Cd3CaDbD9735AFf958023239c6A063")),
    bundle_contract: None,
    allow_list_contract: None,
    is_testnet: false,
};

/// Sepolia Testnet (chain ID 11155111).
pub const SEPOLIA: NetworkSettings = NetworkSettings {
    chain_id: 11155111,
    name: "sepolia",
    display_name: "Sepolia",
    transaction_explorer: "https://sepolia.etherscan.io/tx/",
    account_explorer: "https://sepolia.etherscan.io/address/",
    marketplace_explorer: "https://testnets.opensea.io/assets/sepolia",
    gas_limit: 400_000,
    api_url: "https://testnet-api.rarible.org/v0.1",
    blockchain: "ETHEREUM",
    admin_address: ADMIN_ADDRESS,
    token_contract: None,
    bundle_contract: None,
    allow_list_contract: None,
    is_testnet: true,
};

/// Polygon Amoy Testnet (chain ID 80002).
pub const POLYGON_AMOY: NetworkSettings = NetworkSettings {
    chain_id: 80002,
    name: "polygon_amoy",
    display_name: "Polygon Amoy",
    transaction_explorer: "https://amoy.polygonscan.com/tx/",
    account_explorer: "https://amoy.polygonscan.com/address/",
    marketplace_explorer: "https://testnets.opensea.io/assets/amoy",
    gas_limit: 400_000,
    api_url: "https://testnet-api.rarible.org/v0.1",
    blockchain: "POLYGON",
    admin_address: ADMIN_ADDRESS,
    token_contract: None,
    bundle_contract: None,
    allow_list_contract: None,
    is_testnet: true,
};

/// Name reported for chains that are unknown or not enabled.
pub const UNKNOWN_NETWORK: &str = "unknown";

/// Immutable set of networks keyed by chain id.
///
/// Built once and validated up front so call sites never look networks up by
/// free-form name.
#[derive(Debug, Clone)]
pub struct NetworkRegistry {
    networks: Vec<NetworkSettings>,
}

impl NetworkRegistry {
    pub fn new(networks: Vec<NetworkSettings>) -> Result<Self, EthError> {
        for (i, network) in networks.iter().enumerate() {
            network.validate()?;
            if networks[..i].iter().any(|n| n.chain_id == network.chain_id) {
                return Err(EthError::InvalidNetwork(format!(
                    "duplicate chain id {}",
                    network.chain_id
                )));
            }
            if networks[..i].iter().any(|n| n.name == network.name) {
                return Err(EthError::InvalidNetwork(format!(
                    "duplicate network name {}",
                    network.name
                )));
            }
        }
        Ok(Self { networks })
    }

    /// The networks this client ships with.
    pub fn builtin() -> Self {
        Self {
            networks: vec![MAINNET, POLYGON_MAINNET, SEPOLIA, POLYGON_AMOY],
        }
    }

    pub fn get(&self, chain_id: u64) -> Option<&NetworkSettings> {
        self.networks.iter().find(|n| n.chain_id == chain_id)
    }

    pub fn require(&self, chain_id: u64) -> Result<&NetworkSettings, EthError> {
        self.get(chain_id).ok_or(EthError::UnsupportedChain(chain_id))
    }

    /// Case-insensitive lookup by registry key.
    pub fn by_name(&self, name: &str) -> Option<&NetworkSettings> {
        self.networks
            .iter()
            .find(|n| n.name.eq_ignore_ascii_case(name))
    }

    /// Registry key for a chain id, or [`UNKNOWN_NETWORK`] when the chain is
    /// not registered or `is_enabled` rejects it.
    pub fn name_for_chain<F>(&self, chain_id: u64, is_enabled: F) -> &'static str
    where
        F: Fn(&NetworkSettings) -> bool,
    {
        match self.get(chain_id) {
            Some(network) if is_enabled(network) => network.name,
            _ => UNKNOWN_NETWORK,
        }
    }

    /// Returns a registry where `chain_id` uses `address` as the default
    /// deployment for `kind`.
    pub fn with_contract(
        mut self,
        chain_id: u64,
        kind: AbiKind,
        address: Address,
    ) -> Result<Self, EthError> {
        let network = self
            .networks
            .iter_mut()
            .find(|n| n.chain_id == chain_id)
            .ok_or(EthError::UnsupportedChain(chain_id))?;
        network.set_default_contract(kind, address);
        Self::new(self.networks)
    }

    pub fn networks(&self) -> &[NetworkSettings] {
        &self.networks
    }
}

impl Default for NetworkRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
