//! Client configuration.
//!
//! Loaded from a JSON file or from `TOKEN_CLIENT_*` environment variables.
//! In JSON, string values written as `$VAR` or `${VAR}` are read from the
//! environment at load time:
//!
//! ```json
//! {
//!   "rpc_url": "$POLYGON_RPC_URL",
//!   "chain_id": 137,
//!   "contracts": { "bundle": "0x..." }
//! }
//! ```

use std::ops::Deref;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use alloy_primitives::Address;
use chain_eth::chains::NetworkRegistry;
use chain_eth::contracts::AbiKind;
use serde::Deserialize;
use url::Url;

use crate::error::ClientError;
use crate::hd_derivation::DEFAULT_ETH_PATH;
use crate::resolver::{HttpResolver, NoResolution, TransactionResolver};
use crate::session::DEFAULT_GAS_LIMIT_CEILING;

const DEFAULT_RECEIPT_TIMEOUT_SECS: u64 = 120;

/// A value given either literally or as an environment variable reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralOrEnv<T>(T);

impl<T> LiteralOrEnv<T> {
    pub fn from_literal(value: T) -> Self {
        Self(value)
    }

    pub fn inner(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }

    /// Variable name referenced by `$VAR` / `${VAR}`, if `s` is a reference.
    fn env_var_name(s: &str) -> Option<&str> {
        if let Some(braced) = s.strip_prefix("${").and_then(|rest| rest.strip_suffix('}')) {
            return Some(braced);
        }
        let name = s.strip_prefix('$')?;
        if !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_') {
            Some(name)
        } else {
            None
        }
    }
}

impl<T> Deref for LiteralOrEnv<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'de, T> Deserialize<'de> for LiteralOrEnv<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;

        let value = match Self::env_var_name(&raw) {
            Some(var) => std::env::var(var).map_err(|_| {
                serde::de::Error::custom(format!(
                    "environment variable '{var}' not found (referenced as '{raw}')"
                ))
            })?,
            None => raw,
        };

        value
            .parse::<T>()
            .map(LiteralOrEnv)
            .map_err(|e| serde::de::Error::custom(format!("failed to parse value: {e}")))
    }
}

/// Per-variant contract addresses replacing the network defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ContractOverrides {
    #[serde(default)]
    pub token: Option<Address>,
    #[serde(default)]
    pub bundle: Option<Address>,
    #[serde(default)]
    pub allow_list: Option<Address>,
}

impl ContractOverrides {
    fn entries(&self) -> impl Iterator<Item = (AbiKind, Address)> + '_ {
        [
            (AbiKind::Collection, self.token),
            (AbiKind::Bundle, self.bundle),
            (AbiKind::AllowList, self.allow_list),
        ]
        .into_iter()
        .filter_map(|(kind, address)| address.map(|a| (kind, a)))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub rpc_url: LiteralOrEnv<Url>,
    pub chain_id: u64,
    /// Device derivation path, without the `m/` prefix.
    #[serde(default = "default_derivation_path")]
    pub derivation_path: String,
    #[serde(default = "default_gas_limit_ceiling")]
    pub gas_limit_ceiling: u64,
    #[serde(default = "default_receipt_timeout_secs")]
    pub receipt_timeout_secs: u64,
    #[serde(default)]
    pub resolver_url: Option<LiteralOrEnv<Url>>,
    #[serde(default)]
    pub contracts: ContractOverrides,
}

fn default_derivation_path() -> String {
    DEFAULT_ETH_PATH.to_string()
}

fn default_gas_limit_ceiling() -> u64 {
    DEFAULT_GAS_LIMIT_CEILING
}

fn default_receipt_timeout_secs() -> u64 {
    DEFAULT_RECEIPT_TIMEOUT_SECS
}

impl ClientConfig {
    pub fn new(rpc_url: Url, chain_id: u64) -> Self {
        Self {
            rpc_url: LiteralOrEnv::from_literal(rpc_url),
            chain_id,
            derivation_path: default_derivation_path(),
            gas_limit_ceiling: DEFAULT_GAS_LIMIT_CEILING,
            receipt_timeout_secs: DEFAULT_RECEIPT_TIMEOUT_SECS,
            resolver_url: None,
            contracts: ContractOverrides::default(),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ClientError::ConfigurationError(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self, ClientError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ClientError::ConfigurationError(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `TOKEN_CLIENT_*` variables after loading `.env`, if present.
    pub fn from_env() -> Result<Self, ClientError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| ClientError::ConfigurationError(format!("{key} is not set")))
        };

        let rpc_url = parse_var("TOKEN_CLIENT_RPC_URL", &required("TOKEN_CLIENT_RPC_URL")?)?;
        let chain_id = parse_var("TOKEN_CLIENT_CHAIN_ID", &required("TOKEN_CLIENT_CHAIN_ID")?)?;

        let mut config = Self::new(rpc_url, chain_id);
        if let Some(path) = lookup("TOKEN_CLIENT_DERIVATION_PATH") {
            config.derivation_path = path;
        }
        if let Some(gas) = lookup("TOKEN_CLIENT_GAS_LIMIT") {
            config.gas_limit_ceiling = parse_var("TOKEN_CLIENT_GAS_LIMIT", &gas)?;
        }
        if let Some(secs) = lookup("TOKEN_CLIENT_RECEIPT_TIMEOUT_SECS") {
            config.receipt_timeout_secs = parse_var("TOKEN_CLIENT_RECEIPT_TIMEOUT_SECS", &secs)?;
        }
        if let Some(url) = lookup("TOKEN_CLIENT_RESOLVER_URL") {
            config.resolver_url = Some(LiteralOrEnv::from_literal(parse_var(
                "TOKEN_CLIENT_RESOLVER_URL",
                &url,
            )?));
        }
        for (key, slot) in [
            ("TOKEN_CLIENT_TOKEN_CONTRACT", &mut config.contracts.token),
            ("TOKEN_CLIENT_BUNDLE_CONTRACT", &mut config.contracts.bundle),
            ("TOKEN_CLIENT_ALLOW_LIST_CONTRACT", &mut config.contracts.allow_list),
        ] {
            if let Some(value) = lookup(key) {
                *slot = Some(parse_var(key, &value)?);
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Builtin networks with this config's contract overrides applied to the
    /// active chain.
    pub fn network_registry(&self) -> Result<NetworkRegistry, ClientError> {
        let mut registry = NetworkRegistry::builtin();
        for (kind, address) in self.contracts.entries() {
            registry = registry.with_contract(self.chain_id, kind, address)?;
        }
        Ok(registry)
    }

    /// Client for the configured resolution service, if one is set.
    pub fn http_resolver(&self) -> Option<HttpResolver> {
        self.resolver_url
            .as_ref()
            .map(|url| HttpResolver::new(url.inner().clone()))
    }

    /// Resolver for hardware-wallet payloads. Without a `resolver_url` every
    /// payload resolves to nothing and the device shows raw contract data.
    pub fn resolver(&self) -> Arc<dyn TransactionResolver> {
        match self.http_resolver() {
            Some(resolver) => Arc::new(resolver),
            None => Arc::new(NoResolution),
        }
    }

    fn validate(&self) -> Result<(), ClientError> {
        if self.gas_limit_ceiling == 0 {
            return Err(ClientError::ConfigurationError(
                "gas_limit_ceiling must be positive".into(),
            ));
        }
        if self.receipt_timeout_secs == 0 {
            return Err(ClientError::ConfigurationError(
                "receipt_timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T, ClientError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ClientError::ConfigurationError(format!("{key}: {e}")))
}
