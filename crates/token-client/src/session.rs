use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address;
use chain_eth::chains::NetworkSettings;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::hd_derivation::DEFAULT_ETH_PATH;
use crate::progress::{ProgressSink, SilentProgress};
use crate::rpc::{AlloyRpc, ChainRpc};

/// Gas limit stamped on manually signed transactions.
pub const DEFAULT_GAS_LIMIT_CEILING: u64 = 1_000_000;

/// Connected account and the resolved network it operates on.
///
/// Cloning is cheap; clones share the RPC connection and progress sink.
#[derive(Clone)]
pub struct Session {
    identity: Address,
    network: NetworkSettings,
    rpc: Arc<dyn ChainRpc>,
    progress: Arc<dyn ProgressSink>,
    gas_limit_ceiling: u64,
    derivation_path: String,
}

impl Session {
    pub fn new(identity: Address, network: NetworkSettings, rpc: Arc<dyn ChainRpc>) -> Self {
        Self {
            identity,
            network,
            rpc,
            progress: Arc::new(SilentProgress),
            gas_limit_ceiling: DEFAULT_GAS_LIMIT_CEILING,
            derivation_path: DEFAULT_ETH_PATH.to_string(),
        }
    }

    /// Connects to the configured JSON-RPC endpoint and resolves the active
    /// network, applying any contract overrides from `config`.
    pub fn connect(config: &ClientConfig, identity: Address) -> Result<Self, ClientError> {
        let registry = config.network_registry()?;
        let network = registry.require(config.chain_id)?.clone();

        let rpc = AlloyRpc::connect_http(
            config.rpc_url.inner().clone(),
            Duration::from_secs(config.receipt_timeout_secs),
        );
        tracing::info!(
            chain_id = network.chain_id,
            network = network.name,
            %identity,
            "session connected"
        );

        Ok(Self::new(identity, network, Arc::new(rpc))
            .with_gas_limit_ceiling(config.gas_limit_ceiling)
            .with_derivation_path(config.derivation_path.clone()))
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_gas_limit_ceiling(mut self, gas_limit: u64) -> Self {
        self.gas_limit_ceiling = gas_limit;
        self
    }

    pub fn with_derivation_path(mut self, path: impl Into<String>) -> Self {
        self.derivation_path = path.into();
        self
    }

    pub fn identity(&self) -> Address {
        self.identity
    }

    pub fn network(&self) -> &NetworkSettings {
        &self.network
    }

    pub fn chain_id(&self) -> u64 {
        self.network.chain_id
    }

    /// Shared connection handle; contract handles memoize their own clone.
    pub fn rpc(&self) -> &Arc<dyn ChainRpc> {
        &self.rpc
    }

    pub fn progress(&self) -> &dyn ProgressSink {
        self.progress.as_ref()
    }

    pub fn gas_limit_ceiling(&self) -> u64 {
        self.gas_limit_ceiling
    }

    pub fn derivation_path(&self) -> &str {
        &self.derivation_path
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("identity", &self.identity)
            .field("chain_id", &self.network.chain_id)
            .field("gas_limit_ceiling", &self.gas_limit_ceiling)
            .field("derivation_path", &self.derivation_path)
            .finish_non_exhaustive()
    }
}
