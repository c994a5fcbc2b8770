//! In-memory chain and device doubles shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use alloy_primitives::{address, keccak256, Address, Bytes, B256, U256};
use alloy_sol_types::{SolInterface, SolValue};
use async_trait::async_trait;
use chain_eth::chains::{NetworkSettings, POLYGON_MAINNET};
use chain_eth::contracts::{AbiKind, EffectInfo, IAllowList, IBundle, INftCollection};
use chain_eth::transaction::{decode_signed, DecodedTransaction};
use token_client::progress::ProcessStatus;
use token_client::resolver::ResolverError;
use token_client::{
    BlockTag, CallRequest, ChainRpc, DeviceError, DeviceSignature, HardwareSigner, ProgressSink,
    Resolution, ResolutionConfig, RpcError, SeedSigner, Session, TransactionResolver, TxReceipt,
};

pub const TEST_MNEMONIC: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

/// Account at m/44'/60'/0'/0/0 of [`TEST_MNEMONIC`].
pub const LEDGER_ACCOUNT: Address = address!("0x9858EfFD232B4033E47d90003D41EC34EcaEda94");

pub const USER: Address = address!("0x1111111111111111111111111111111111111111");
pub const OTHER_USER: Address = address!("0x2222222222222222222222222222222222222222");

pub const COLLECTION: Address = address!("0xc0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0");
pub const SECOND_COLLECTION: Address = address!("0xc1c1c1c1c1c1c1c1c1c1c1c1c1c1c1c1c1c1c1c1");
pub const BUNDLE: Address = address!("0xb0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0");
pub const ALLOW_LIST: Address = address!("0xa1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1");

pub const GAS_PRICE: u128 = 30_000_000_000;

/// Contract state the double answers reads from.
#[derive(Debug, Clone, Default)]
pub struct MockContract {
    pub name: String,
    pub symbol: String,
    /// `(token id, owner)` in mint order.
    pub tokens: Vec<(U256, Address)>,
    pub approvals: HashMap<U256, Address>,
    pub token_uris: HashMap<U256, String>,
    pub effect_infos: Vec<EffectInfo>,
    pub permissions: HashSet<(Address, Address)>,
    /// Token URIs passed to bundle operations, in call order.
    pub bundle_uris: Vec<String>,
}

impl MockContract {
    pub fn named(name: &str, symbol: &str) -> Self {
        Self {
            name: name.to_string(),
            symbol: symbol.to_string(),
            ..Self::default()
        }
    }

    pub fn with_tokens(mut self, owner: Address, ids: &[u64]) -> Self {
        for id in ids {
            self.tokens.push((U256::from(*id), owner));
        }
        self
    }

    fn owned_by(&self, owner: Address) -> Vec<U256> {
        self.tokens
            .iter()
            .filter(|(_, o)| *o == owner)
            .map(|(id, _)| *id)
            .collect()
    }

    fn mint(&mut self, owner: Address, uri: String) -> U256 {
        let id = U256::from(self.tokens.len() + 1);
        self.tokens.push((id, owner));
        self.token_uris.insert(id, uri);
        id
    }
}

#[derive(Debug, Default)]
pub struct ChainState {
    pub contracts: HashMap<Address, MockContract>,
    /// `(contract, selector)` of every `eth_call`, in order.
    pub reads: Vec<(Address, [u8; 4])>,
    /// Calls submitted through the connected wallet.
    pub submitted: Vec<CallRequest>,
    /// Raw transactions broadcast by the hardware pipeline, decoded.
    pub broadcasts: Vec<DecodedTransaction>,
    pub nonces: HashMap<Address, u64>,
    /// Selectors whose `eth_call` fails.
    pub failing_reads: HashSet<[u8; 4]>,
    /// Error returned by the next `eth_sendTransaction`.
    pub reject_next_send: Option<RpcError>,
    /// Mine the next transaction with a failed status.
    pub revert_next: bool,
    receipts: HashMap<B256, TxReceipt>,
    block: u64,
}

/// A single-node chain answering the collection, bundle and allow-list ABIs.
#[derive(Debug, Default)]
pub struct MockChain {
    state: Mutex<ChainState>,
}

impl MockChain {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn deploy(&self, address: Address, contract: MockContract) {
        self.state().contracts.insert(address, contract);
    }

    pub fn state(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap()
    }

    pub fn contract(&self, address: Address) -> MockContract {
        self.state().contracts.get(&address).cloned().unwrap_or_default()
    }

    pub fn reads_of(&self, selector: [u8; 4]) -> usize {
        self.state().reads.iter().filter(|(_, s)| *s == selector).count()
    }
}

fn revert(message: &str) -> RpcError {
    RpcError::Response {
        code: 3,
        message: format!("execution reverted: {message}"),
    }
}

impl ChainState {
    fn read(&self, to: Address, data: &[u8]) -> Result<Vec<u8>, RpcError> {
        let contract = self
            .contracts
            .get(&to)
            .ok_or_else(|| revert("no contract code"))?;

        if let Ok(call) = INftCollection::INftCollectionCalls::abi_decode(data) {
            use INftCollection::INftCollectionCalls as C;
            return match call {
                C::name(_) => Ok(contract.name.abi_encode()),
                C::symbol(_) => Ok(contract.symbol.abi_encode()),
                C::totalSupply(_) => Ok(U256::from(contract.tokens.len()).abi_encode()),
                C::balanceOf(c) => Ok(U256::from(contract.owned_by(c.owner).len()).abi_encode()),
                C::tokenOfOwnerByIndex(c) => {
                    let owned = contract.owned_by(c.owner);
                    let index = usize::try_from(c.index).map_err(|_| revert("index"))?;
                    owned
                        .get(index)
                        .map(|id| id.abi_encode())
                        .ok_or_else(|| revert("owner index out of bounds"))
                }
                C::tokenURI(c) => contract
                    .token_uris
                    .get(&c.tokenId)
                    .map(|uri| uri.abi_encode())
                    .ok_or_else(|| revert("nonexistent token")),
                C::getApproved(c) => Ok(contract
                    .approvals
                    .get(&c.tokenId)
                    .copied()
                    .unwrap_or(Address::ZERO)
                    .abi_encode()),
                _ => Err(revert("not a view method")),
            };
        }

        match IAllowList::IAllowListCalls::abi_decode(data) {
            Ok(IAllowList::IAllowListCalls::getEffectInfos(_)) => {
                Ok(contract.effect_infos.abi_encode())
            }
            Ok(IAllowList::IAllowListCalls::checkPermission(c)) => Ok(contract
                .permissions
                .contains(&(c.applyTo, c.modifyWith))
                .abi_encode()),
            _ => Err(revert("unknown selector")),
        }
    }

    fn execute(&mut self, from: Address, to: Address, data: &[u8]) -> Result<(), RpcError> {
        let contract = self
            .contracts
            .get_mut(&to)
            .ok_or_else(|| revert("no contract code"))?;

        if let Ok(call) = INftCollection::INftCollectionCalls::abi_decode(data) {
            use INftCollection::INftCollectionCalls as C;
            match call {
                C::approve(c) => {
                    contract.approvals.insert(c.tokenId, c.to);
                }
                C::safeTransferFrom(c) => {
                    let token = contract
                        .tokens
                        .iter_mut()
                        .find(|(id, owner)| *id == c.tokenId && *owner == c.from)
                        .ok_or_else(|| revert("not owner"))?;
                    token.1 = c.to;
                    contract.approvals.remove(&c.tokenId);
                }
                C::mintItem(c) => {
                    contract.mint(c.owner, c.metaCid);
                }
                _ => return Err(revert("view method in transaction")),
            }
            return Ok(());
        }

        if let Ok(call) = IBundle::IBundleCalls::abi_decode(data) {
            match call {
                IBundle::IBundleCalls::bundleWithTokenURI(c) => {
                    contract.bundle_uris.push(c.tokenUri.clone());
                    contract.mint(from, c.tokenUri);
                }
                IBundle::IBundleCalls::addNFTsToBundle(c) => contract.bundle_uris.push(c.tokenUri),
                IBundle::IBundleCalls::removeNFTsFromBundle(c) => {
                    contract.bundle_uris.push(c.tokenUri)
                }
            }
            return Ok(());
        }

        match IAllowList::IAllowListCalls::abi_decode(data) {
            Ok(IAllowList::IAllowListCalls::addToList(c)) => {
                contract.effect_infos.push(c.info);
                Ok(())
            }
            Ok(IAllowList::IAllowListCalls::removeFromList(c)) => {
                contract
                    .effect_infos
                    .retain(|info| info.modificatorsContract != c.modificatorsContract);
                Ok(())
            }
            _ => Err(revert("unknown selector")),
        }
    }

    fn mine(&mut self, tx_hash: B256, from: Address, to: Address, outcome: Result<(), RpcError>) {
        self.block += 1;
        let status = outcome.is_ok() && !std::mem::take(&mut self.revert_next);
        self.receipts.insert(
            tx_hash,
            TxReceipt {
                transaction_hash: tx_hash,
                block_number: Some(self.block),
                gas_used: 50_000,
                status,
                from,
                to: Some(to),
            },
        );
    }
}

#[async_trait]
impl ChainRpc for MockChain {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, RpcError> {
        let mut state = self.state();
        let selector: [u8; 4] = data
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| revert("short calldata"))?;
        state.reads.push((to, selector));

        if state.failing_reads.contains(&selector) {
            return Err(revert("read disabled"));
        }
        state.read(to, &data).map(Bytes::from)
    }

    async fn send_transaction(&self, request: CallRequest) -> Result<B256, RpcError> {
        let mut state = self.state();
        if let Some(err) = state.reject_next_send.take() {
            return Err(err);
        }

        let nonce = state.nonces.entry(request.from).or_default();
        let tx_hash = keccak256(
            [request.from.as_slice(), &nonce.to_be_bytes()[..], &request.data[..]].concat(),
        );
        *nonce += 1;

        let outcome = state.execute(request.from, request.to, &request.data);
        state.mine(tx_hash, request.from, request.to, outcome);
        state.submitted.push(request);
        Ok(tx_hash)
    }

    async fn transaction_count(&self, address: Address, _block: BlockTag) -> Result<u64, RpcError> {
        Ok(self.state().nonces.get(&address).copied().unwrap_or(0))
    }

    async fn gas_price(&self) -> Result<u128, RpcError> {
        Ok(GAS_PRICE)
    }

    async fn send_raw_transaction(&self, raw_tx: &[u8]) -> Result<B256, RpcError> {
        let invalid = |message: String| RpcError::Response {
            code: -32602,
            message,
        };
        let decoded = decode_signed(raw_tx).map_err(|e| invalid(e.to_string()))?;
        let from = decoded.recover_signer().map_err(|e| invalid(e.to_string()))?;

        let mut state = self.state();
        let expected = state.nonces.get(&from).copied().unwrap_or(0);
        if decoded.tx.nonce != expected {
            return Err(RpcError::Response {
                code: -32000,
                message: format!("nonce mismatch: expected {expected}, got {}", decoded.tx.nonce),
            });
        }
        state.nonces.insert(from, expected + 1);

        let tx_hash = keccak256(raw_tx);
        let to = decoded.tx.to;
        let outcome = state.execute(from, to, &decoded.tx.data);
        state.mine(tx_hash, from, to, outcome);
        state.broadcasts.push(decoded);
        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TxReceipt, RpcError> {
        self.state()
            .receipts
            .get(&tx_hash)
            .cloned()
            .ok_or_else(|| RpcError::Receipt(tx_hash, "unknown transaction".to_string()))
    }
}

/// Polygon settings with the test deployments as defaults.
pub fn test_network() -> NetworkSettings {
    let mut network = POLYGON_MAINNET.clone();
    network.set_default_contract(AbiKind::Collection, COLLECTION);
    network.set_default_contract(AbiKind::Bundle, BUNDLE);
    network.set_default_contract(AbiKind::AllowList, ALLOW_LIST);
    network
}

pub fn session(chain: &Arc<MockChain>, identity: Address) -> Session {
    Session::new(identity, test_network(), chain.clone())
}

pub type StatusLog = Arc<Mutex<Vec<(ProcessStatus, Option<String>)>>>;

/// A sink that records every status it is given.
pub fn recording_progress() -> (StatusLog, Arc<dyn ProgressSink>) {
    let log = StatusLog::default();
    let sink = {
        let log = log.clone();
        move |status: ProcessStatus, detail: Option<String>| {
            log.lock().unwrap().push((status, detail));
        }
    };
    (log, Arc::new(sink))
}

/// Seed-backed device that records what it was asked to sign and what it
/// answered.
pub struct RecordingDevice {
    inner: SeedSigner,
    /// Report only the low byte of `v`, as some device firmware does.
    pub truncate_v: bool,
    pub failure: Option<DeviceError>,
    pub requests: Mutex<Vec<(String, String)>>,
    pub answers: Mutex<Vec<DeviceSignature>>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self {
            inner: SeedSigner::from_mnemonic(TEST_MNEMONIC, "").unwrap(),
            truncate_v: false,
            failure: None,
            requests: Mutex::default(),
            answers: Mutex::default(),
        }
    }

    pub fn failing(failure: DeviceError) -> Self {
        Self {
            failure: Some(failure),
            ..Self::new()
        }
    }
}

#[async_trait]
impl HardwareSigner for RecordingDevice {
    async fn sign_transaction(
        &self,
        path: &str,
        raw_tx_hex: &str,
        resolution: &Resolution,
    ) -> Result<DeviceSignature, DeviceError> {
        self.requests
            .lock()
            .unwrap()
            .push((path.to_string(), raw_tx_hex.to_string()));
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }

        let mut answer = self.inner.sign_transaction(path, raw_tx_hex, resolution).await?;
        if self.truncate_v {
            let v = u64::from_str_radix(&answer.v, 16).unwrap();
            answer.v = format!("{:02x}", v & 0xff);
        }
        self.answers.lock().unwrap().push(answer.clone());
        Ok(answer)
    }
}

/// Resolver that records each request and resolves nothing.
#[derive(Default)]
pub struct RecordingResolver {
    pub requests: Mutex<Vec<(String, ResolutionConfig)>>,
}

#[async_trait]
impl TransactionResolver for RecordingResolver {
    async fn resolve(
        &self,
        raw_tx_hex: &str,
        config: &ResolutionConfig,
    ) -> Result<Resolution, ResolverError> {
        self.requests
            .lock()
            .unwrap()
            .push((raw_tx_hex.to_string(), *config));
        Ok(Resolution::default())
    }
}
