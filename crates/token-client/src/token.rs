use alloy_primitives::Address;
use chain_eth::contracts::AbiKind;

use crate::contract::ContractHandle;
use crate::error::ClientError;
use crate::session::Session;
use crate::types::AssetMetadata;

/// Client-side view of one token contract.
///
/// Each instance owns its [`ContractHandle`] and its [`AssetMetadata`], so two
/// instances never observe each other's partially fetched state.
#[derive(Debug)]
pub struct TokenContract {
    pub(crate) handle: ContractHandle,
    pub(crate) metadata: AssetMetadata,
}

impl TokenContract {
    /// Binds `address`, or the active network's default deployment for `kind`.
    pub fn new(
        session: &Session,
        address: Option<Address>,
        kind: AbiKind,
    ) -> Result<Self, ClientError> {
        Ok(Self::from_handle(ContractHandle::new(session, address, kind)?))
    }

    pub fn at(session: &Session, address: Address, kind: AbiKind) -> Self {
        Self::from_handle(ContractHandle::at(session, address, kind))
    }

    fn from_handle(handle: ContractHandle) -> Self {
        let metadata = AssetMetadata::new(handle.address());
        Self { handle, metadata }
    }

    /// A fresh collection facade for another contract on the same session.
    pub(crate) fn collection_at(&self, address: Address) -> TokenContract {
        TokenContract::at(self.session(), address, AbiKind::Collection)
    }

    pub fn address(&self) -> Address {
        self.handle.address()
    }

    pub fn kind(&self) -> AbiKind {
        self.handle.kind()
    }

    pub fn handle(&self) -> &ContractHandle {
        &self.handle
    }

    pub fn session(&self) -> &Session {
        self.handle.session()
    }

    pub fn metadata(&self) -> &AssetMetadata {
        &self.metadata
    }
}
