//! Allow-list management.

use alloy_primitives::Address;
use chain_eth::contracts::IAllowList;

use crate::error::ClientError;
use crate::rpc::TxReceipt;
use crate::token::TokenContract;
use crate::types::{AllowListRegistration, ContractMeta, WhiteListEntry};

impl TokenContract {
    /// Registered modifier contracts.
    ///
    /// With `with_meta`, each entry also carries the modifier contract's name,
    /// symbol and total supply, read through a separate facade per entry.
    pub async fn get_white_list_contracts(
        &self,
        with_meta: bool,
    ) -> Result<Vec<WhiteListEntry>, ClientError> {
        let infos = self
            .call_without_sign(IAllowList::getEffectInfosCall {})
            .await?;
        tracing::debug!(contract = %self.address(), count = infos.len(), "allow-list read");

        let mut entries = Vec::with_capacity(infos.len());
        for info in infos {
            let mut entry = WhiteListEntry::from(info);
            if with_meta {
                let mut modifier = self.collection_at(entry.contract_address);
                let metadata = modifier.fetch_metadata().await.clone();
                entry.meta = Some(ContractMeta {
                    name: metadata.name,
                    symbol: metadata.symbol,
                    total_supply: modifier.total_supply().await,
                });
            }
            entries.push(entry);
        }

        Ok(entries)
    }

    /// `addToList`; a missing restriction is submitted as the zero address.
    pub async fn add_contract_to_white_list(
        &self,
        entry: AllowListRegistration,
    ) -> Result<TxReceipt, ClientError> {
        tracing::info!(
            allow_list = %self.address(),
            modifier = %entry.contract_address,
            only_for = ?entry.only_for,
            "registering modifier contract"
        );
        self.call_method(IAllowList::addToListCall { info: entry.into() })
            .await
    }

    pub async fn remove_contract_from_white_list(
        &self,
        contract: Address,
    ) -> Result<TxReceipt, ClientError> {
        self.call_method(IAllowList::removeFromListCall {
            modificatorsContract: contract,
        })
        .await
    }

    /// Whether `modify_with`'s modifier may apply effects to `apply_to`.
    pub async fn check_apply_effect(
        &self,
        apply_to: Address,
        modify_with: Address,
    ) -> Result<bool, ClientError> {
        self.call_without_sign(IAllowList::checkPermissionCall {
            applyTo: apply_to,
            modifyWith: modify_with,
        })
        .await
    }
}
