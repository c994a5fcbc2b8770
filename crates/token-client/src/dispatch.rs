//! Call dispatcher and the connected-wallet mutations built on it.

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use chain_eth::contracts::{BundleItem, IBundle, INftCollection};

use crate::classify::{fail, RawFailure};
use crate::error::ClientError;
use crate::progress::{ProcessStatus, ProgressSink};
use crate::rpc::TxReceipt;
use crate::token::TokenContract;
use crate::types::ApprovalTarget;

/// Content-addressed URI for a metadata CID.
pub fn ipfs_uri(cid: &str) -> String {
    format!("ipfs://{cid}")
}

impl TokenContract {
    /// Submits `call` from the session identity and waits until it is mined.
    ///
    /// A reverted receipt is reported as [`ClientError::TransactionFailed`].
    pub async fn call_method<C: SolCall>(&self, call: C) -> Result<TxReceipt, ClientError> {
        let contract = self.handle.instance();
        let from = self.session().identity();
        tracing::info!(contract = %contract.address(), method = C::SIGNATURE, %from, "calling contract method");

        let tx_hash = contract
            .submit(from, call)
            .await
            .map_err(|e| fail(C::SIGNATURE, e))?;
        tracing::debug!(%tx_hash, method = C::SIGNATURE, "transaction submitted");

        let receipt = self
            .handle
            .provider()
            .wait_for_receipt(tx_hash)
            .await
            .map_err(|e| fail(C::SIGNATURE, e))?;

        ensure_success(C::SIGNATURE, receipt)
    }

    /// Executes a view method and returns its decoded value.
    pub async fn call_without_sign<C: SolCall>(&self, call: C) -> Result<C::Return, ClientError> {
        self.handle
            .instance()
            .read(call)
            .await
            .map_err(|e| fail(C::SIGNATURE, e))
    }

    /// `safeTransferFrom(from, to, token_id)`.
    pub async fn send_token(
        &self,
        token_id: U256,
        from: Address,
        to: Address,
    ) -> Result<TxReceipt, ClientError> {
        self.call_method(INftCollection::safeTransferFromCall {
            from,
            to,
            tokenId: token_id,
        })
        .await
    }

    /// `mintItem(owner, meta_cid)`.
    pub async fn mint(&self, owner: Address, meta_cid: &str) -> Result<TxReceipt, ClientError> {
        self.call_method(INftCollection::mintItemCall {
            owner,
            metaCid: meta_cid.to_string(),
        })
        .await
    }

    /// Approves `spender` for `token_id`. Returns `None` without submitting
    /// anything when the token is already approved for `spender`.
    pub async fn approve(
        &self,
        spender: Address,
        token_id: U256,
    ) -> Result<Option<TxReceipt>, ClientError> {
        if self.is_approved_for(spender, token_id).await? {
            tracing::debug!(contract = %self.address(), %token_id, %spender, "token already approved");
            return Ok(None);
        }

        self.call_method(INftCollection::approveCall {
            to: spender,
            tokenId: token_id,
        })
        .await
        .map(Some)
    }

    pub(crate) async fn is_approved_for(
        &self,
        spender: Address,
        token_id: U256,
    ) -> Result<bool, ClientError> {
        let approved = self
            .call_without_sign(INftCollection::getApprovedCall { tokenId: token_id })
            .await?;
        // Address equality is byte equality, so checksum casing never matters.
        Ok(!approved.is_zero() && approved == spender)
    }

    /// Approves every constituent token for this contract, then mints a
    /// bundle of them with metadata at `ipfs://<bundle_cid>`.
    pub async fn make_bundle(
        &self,
        tokens: &[ApprovalTarget],
        bundle_cid: &str,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<TxReceipt, ClientError> {
        self.approve_token_list(tokens, progress).await?;

        if let Some(progress) = progress {
            progress.report(ProcessStatus::MintingBundle, None);
        }

        self.call_method(IBundle::bundleWithTokenURICall {
            tokens: bundle_items(tokens),
            tokenUri: ipfs_uri(bundle_cid),
        })
        .await
    }

    /// `addNFTsToBundle(bundle_id, tokens, result_cid)`.
    pub async fn add_to_bundle(
        &self,
        bundle_id: U256,
        tokens: &[ApprovalTarget],
        result_cid: &str,
    ) -> Result<TxReceipt, ClientError> {
        self.call_method(IBundle::addNFTsToBundleCall {
            bundleId: bundle_id,
            tokens: bundle_items(tokens),
            tokenUri: result_cid.to_string(),
        })
        .await
    }

    /// `removeNFTsFromBundle(bundle_id, tokens, result_cid)`.
    pub async fn remove_from_bundle(
        &self,
        bundle_id: U256,
        tokens: &[ApprovalTarget],
        result_cid: &str,
    ) -> Result<TxReceipt, ClientError> {
        self.call_method(IBundle::removeNFTsFromBundleCall {
            bundleId: bundle_id,
            tokens: bundle_items(tokens),
            tokenUri: result_cid.to_string(),
        })
        .await
    }
}

fn bundle_items(tokens: &[ApprovalTarget]) -> Vec<BundleItem> {
    tokens.iter().copied().map(BundleItem::from).collect()
}

/// Rejects receipts whose execution reverted.
pub(crate) fn ensure_success(method: &str, receipt: TxReceipt) -> Result<TxReceipt, ClientError> {
    if receipt.status {
        tracing::info!(tx_hash = %receipt.transaction_hash, method, "transaction mined");
        Ok(receipt)
    } else {
        Err(fail(
            method,
            RawFailure::message(format!(
                "transaction {} reverted",
                receipt.transaction_hash
            )),
        ))
    }
}
