//! Approval workflow.
//!
//! Tokens are approved one at a time. Each approval is its own transaction
//! from the same identity, so the next one starts only after the previous
//! one is mined.

use chain_eth::contracts::INftCollection;

use crate::error::ClientError;
use crate::manual::HardwareWallet;
use crate::progress::{ProcessStatus, ProgressSink};
use crate::rpc::TxReceipt;
use crate::token::TokenContract;
use crate::types::ApprovalTarget;

impl TokenContract {
    /// Approves this contract as spender of every token in `tokens`, in order.
    ///
    /// Tokens already approved for this contract are skipped without a
    /// transaction. Returns `true` once every token is approved.
    pub async fn approve_token_list(
        &self,
        tokens: &[ApprovalTarget],
        progress: Option<&dyn ProgressSink>,
    ) -> Result<bool, ClientError> {
        let spender = self.address();

        for target in tokens {
            if let Some(progress) = progress {
                progress.report(ProcessStatus::ApprovingToken, Some(target.token_id.to_string()));
            }

            let token = self.collection_at(target.contract);
            match token.approve(spender, target.token_id).await? {
                Some(receipt) => {
                    tracing::info!(%target, %spender, tx_hash = %receipt.transaction_hash, "token approved")
                }
                None => tracing::debug!(%target, %spender, "approval skipped"),
            }
        }

        Ok(true)
    }

    /// Hardware-wallet variant of [`approve_token_list`](Self::approve_token_list).
    ///
    /// Reads the current approval first and signs only for tokens that still
    /// need one. Returns the receipts of the approvals actually submitted.
    pub async fn approve_token_list_plain(
        &self,
        wallet: &HardwareWallet,
        tokens: &[ApprovalTarget],
        progress: Option<&dyn ProgressSink>,
    ) -> Result<Vec<TxReceipt>, ClientError> {
        let spender = self.address();
        let mut receipts = Vec::new();

        for target in tokens {
            let token = self.collection_at(target.contract);

            if token.is_approved_for(spender, target.token_id).await? {
                tracing::debug!(%target, %spender, "token already approved");
                continue;
            }

            if let Some(progress) = progress {
                progress.report(ProcessStatus::ApprovingToken, Some(target.token_id.to_string()));
            }

            tracing::info!(%target, %spender, "approving token with hardware wallet");
            let receipt = token
                .make_plain_transaction(
                    wallet,
                    INftCollection::approveCall {
                        to: spender,
                        tokenId: target.token_id,
                    },
                )
                .await?;
            receipts.push(receipt);
        }

        Ok(receipts)
    }
}
