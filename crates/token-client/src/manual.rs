//! Manual transaction pipeline for hardware wallets.
//!
//! The device never sees the RPC endpoint, so the client assembles the
//! transaction itself:
//!
//! 1. build an [`UnsignedTransaction`] (calldata, latest nonce, gas price,
//!    gas limit ceiling, chain id)
//! 2. serialize the EIP-155 signing payload as bare hex
//! 3. resolve the payload against the signing-metadata service
//! 4. ask the device to sign, then normalize `{r, s, v}`
//! 5. reassemble the signed transaction
//! 6. broadcast it and wait for the receipt
//!
//! Any failure aborts the run; nothing is retried.

use std::sync::Arc;

use alloy_sol_types::SolCall;
use chain_eth::transaction::{SignatureEnvelope, UnsignedTransaction};

use crate::classify::fail;
use crate::config::ClientConfig;
use crate::dispatch::ensure_success;
use crate::error::ClientError;
use crate::progress::ProcessStatus;
use crate::resolver::{ResolutionConfig, TransactionResolver};
use crate::rpc::{BlockTag, TxReceipt};
use crate::signer::HardwareSigner;
use crate::token::TokenContract;

/// A hardware signer paired with the resolution service it needs.
#[derive(Clone)]
pub struct HardwareWallet {
    device: Arc<dyn HardwareSigner>,
    resolver: Arc<dyn TransactionResolver>,
}

impl HardwareWallet {
    pub fn new(device: Arc<dyn HardwareSigner>, resolver: Arc<dyn TransactionResolver>) -> Self {
        Self { device, resolver }
    }

    /// Pairs `device` with the resolver named by `config`.
    pub fn from_config(device: Arc<dyn HardwareSigner>, config: &ClientConfig) -> Self {
        Self::new(device, config.resolver())
    }

    pub fn device(&self) -> &dyn HardwareSigner {
        self.device.as_ref()
    }

    pub fn resolver(&self) -> &dyn TransactionResolver {
        self.resolver.as_ref()
    }
}

impl std::fmt::Debug for HardwareWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HardwareWallet").finish_non_exhaustive()
    }
}

impl TokenContract {
    /// Builds the unsigned transaction for `call` from the session identity.
    pub async fn build_unsigned<C: SolCall>(&self, call: &C) -> Result<UnsignedTransaction, ClientError> {
        let session = self.session();
        let data = self
            .handle
            .instance()
            .encode(call)
            .map_err(|e| fail(C::SIGNATURE, e))?;

        let rpc = self.handle.provider();
        let nonce = rpc
            .transaction_count(session.identity(), BlockTag::Latest)
            .await
            .map_err(|e| fail(C::SIGNATURE, e))?;
        let gas_price = rpc.gas_price().await.map_err(|e| fail(C::SIGNATURE, e))?;

        Ok(UnsignedTransaction {
            to: self.address(),
            data,
            nonce,
            gas_price,
            gas_limit: session.gas_limit_ceiling(),
            chain_id: session.chain_id(),
        })
    }

    /// Runs `call` through the hardware-wallet pipeline and waits for the
    /// mined receipt.
    ///
    /// Reports [`ProcessStatus::NeedASign`] right before the device is asked
    /// to sign and [`ProcessStatus::WaitTransactionResult`] right after the
    /// broadcast.
    pub async fn make_plain_transaction<C: SolCall>(
        &self,
        wallet: &HardwareWallet,
        call: C,
    ) -> Result<TxReceipt, ClientError> {
        let method = C::SIGNATURE;
        let session = self.session();

        let tx = self.build_unsigned(&call).await?;
        tracing::info!(
            contract = %tx.to,
            method,
            nonce = tx.nonce,
            gas_price = tx.gas_price,
            chain_id = tx.chain_id,
            "manual transaction built"
        );

        let payload = tx.signing_payload_hex();

        let resolution = wallet
            .resolver()
            .resolve(&payload, &ResolutionConfig::nft())
            .await
            .map_err(|e| fail(method, e))?;

        session.progress().report(ProcessStatus::NeedASign, None);
        let device_signature = wallet
            .device()
            .sign_transaction(session.derivation_path(), &payload, &resolution)
            .await
            .map_err(|e| fail(method, e))?;

        let signature = SignatureEnvelope::from_hex_parts(
            &device_signature.r,
            &device_signature.s,
            &device_signature.v,
            session.identity(),
        )
        .map_err(|e| fail(method, e))?;

        let signed = tx.into_signed(&signature).map_err(|e| fail(method, e))?;

        let rpc = self.handle.provider();
        let tx_hash = rpc
            .send_raw_transaction(&signed.raw_tx)
            .await
            .map_err(|e| fail(method, e))?;
        if tx_hash != signed.tx_hash {
            tracing::warn!(%tx_hash, expected = %signed.tx_hash, "node reported a different transaction hash");
        }

        session
            .progress()
            .report(ProcessStatus::WaitTransactionResult, Some(tx_hash.to_string()));

        let receipt = rpc
            .wait_for_receipt(tx_hash)
            .await
            .map_err(|e| fail(method, e))?;

        ensure_success(method, receipt)
    }
}
