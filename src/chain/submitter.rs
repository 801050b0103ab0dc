//! Transaction submission
//!
//! The engine only builds calls; this seam hands them to whatever owns
//! signing, nonces, and gas. The wallet-backed implementation submits
//! through an alloy provider with the recommended fillers and waits for
//! the receipt.

use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{B256, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use eyre::{Result, WrapErr};
use tracing::info;

use crate::types::ExecutionCall;

#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    /// Submit a call with the given native value; returns the
    /// transaction hash once the transaction is confirmed.
    async fn submit(&self, call: &ExecutionCall, value: U256) -> Result<B256>;
}

/// Submitter backed by a locally-held key
pub struct WalletSubmitter {
    rpc_url: String,
    private_key: String,
}

impl WalletSubmitter {
    pub fn new(rpc_url: &str, private_key: &str) -> Self {
        Self {
            rpc_url: rpc_url.to_string(),
            private_key: private_key.to_string(),
        }
    }
}

#[async_trait]
impl TransactionSubmitter for WalletSubmitter {
    async fn submit(&self, call: &ExecutionCall, value: U256) -> Result<B256> {
        let signer: PrivateKeySigner = self
            .private_key
            .parse()
            .wrap_err("Failed to parse private key")?;
        let wallet = EthereumWallet::from(signer);

        let provider = ProviderBuilder::new()
            .with_recommended_fillers()
            .wallet(wallet)
            .on_http(self.rpc_url.parse().wrap_err("Invalid RPC URL")?);

        let tx = TransactionRequest::default()
            .with_to(call.target)
            .with_input(call.calldata.clone())
            .with_value(value);

        let pending_tx = provider
            .send_transaction(tx)
            .await
            .wrap_err("Failed to send transaction")?;

        info!(tx_hash = ?pending_tx.tx_hash(), "Transaction sent, waiting for confirmation");

        let receipt = pending_tx
            .get_receipt()
            .await
            .wrap_err("Failed to get transaction receipt")?;

        if !receipt.status() {
            return Err(eyre::eyre!(
                "Transaction reverted: {:?}",
                receipt.transaction_hash
            ));
        }

        Ok(receipt.transaction_hash)
    }
}
