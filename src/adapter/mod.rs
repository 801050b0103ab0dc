//! Bridge adapters
//!
//! `BridgeAdapter` is the capability interface a native-bridge variant
//! implements; shared event bookkeeping lives in `ChainEventStore` and
//! is composed by each variant rather than inherited.

pub mod arbitrum;
pub mod event_store;

pub use arbitrum::{ArbitrumGatewayAdapter, GatewaySettings};
pub use event_store::ChainEventStore;

use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;
use eyre::Result;
use std::collections::HashMap;

/// Outstanding in-flight amount per (monitored address, L1 token)
pub type OutstandingTransfers = HashMap<Address, HashMap<Address, U256>>;

#[async_trait]
pub trait BridgeAdapter: Send + Sync {
    /// Whether the adapter has a configured source/destination pair for
    /// the token
    fn is_supported_token(&self, l1_token: Address) -> bool;

    /// Refresh deposit events on both chains and reduce them to the
    /// outstanding in-flight amount per (monitored address, token).
    /// Unsupported tokens are skipped; any query failure aborts the
    /// whole pass without touching recorded state.
    async fn outstanding_transfers(
        &mut self,
        l1_tokens: &[Address],
    ) -> Result<OutstandingTransfers>;

    /// Initiate a bridge deposit of `amount` toward the destination
    /// chain; returns the submitted transaction hash.
    async fn submit_transfer(
        &self,
        address: Address,
        l1_token: Address,
        amount: U256,
    ) -> Result<B256>;
}
