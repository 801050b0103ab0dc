//! Arbitrum-style gateway adapter
//!
//! Reconciles deposits across the L1 and L2 gateway contracts and
//! submits new deposits through the L1 gateway router. The L1
//! `DepositInitiated` event does not index the token, so L1 queries are
//! per-sender and each result is filtered down to the queried token
//! after decoding. All queries of a pass run concurrently and are
//! correlated back by an explicit request key; one failed query aborts
//! the pass before any recorded state changes.

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::rpc::types::Log;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use eyre::{Result, WrapErr};
use futures::future::try_join_all;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::chain::{LogQueryService, LogQuerySpec, TransactionSubmitter};
use crate::config::BridgeConfig;
use crate::contracts::{self, L1GatewayRouter};
use crate::error::RelayError;
use crate::types::{BridgeToken, DepositEvent, ExecutionCall, TransferSide};

use super::{BridgeAdapter, ChainEventStore, OutstandingTransfers};

// Conservative static parameters sized to guarantee inclusion rather
// than minimize cost; values match the gateway protocol's retryable
// ticket requirements.
const L2_GAS_LIMIT: u64 = 150_000;
const L2_GAS_PRICE_WEI: u128 = 20_000_000_000;
const L1_SUBMIT_VALUE_WEI: u128 = 13_000_000_000_000_000;

/// abi encoding of (maxSubmissionCost = 0.01 ether, empty extra data)
const SUBMISSION_DATA: &str = "0x000000000000000000000000000000000000000000000000002386f26fc1000000000000000000000000000000000000000000000000000000000000000000400000000000000000000000000000000000000000000000000000000000000000";

/// Gateway contracts for one bridged token pair
#[derive(Debug, Clone)]
pub struct TokenGateways {
    pub pair: BridgeToken,
    pub l1_gateway: Address,
    pub l2_gateway: Address,
}

/// Immutable gateway wiring, built from configuration at construction
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    router: Address,
    by_l1_token: HashMap<Address, TokenGateways>,
}

impl GatewaySettings {
    pub fn from_config(bridge: &BridgeConfig) -> Result<Self> {
        let router = Address::from_str(&bridge.l1_gateway_router)
            .wrap_err("Invalid gateway router address")?;

        let mut by_l1_token = HashMap::new();
        for entry in &bridge.tokens {
            let l1_token = Address::from_str(&entry.l1_token)
                .wrap_err_with(|| format!("Invalid l1_token for {}", entry.symbol))?;
            let l2_token = Address::from_str(&entry.l2_token)
                .wrap_err_with(|| format!("Invalid l2_token for {}", entry.symbol))?;
            let gateways = TokenGateways {
                pair: BridgeToken {
                    l1: l1_token,
                    l2: l2_token,
                },
                l1_gateway: Address::from_str(&entry.l1_gateway)
                    .wrap_err_with(|| format!("Invalid l1_gateway for {}", entry.symbol))?,
                l2_gateway: Address::from_str(&entry.l2_gateway)
                    .wrap_err_with(|| format!("Invalid l2_gateway for {}", entry.symbol))?,
            };
            by_l1_token.insert(l1_token, gateways);
        }

        Ok(Self {
            router,
            by_l1_token,
        })
    }

    pub fn router(&self) -> Address {
        self.router
    }

    pub fn token(&self, l1_token: Address) -> Option<&TokenGateways> {
        self.by_l1_token.get(&l1_token)
    }

    pub fn is_supported(&self, l1_token: Address) -> bool {
        self.by_l1_token.contains_key(&l1_token)
    }

    /// L2 token paired with an L1 token, when configured
    pub fn l2_token_for(&self, l1_token: Address) -> Option<Address> {
        self.by_l1_token.get(&l1_token).map(|g| g.pair.l2)
    }

    /// All configured L2 gateway contracts, deduplicated
    pub fn l2_gateways(&self) -> Vec<Address> {
        let mut gateways: Vec<Address> =
            self.by_l1_token.values().map(|g| g.l2_gateway).collect();
        gateways.sort();
        gateways.dedup();
        gateways
    }
}

/// One in-flight log query of a reconciliation pass. Results are
/// correlated back by this key, never by list position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct QueryKey {
    monitored: Address,
    l1_token: Address,
    side: TransferSide,
}

pub struct ArbitrumGatewayAdapter {
    l1_logs: Arc<dyn LogQueryService>,
    l2_logs: Arc<dyn LogQueryService>,
    submitter: Arc<dyn TransactionSubmitter>,
    settings: GatewaySettings,
    monitored: Vec<Address>,
    l1_lookback_blocks: u64,
    l2_lookback_blocks: u64,
    store: ChainEventStore,
}

impl ArbitrumGatewayAdapter {
    pub fn new(
        l1_logs: Arc<dyn LogQueryService>,
        l2_logs: Arc<dyn LogQueryService>,
        submitter: Arc<dyn TransactionSubmitter>,
        settings: GatewaySettings,
        monitored: Vec<Address>,
        l1_lookback_blocks: u64,
        l2_lookback_blocks: u64,
    ) -> Self {
        Self {
            l1_logs,
            l2_logs,
            submitter,
            settings,
            monitored,
            l1_lookback_blocks,
            l2_lookback_blocks,
            store: ChainEventStore::new(),
        }
    }

    /// Recorded events, exposed for inspection
    pub fn store(&self) -> &ChainEventStore {
        &self.store
    }

    /// Build the query set for one pass: address-major, token-minor.
    fn build_requests(
        &self,
        supported: &[Address],
        l1_range: (u64, u64),
        l2_range: (u64, u64),
    ) -> Vec<(QueryKey, LogQuerySpec)> {
        let mut requests = Vec::with_capacity(self.monitored.len() * supported.len() * 2);
        for &monitored in &self.monitored {
            for &l1_token in supported {
                // Known pair: `supported` was filtered against settings
                let Some(gateways) = self.settings.token(l1_token) else {
                    continue;
                };

                // L1 deposit events index the sender but not the token;
                // the decoded token is compared client-side.
                requests.push((
                    QueryKey {
                        monitored,
                        l1_token,
                        side: TransferSide::Initiated,
                    },
                    LogQuerySpec::new(
                        gateways.l1_gateway,
                        contracts::deposit_initiated_signature(),
                        l1_range.0,
                        l1_range.1,
                    )
                    .with_topic1(monitored.into_word()),
                ));

                // L2 finalization events index both token and recipient
                requests.push((
                    QueryKey {
                        monitored,
                        l1_token,
                        side: TransferSide::Finalized,
                    },
                    LogQuerySpec::new(
                        gateways.l2_gateway,
                        contracts::deposit_finalized_signature(),
                        l2_range.0,
                        l2_range.1,
                    )
                    .with_topic1(l1_token.into_word())
                    .with_topic3(monitored.into_word()),
                ));
            }
        }
        requests
    }
}

async fn run_query(
    client: Arc<dyn LogQueryService>,
    key: QueryKey,
    spec: LogQuerySpec,
) -> Result<(QueryKey, Vec<Log>)> {
    let logs = client.query(&spec).await?;
    Ok((key, logs))
}

#[async_trait]
impl BridgeAdapter for ArbitrumGatewayAdapter {
    fn is_supported_token(&self, l1_token: Address) -> bool {
        self.settings.is_supported(l1_token)
    }

    async fn outstanding_transfers(
        &mut self,
        l1_tokens: &[Address],
    ) -> Result<OutstandingTransfers> {
        // Monitoring lists may include tokens this bridge has no pair
        // for; those are skipped rather than treated as errors.
        let supported: Vec<Address> = l1_tokens
            .iter()
            .copied()
            .filter(|token| {
                let known = self.settings.is_supported(*token);
                if !known {
                    debug!(token = %token, "Skipping token with no configured gateway pair");
                }
                known
            })
            .collect();

        if supported.is_empty() {
            return Ok(OutstandingTransfers::new());
        }

        let l1_tip = self
            .l1_logs
            .latest_block()
            .await
            .map_err(|e| RelayError::Reconciliation(format!("L1 tip lookup failed: {e}")))?;
        let l2_tip = self
            .l2_logs
            .latest_block()
            .await
            .map_err(|e| RelayError::Reconciliation(format!("L2 tip lookup failed: {e}")))?;
        let l1_range = (l1_tip.saturating_sub(self.l1_lookback_blocks), l1_tip);
        let l2_range = (l2_tip.saturating_sub(self.l2_lookback_blocks), l2_tip);

        debug!(
            tokens = supported.len(),
            addresses = self.monitored.len(),
            l1_from = l1_range.0,
            l1_to = l1_range.1,
            l2_from = l2_range.0,
            l2_to = l2_range.1,
            "Querying cross-chain deposit events"
        );

        let requests = self.build_requests(&supported, l1_range, l2_range);

        // All-or-nothing: a partial result set must never reach the
        // store, or the outstanding-amount invariant breaks.
        let futures = requests.into_iter().map(|(key, spec)| {
            let client = match key.side {
                TransferSide::Initiated => Arc::clone(&self.l1_logs),
                TransferSide::Finalized => Arc::clone(&self.l2_logs),
            };
            run_query(client, key, spec)
        });
        let results: Vec<(QueryKey, Vec<Log>)> = try_join_all(futures)
            .await
            .map_err(|e| RelayError::Reconciliation(e.to_string()))?;

        for (key, logs) in results {
            let events: Vec<DepositEvent> = match key.side {
                TransferSide::Initiated => logs
                    .iter()
                    .filter_map(parse_deposit_initiated_log)
                    // The L1 query returns this sender's deposits for
                    // every token; keep only the one asked about.
                    .filter(|event| event.l1_token == key.l1_token)
                    .collect(),
                TransferSide::Finalized => {
                    logs.iter().filter_map(parse_deposit_finalized_log).collect()
                }
            };
            self.store
                .replace(key.monitored, key.l1_token, key.side, events);
        }

        let mut outstanding = OutstandingTransfers::new();
        for &monitored in &self.monitored {
            let per_token = outstanding.entry(monitored).or_default();
            for &l1_token in &supported {
                per_token.insert(l1_token, self.store.outstanding(monitored, l1_token));
            }
        }

        Ok(outstanding)
    }

    async fn submit_transfer(
        &self,
        address: Address,
        l1_token: Address,
        amount: U256,
    ) -> Result<B256> {
        if !self.settings.is_supported(l1_token) {
            return Err(RelayError::UnsupportedToken(l1_token).into());
        }

        info!(
            token = %l1_token,
            to = %address,
            amount = %amount,
            "Bridging tokens to the destination chain"
        );

        let call = L1GatewayRouter::outboundTransferCall {
            _token: l1_token,
            _to: address,
            _amount: amount,
            _maxGas: U256::from(L2_GAS_LIMIT),
            _gasPriceBid: U256::from(L2_GAS_PRICE_WEI),
            _data: submission_data()?,
        };
        let execution = ExecutionCall {
            target: self.settings.router(),
            calldata: call.abi_encode().into(),
        };

        self.submitter
            .submit(&execution, U256::from(L1_SUBMIT_VALUE_WEI))
            .await
    }
}

fn submission_data() -> Result<Bytes> {
    let raw = hex::decode(&SUBMISSION_DATA[2..]).wrap_err("Invalid submission data constant")?;
    Ok(Bytes::from(raw))
}

/// Parse a `DepositInitiated` log.
///
/// Indexed topics: sender, recipient, sequence number.
/// Non-indexed data: token (address), amount.
pub fn parse_deposit_initiated_log(log: &Log) -> Option<DepositEvent> {
    let topics = log.topics();
    if topics.len() < 4 {
        return None;
    }
    let data = log.data().data.as_ref();
    if data.len() < 64 {
        return None;
    }

    let (block_number, log_index, tx_hash) = log_position(log)?;
    Some(DepositEvent {
        side: TransferSide::Initiated,
        monitored: Address::from_word(topics[1]),
        l1_token: Address::from_slice(&data[12..32]),
        amount: U256::from_be_slice(&data[32..64]),
        block_number,
        log_index,
        tx_hash,
    })
}

/// Parse a `DepositFinalized` log.
///
/// Indexed topics: L1 token, sender, recipient.
/// Non-indexed data: amount.
pub fn parse_deposit_finalized_log(log: &Log) -> Option<DepositEvent> {
    let topics = log.topics();
    if topics.len() < 4 {
        return None;
    }
    let data = log.data().data.as_ref();
    if data.len() < 32 {
        return None;
    }

    let (block_number, log_index, tx_hash) = log_position(log)?;
    Some(DepositEvent {
        side: TransferSide::Finalized,
        monitored: Address::from_word(topics[3]),
        l1_token: Address::from_word(topics[1]),
        amount: U256::from_be_slice(&data[0..32]),
        block_number,
        log_index,
        tx_hash,
    })
}

fn log_position(log: &Log) -> Option<(u64, u64, B256)> {
    match (log.block_number, log.log_index, log.transaction_hash) {
        (Some(block), Some(index), Some(hash)) => Some((block, index, hash)),
        _ => {
            // Range queries never return pending logs; missing fields
            // mean the node sent something unusable.
            warn!(tx_hash = ?log.transaction_hash, "Log is missing position metadata");
            None
        }
    }
}
