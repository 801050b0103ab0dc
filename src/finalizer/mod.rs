//! Withdrawal finalization pipeline
//!
//! Scan the L2 gateways for withdrawal initiations, resolve each one to
//! its outbound message and lifecycle status, plan execution calls for
//! the Confirmed ones, and assemble the batch handed to the submitter.

pub mod batch;
pub mod planner;
pub mod resolver;

pub use batch::{BatchAssembler, FinalizationBatch};
pub use planner::FinalizationPlanner;
pub use resolver::MessageStatusResolver;

use alloy::primitives::{Address, B256, U256};
use alloy::rpc::types::Log;
use eyre::Result;
use std::sync::Arc;
use tracing::debug;

use crate::adapter::GatewaySettings;
use crate::chain::{LogQueryService, LogQuerySpec};
use crate::contracts;
use crate::types::WithdrawalInitiationEvent;

/// Discovers withdrawal initiations on the configured L2 gateways
/// within the lookback window.
pub struct WithdrawalScanner {
    l2_logs: Arc<dyn LogQueryService>,
    settings: GatewaySettings,
    lookback_blocks: u64,
}

impl WithdrawalScanner {
    pub fn new(
        l2_logs: Arc<dyn LogQueryService>,
        settings: GatewaySettings,
        lookback_blocks: u64,
    ) -> Self {
        Self {
            l2_logs,
            settings,
            lookback_blocks,
        }
    }

    /// Withdrawal-initiation events in chain order. Chain order keeps
    /// sequence-index assignment reproducible across passes.
    pub async fn scan(&self) -> Result<Vec<WithdrawalInitiationEvent>> {
        let tip = self.l2_logs.latest_block().await?;
        let from = tip.saturating_sub(self.lookback_blocks);

        let mut scanned = Vec::new();
        for gateway in self.settings.l2_gateways() {
            let spec = LogQuerySpec::new(
                gateway,
                contracts::withdrawal_initiated_signature(),
                from,
                tip,
            );
            for log in self.l2_logs.query(&spec).await? {
                let Some(withdrawal) = parse_withdrawal_initiated_log(&log) else {
                    continue;
                };
                let Some(l2_token) = self.settings.l2_token_for(withdrawal.l1_token) else {
                    debug!(token = %withdrawal.l1_token, "Skipping withdrawal of unmonitored token");
                    continue;
                };
                scanned.push((
                    withdrawal.block_number,
                    withdrawal.log_index,
                    WithdrawalInitiationEvent {
                        tx_hash: withdrawal.tx_hash,
                        amount: withdrawal.amount,
                        l2_token,
                    },
                ));
            }
        }

        scanned.sort_by_key(|(block, index, _)| (*block, *index));
        Ok(scanned.into_iter().map(|(_, _, event)| event).collect())
    }
}

struct ScannedWithdrawal {
    l1_token: Address,
    amount: U256,
    block_number: u64,
    log_index: u64,
    tx_hash: B256,
}

/// Parse a `WithdrawalInitiated` log.
///
/// Indexed topics: sender, recipient, outbound message id.
/// Non-indexed data: L1 token, exit number, amount.
fn parse_withdrawal_initiated_log(log: &Log) -> Option<ScannedWithdrawal> {
    let topics = log.topics();
    if topics.len() < 4 {
        return None;
    }
    let data = log.data().data.as_ref();
    if data.len() < 96 {
        return None;
    }

    let (block_number, log_index, tx_hash) =
        match (log.block_number, log.log_index, log.transaction_hash) {
            (Some(block), Some(index), Some(hash)) => (block, index, hash),
            _ => return None,
        };

    Some(ScannedWithdrawal {
        l1_token: Address::from_slice(&data[12..32]),
        amount: U256::from_be_slice(&data[64..96]),
        block_number,
        log_index,
        tx_hash,
    })
}
