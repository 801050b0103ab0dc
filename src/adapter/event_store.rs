//! In-memory store of observed bridge deposit events
//!
//! Holds the Initiated (L1) and Finalized (L2) event groups per
//! (monitored address, L1 token). Each reconciliation pass replaces a
//! group wholesale, so a refresh is idempotent rather than an unbounded
//! log. Owned by exactly one adapter; written only after every query of
//! a pass has completed, so there is never a concurrent writer.

use alloy::primitives::{Address, U256};
use std::collections::HashMap;
use tracing::warn;

use crate::types::{DepositEvent, TransferSide};

#[derive(Debug, Default)]
pub struct ChainEventStore {
    initiated: HashMap<(Address, Address), Vec<DepositEvent>>,
    finalized: HashMap<(Address, Address), Vec<DepositEvent>>,
}

impl ChainEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the event group for one (address, token, side) with this
    /// epoch's query result. Events are kept in (block number, log
    /// index) ascending order.
    pub fn replace(
        &mut self,
        monitored: Address,
        l1_token: Address,
        side: TransferSide,
        mut events: Vec<DepositEvent>,
    ) {
        events.sort_by_key(|e| (e.block_number, e.log_index));
        self.side_map_mut(side).insert((monitored, l1_token), events);
    }

    /// Recorded events for one group, oldest first
    pub fn events(
        &self,
        monitored: Address,
        l1_token: Address,
        side: TransferSide,
    ) -> &[DepositEvent] {
        self.side_map(side)
            .get(&(monitored, l1_token))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Outstanding in-flight amount for one (address, token) group:
    /// sum of initiated minus sum of finalized, clamped to zero.
    ///
    /// Finalized amounts exceeding initiated ones indicate observed
    /// divergence (e.g. an initiation outside the lookback window);
    /// the divergence is logged and the result clamps to zero rather
    /// than going negative.
    pub fn outstanding(&self, monitored: Address, l1_token: Address) -> U256 {
        let initiated = sum_amounts(self.events(monitored, l1_token, TransferSide::Initiated));
        let finalized = sum_amounts(self.events(monitored, l1_token, TransferSide::Finalized));

        if finalized > initiated {
            warn!(
                address = %monitored,
                token = %l1_token,
                initiated = %initiated,
                finalized = %finalized,
                "Finalized deposits exceed initiated ones; clamping outstanding amount to zero"
            );
            return U256::ZERO;
        }
        initiated - finalized
    }

    fn side_map(&self, side: TransferSide) -> &HashMap<(Address, Address), Vec<DepositEvent>> {
        match side {
            TransferSide::Initiated => &self.initiated,
            TransferSide::Finalized => &self.finalized,
        }
    }

    fn side_map_mut(
        &mut self,
        side: TransferSide,
    ) -> &mut HashMap<(Address, Address), Vec<DepositEvent>> {
        match side {
            TransferSide::Initiated => &mut self.initiated,
            TransferSide::Finalized => &mut self.finalized,
        }
    }
}

fn sum_amounts(events: &[DepositEvent]) -> U256 {
    events
        .iter()
        .fold(U256::ZERO, |acc, e| acc.saturating_add(e.amount))
}
