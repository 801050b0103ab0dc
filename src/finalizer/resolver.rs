//! Withdrawal message resolution
//!
//! Maps each withdrawal-initiation event to its outbound message on the
//! L2 chain and queries its lifecycle status. A transaction can emit
//! several withdrawal messages; events sharing a transaction hash are
//! correlated to the receipt's message list by sequence index, assigned
//! strictly in input order before any lookup is dispatched.

use alloy::primitives::B256;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error};

use crate::chain::MessageService;
use crate::error::RelayError;
use crate::metrics;
use crate::types::{MessageStatus, ResolvedWithdrawal, WithdrawalInitiationEvent};

pub struct MessageStatusResolver {
    service: Arc<dyn MessageService>,
}

impl MessageStatusResolver {
    pub fn new(service: Arc<dyn MessageService>) -> Self {
        Self { service }
    }

    /// Resolve every event, concurrently and fail-soft: one result per
    /// input event, in input order, with per-item failures downgraded
    /// to Unconfirmed so a single stuck transaction never blocks the
    /// batch.
    pub async fn resolve_all(
        &self,
        events: &[WithdrawalInitiationEvent],
    ) -> Vec<ResolvedWithdrawal> {
        // The per-hash counter resets every call; given the same input
        // ordering it assigns the same indices on every run.
        let mut counters: HashMap<B256, u32> = HashMap::new();
        let indexed: Vec<(WithdrawalInitiationEvent, u32)> = events
            .iter()
            .map(|event| {
                let counter = counters.entry(event.tx_hash).or_insert(0);
                let index = *counter;
                *counter += 1;
                (event.clone(), index)
            })
            .collect();

        let results = join_all(
            indexed
                .into_iter()
                .map(|(event, index)| self.resolve_one(event, index)),
        )
        .await;

        for resolved in &results {
            metrics::WITHDRAWALS_RESOLVED
                .with_label_values(&[resolved.status.as_str()])
                .inc();
        }

        results
    }

    async fn resolve_one(
        &self,
        event: WithdrawalInitiationEvent,
        index: u32,
    ) -> ResolvedWithdrawal {
        match self.try_resolve(&event, index).await {
            Ok(resolved) => resolved,
            Err(err @ RelayError::StructuralAnomaly { .. }) => {
                // A relay transaction without its expected message is a
                // protocol-level inconsistency; keep the batch moving
                // but make noise.
                metrics::STRUCTURAL_ANOMALIES.inc();
                error!(
                    tx_hash = %event.tx_hash,
                    sequence_index = index,
                    "{}", err
                );
                unresolved(event)
            }
            Err(err) => {
                // Usually the transaction has not been sequenced into a
                // destination-visible batch yet; retry next pass.
                debug!(
                    tx_hash = %event.tx_hash,
                    sequence_index = index,
                    error = %err,
                    "Message lookup failed; treating as unconfirmed"
                );
                unresolved(event)
            }
        }
    }

    async fn try_resolve(
        &self,
        event: &WithdrawalInitiationEvent,
        index: u32,
    ) -> Result<ResolvedWithdrawal, RelayError> {
        let messages = self
            .service
            .outbound_messages(event.tx_hash)
            .await
            .map_err(|e| RelayError::TransientLookup(e.to_string()))?;
        let found = messages.len();

        match messages.into_iter().nth(index as usize) {
            None => Err(RelayError::StructuralAnomaly {
                tx_hash: event.tx_hash,
                index,
                found,
            }),
            Some(message) => {
                let status = self
                    .service
                    .status(&message)
                    .await
                    .map_err(|e| RelayError::TransientLookup(e.to_string()))?;
                Ok(ResolvedWithdrawal {
                    event: event.clone(),
                    message: Some(message),
                    status,
                })
            }
        }
    }
}

fn unresolved(event: WithdrawalInitiationEvent) -> ResolvedWithdrawal {
    ResolvedWithdrawal {
        event,
        message: None,
        status: MessageStatus::Unconfirmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::L2ToL1Message;
    use alloy::primitives::{Address, Bytes, U256};
    use async_trait::async_trait;
    use eyre::Result;
    use std::collections::HashSet;

    fn message(position: u64) -> L2ToL1Message {
        L2ToL1Message {
            position: U256::from(position),
            caller: Address::repeat_byte(0xAA),
            destination: Address::repeat_byte(0xBB),
            l2_block: U256::from(100u64),
            l1_block: U256::from(10u64),
            timestamp: U256::from(1_700_000_000u64),
            callvalue: U256::ZERO,
            data: Bytes::new(),
        }
    }

    fn event(tx_byte: u8) -> WithdrawalInitiationEvent {
        WithdrawalInitiationEvent {
            tx_hash: B256::repeat_byte(tx_byte),
            amount: U256::from(1_000u64),
            l2_token: Address::repeat_byte(0x11),
        }
    }

    /// Canned message lists per transaction hash; statuses per outbox
    /// position; optional hard failures per transaction hash.
    struct MockService {
        messages: HashMap<B256, Vec<L2ToL1Message>>,
        statuses: HashMap<u64, MessageStatus>,
        fail_for: HashSet<B256>,
    }

    impl MockService {
        fn new() -> Self {
            Self {
                messages: HashMap::new(),
                statuses: HashMap::new(),
                fail_for: HashSet::new(),
            }
        }

        fn with_messages(mut self, tx_hash: B256, count: u64) -> Self {
            self.messages
                .insert(tx_hash, (0..count).map(message).collect());
            self
        }

        fn with_status(mut self, position: u64, status: MessageStatus) -> Self {
            self.statuses.insert(position, status);
            self
        }

        fn failing_for(mut self, tx_hash: B256) -> Self {
            self.fail_for.insert(tx_hash);
            self
        }
    }

    #[async_trait]
    impl MessageService for MockService {
        async fn outbound_messages(&self, tx_hash: B256) -> Result<Vec<L2ToL1Message>> {
            if self.fail_for.contains(&tx_hash) {
                return Err(eyre::eyre!("receipt not yet available"));
            }
            Ok(self.messages.get(&tx_hash).cloned().unwrap_or_default())
        }

        async fn status(&self, message: &L2ToL1Message) -> Result<MessageStatus> {
            let position = message.position.to::<u64>();
            Ok(*self
                .statuses
                .get(&position)
                .unwrap_or(&MessageStatus::Unconfirmed))
        }

        async fn proof(&self, _message: &L2ToL1Message) -> Result<crate::types::OutboxProof> {
            Err(eyre::eyre!("not used in resolver tests"))
        }
    }

    #[tokio::test]
    async fn test_sequence_indices_follow_input_order() {
        // Three events share one hash; each must map to a distinct
        // message, in receipt order.
        let tx = B256::repeat_byte(0x01);
        let service = MockService::new()
            .with_messages(tx, 3)
            .with_status(0, MessageStatus::Confirmed)
            .with_status(1, MessageStatus::Confirmed)
            .with_status(2, MessageStatus::Confirmed);
        let resolver = MessageStatusResolver::new(Arc::new(service));

        let events = vec![event(0x01), event(0x01), event(0x01)];
        let resolved = resolver.resolve_all(&events).await;

        assert_eq!(resolved.len(), 3);
        for (i, item) in resolved.iter().enumerate() {
            let msg = item.message.as_ref().expect("message should be present");
            assert_eq!(msg.position, U256::from(i as u64));
        }
    }

    #[tokio::test]
    async fn test_unique_hash_gets_index_zero() {
        let tx = B256::repeat_byte(0x02);
        let service = MockService::new()
            .with_messages(tx, 1)
            .with_status(0, MessageStatus::Executed);
        let resolver = MessageStatusResolver::new(Arc::new(service));

        let resolved = resolver.resolve_all(&[event(0x02)]).await;

        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].status, MessageStatus::Executed);
        assert_eq!(
            resolved[0].message.as_ref().unwrap().position,
            U256::ZERO
        );
    }

    #[tokio::test]
    async fn test_assignment_is_deterministic_across_runs() {
        let tx_a = B256::repeat_byte(0x01);
        let tx_b = B256::repeat_byte(0x02);
        let service = MockService::new()
            .with_messages(tx_a, 2)
            .with_messages(tx_b, 1)
            .with_status(0, MessageStatus::Confirmed)
            .with_status(1, MessageStatus::Confirmed);
        let resolver = MessageStatusResolver::new(Arc::new(service));

        // Interleaved input: a, b, a
        let events = vec![event(0x01), event(0x02), event(0x01)];
        let first = resolver.resolve_all(&events).await;
        let second = resolver.resolve_all(&events).await;

        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.status, b.status);
            assert_eq!(
                a.message.as_ref().map(|m| m.position),
                b.message.as_ref().map(|m| m.position)
            );
        }
        // a-events got positions 0 and 1; the b-event got position 0
        assert_eq!(first[0].message.as_ref().unwrap().position, U256::ZERO);
        assert_eq!(
            first[1].message.as_ref().unwrap().position,
            U256::ZERO
        );
        assert_eq!(
            first[2].message.as_ref().unwrap().position,
            U256::from(1u64)
        );
    }

    #[tokio::test]
    async fn test_missing_message_reported_unconfirmed_absent() {
        // Three events share a hash but the chain reports only two
        // outbound messages: indices 0 and 1 resolve, index 2 is the
        // anomaly.
        let tx = B256::repeat_byte(0x03);
        let service = MockService::new()
            .with_messages(tx, 2)
            .with_status(0, MessageStatus::Confirmed)
            .with_status(1, MessageStatus::Executed);
        let resolver = MessageStatusResolver::new(Arc::new(service));

        let events = vec![event(0x03), event(0x03), event(0x03)];
        let resolved = resolver.resolve_all(&events).await;

        assert_eq!(resolved.len(), 3);
        assert_eq!(resolved[0].status, MessageStatus::Confirmed);
        assert!(resolved[0].message.is_some());
        assert_eq!(resolved[1].status, MessageStatus::Executed);
        assert!(resolved[1].message.is_some());
        assert_eq!(resolved[2].status, MessageStatus::Unconfirmed);
        assert!(resolved[2].message.is_none());
    }

    #[tokio::test]
    async fn test_one_failure_does_not_affect_others() {
        let tx_ok = B256::repeat_byte(0x04);
        let tx_bad = B256::repeat_byte(0x05);
        let service = MockService::new()
            .with_messages(tx_ok, 1)
            .with_status(0, MessageStatus::Confirmed)
            .failing_for(tx_bad);
        let resolver = MessageStatusResolver::new(Arc::new(service));

        let events = vec![event(0x04), event(0x05), event(0x04)];
        let resolved = resolver.resolve_all(&events).await;

        // All inputs represented, in order; only the failing one is
        // downgraded.
        assert_eq!(resolved.len(), 3);
        assert_eq!(resolved[0].status, MessageStatus::Confirmed);
        assert_eq!(resolved[1].status, MessageStatus::Unconfirmed);
        assert!(resolved[1].message.is_none());
        // Second event for tx_ok wants index 1 which does not exist:
        // structurally missing, also downgraded without poisoning the
        // first.
        assert_eq!(resolved[2].status, MessageStatus::Unconfirmed);
        assert_eq!(resolved[0].event.tx_hash, tx_ok);
    }

    #[tokio::test]
    async fn test_below_confirmed_returns_message_present() {
        let tx = B256::repeat_byte(0x06);
        let service = MockService::new().with_messages(tx, 1);
        // No status recorded -> mock returns Unconfirmed
        let resolver = MessageStatusResolver::new(Arc::new(service));

        let resolved = resolver.resolve_all(&[event(0x06)]).await;

        assert_eq!(resolved[0].status, MessageStatus::Unconfirmed);
        assert!(resolved[0].message.is_some());
    }
}
