//! Finalization planning
//!
//! Selects the resolved messages that are ready to execute and builds
//! the outbox execution call for each. Only Confirmed messages are
//! actionable: Executed ones need nothing, Unconfirmed ones are not yet
//! provable. The outbox itself rejects double execution, so the planner
//! only guards selection, not idempotency.

use alloy::primitives::Address;
use alloy::sol_types::SolCall;
use std::sync::Arc;
use tracing::info;

use crate::chain::MessageService;
use crate::contracts::IOutbox;
use crate::error::RelayError;
use crate::metrics;
use crate::types::{ExecutionCall, L2ToL1Message, MessageStatus, ResolvedWithdrawal};

pub struct FinalizationPlanner {
    service: Arc<dyn MessageService>,
    outbox: Address,
}

impl FinalizationPlanner {
    pub fn new(service: Arc<dyn MessageService>, outbox: Address) -> Self {
        Self { service, outbox }
    }

    /// Exactly the Confirmed messages, in their original relative
    /// order. Emits the per-status counts for drift monitoring.
    pub fn select_ready<'a>(
        &self,
        resolved: &'a [ResolvedWithdrawal],
    ) -> Vec<&'a ResolvedWithdrawal> {
        let mut unconfirmed = 0usize;
        let mut confirmed = 0usize;
        let mut executed = 0usize;
        for item in resolved {
            match item.status {
                MessageStatus::Unconfirmed => unconfirmed += 1,
                MessageStatus::Confirmed => confirmed += 1,
                MessageStatus::Executed => executed += 1,
            }
        }

        info!(unconfirmed, confirmed, executed, "Outbox message statuses");
        metrics::WITHDRAWAL_STATUS
            .with_label_values(&["unconfirmed"])
            .set(unconfirmed as f64);
        metrics::WITHDRAWAL_STATUS
            .with_label_values(&["confirmed"])
            .set(confirmed as f64);
        metrics::WITHDRAWAL_STATUS
            .with_label_values(&["executed"])
            .set(executed as f64);

        resolved
            .iter()
            .filter(|item| item.status == MessageStatus::Confirmed && item.message.is_some())
            .collect()
    }

    /// Build the outbox execution call for one Confirmed message. Proof
    /// failures propagate per message so an operator learns about a
    /// Confirmed message that cannot be finalized; other messages in
    /// the batch are unaffected.
    pub async fn build_execution_call(
        &self,
        message: &L2ToL1Message,
    ) -> Result<ExecutionCall, RelayError> {
        let proof = self
            .service
            .proof(message)
            .await
            .map_err(|e| RelayError::ProofUnavailable {
                position: message.position,
                reason: e.to_string(),
            })?;

        let call = IOutbox::executeTransactionCall {
            proof: proof.elements,
            index: message.position,
            l2Sender: message.caller,
            to: message.destination,
            l2Block: message.l2_block,
            l1Block: message.l1_block,
            l2Timestamp: message.timestamp,
            value: message.callvalue,
            data: message.data.clone(),
        };

        metrics::FINALIZATIONS_PLANNED.inc();
        Ok(ExecutionCall {
            target: self.outbox,
            calldata: call.abi_encode().into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OutboxProof, WithdrawalInitiationEvent};
    use alloy::primitives::{Bytes, B256, U256};
    use async_trait::async_trait;
    use eyre::Result;

    fn message(position: u64) -> L2ToL1Message {
        L2ToL1Message {
            position: U256::from(position),
            caller: Address::repeat_byte(0xAA),
            destination: Address::repeat_byte(0xBB),
            l2_block: U256::from(4321u64),
            l1_block: U256::from(321u64),
            timestamp: U256::from(1_700_000_000u64),
            callvalue: U256::from(5u64),
            data: Bytes::from(vec![0xCA, 0xFE]),
        }
    }

    fn resolved(status: MessageStatus, position: u64) -> ResolvedWithdrawal {
        ResolvedWithdrawal {
            event: WithdrawalInitiationEvent {
                tx_hash: B256::repeat_byte(position as u8),
                amount: U256::from(100u64),
                l2_token: Address::repeat_byte(0x11),
            },
            message: Some(message(position)),
            status,
        }
    }

    struct MockProofService {
        fail: bool,
    }

    #[async_trait]
    impl MessageService for MockProofService {
        async fn outbound_messages(&self, _tx_hash: B256) -> Result<Vec<L2ToL1Message>> {
            Ok(Vec::new())
        }

        async fn status(&self, _message: &L2ToL1Message) -> Result<MessageStatus> {
            Ok(MessageStatus::Confirmed)
        }

        async fn proof(&self, _message: &L2ToL1Message) -> Result<OutboxProof> {
            if self.fail {
                return Err(eyre::eyre!("outbox state stale"));
            }
            Ok(OutboxProof {
                elements: vec![B256::repeat_byte(0x01), B256::repeat_byte(0x02)],
            })
        }
    }

    fn planner(fail: bool) -> FinalizationPlanner {
        FinalizationPlanner::new(
            Arc::new(MockProofService { fail }),
            Address::repeat_byte(0xF0),
        )
    }

    #[test]
    fn test_select_ready_keeps_only_confirmed() {
        let items = vec![
            resolved(MessageStatus::Unconfirmed, 0),
            resolved(MessageStatus::Confirmed, 1),
            resolved(MessageStatus::Executed, 2),
            resolved(MessageStatus::Confirmed, 3),
        ];
        let ready = planner(false).select_ready(&items);

        assert_eq!(ready.len(), 2);
        // Relative order preserved
        assert_eq!(
            ready[0].message.as_ref().unwrap().position,
            U256::from(1u64)
        );
        assert_eq!(
            ready[1].message.as_ref().unwrap().position,
            U256::from(3u64)
        );
        assert!(ready
            .iter()
            .all(|item| item.status == MessageStatus::Confirmed));
    }

    #[test]
    fn test_select_ready_skips_confirmed_without_handle() {
        let mut item = resolved(MessageStatus::Confirmed, 0);
        item.message = None;
        let binding = [item];
        let ready = planner(false).select_ready(&binding);
        assert!(ready.is_empty());
    }

    #[tokio::test]
    async fn test_build_execution_call_encodes_envelope() {
        let msg = message(42);
        let call = planner(false).build_execution_call(&msg).await.unwrap();

        assert_eq!(call.target, Address::repeat_byte(0xF0));

        let decoded = IOutbox::executeTransactionCall::abi_decode(&call.calldata, true).unwrap();
        assert_eq!(decoded.index, U256::from(42u64));
        assert_eq!(decoded.l2Sender, Address::repeat_byte(0xAA));
        assert_eq!(decoded.to, Address::repeat_byte(0xBB));
        assert_eq!(decoded.l2Block, U256::from(4321u64));
        assert_eq!(decoded.l1Block, U256::from(321u64));
        assert_eq!(decoded.value, U256::from(5u64));
        // Payload carried through unchanged
        assert_eq!(decoded.data.as_ref(), &[0xCA, 0xFE]);
        assert_eq!(decoded.proof.len(), 2);
    }

    #[tokio::test]
    async fn test_proof_failure_propagates() {
        let msg = message(7);
        let err = planner(true).build_execution_call(&msg).await.unwrap_err();
        assert!(matches!(err, RelayError::ProofUnavailable { .. }));
        assert!(err.to_string().contains("position 7"));
    }
}
