//! L2-to-L1 message surface of the rollup
//!
//! `MessageService` is what the resolver and planner program against.
//! The concrete client reads outbound-message envelopes from the
//! `L2ToL1Tx` events in a transaction's receipt, derives lifecycle
//! status from the outbox and rollup contracts, and builds inclusion
//! proofs through the node interface.

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::rpc::types::Log;
use alloy::transports::http::{Client, Http};
use async_trait::async_trait;
use eyre::{eyre, Result, WrapErr};
use tracing::warn;

use crate::contracts::{self, INodeInterface, IOutbox, IRollup, ARB_SYS, NODE_INTERFACE};
use crate::types::{L2ToL1Message, MessageStatus, OutboxProof};

#[async_trait]
pub trait MessageService: Send + Sync {
    /// Outbound messages produced by the given L2 transaction, in the
    /// order they were emitted. Empty when the transaction produced none.
    async fn outbound_messages(&self, tx_hash: B256) -> Result<Vec<L2ToL1Message>>;

    /// Current lifecycle status of one message
    async fn status(&self, message: &L2ToL1Message) -> Result<MessageStatus>;

    /// Inclusion proof for a Confirmed message
    async fn proof(&self, message: &L2ToL1Message) -> Result<OutboxProof>;
}

/// Message service backed by the rollup's canonical contracts
pub struct NitroMessageClient {
    l1_provider: RootProvider<Http<Client>>,
    l2_provider: RootProvider<Http<Client>>,
    outbox: Address,
    rollup: Address,
}

impl NitroMessageClient {
    pub fn new(l1_rpc_url: &str, l2_rpc_url: &str, outbox: Address, rollup: Address) -> Result<Self> {
        let l1_provider = ProviderBuilder::new()
            .on_http(l1_rpc_url.parse().wrap_err("Failed to parse L1 RPC URL")?);
        let l2_provider = ProviderBuilder::new()
            .on_http(l2_rpc_url.parse().wrap_err("Failed to parse L2 RPC URL")?);

        Ok(Self {
            l1_provider,
            l2_provider,
            outbox,
            rollup,
        })
    }

    /// Send count covered by the latest confirmed assertion. Messages
    /// below this position have cleared the dispute window.
    async fn confirmed_send_count(&self) -> Result<U256> {
        let rollup = IRollup::new(self.rollup, &self.l1_provider);
        let result = rollup
            .confirmedSendCount()
            .call()
            .await
            .wrap_err("Failed to get confirmed send count")?;
        Ok(result._0)
    }
}

#[async_trait]
impl MessageService for NitroMessageClient {
    async fn outbound_messages(&self, tx_hash: B256) -> Result<Vec<L2ToL1Message>> {
        let receipt = self
            .l2_provider
            .get_transaction_receipt(tx_hash)
            .await
            .wrap_err("Failed to get transaction receipt")?
            .ok_or_else(|| eyre!("No receipt found for transaction {}", tx_hash))?;

        let signature = contracts::l2_to_l1_tx_signature();
        let mut messages = Vec::new();
        for log in receipt.inner.logs() {
            if log.address() != ARB_SYS {
                continue;
            }
            let topics = log.topics();
            if topics.is_empty() || topics[0] != signature {
                continue;
            }
            match parse_l2_to_l1_tx_log(log) {
                Some(message) => messages.push(message),
                None => warn!(
                    tx_hash = %tx_hash,
                    log_index = ?log.log_index,
                    "Malformed outbound-message log"
                ),
            }
        }

        Ok(messages)
    }

    async fn status(&self, message: &L2ToL1Message) -> Result<MessageStatus> {
        let outbox = IOutbox::new(self.outbox, &self.l1_provider);
        let spent = outbox
            .isSpent(message.position)
            .call()
            .await
            .wrap_err("Failed to check outbox spent state")?
            ._0;
        if spent {
            return Ok(MessageStatus::Executed);
        }

        let confirmed = self.confirmed_send_count().await?;
        if message.position < confirmed {
            Ok(MessageStatus::Confirmed)
        } else {
            Ok(MessageStatus::Unconfirmed)
        }
    }

    async fn proof(&self, message: &L2ToL1Message) -> Result<OutboxProof> {
        let size: u64 = self
            .confirmed_send_count()
            .await?
            .try_into()
            .map_err(|_| eyre!("Confirmed send count does not fit in u64"))?;
        let leaf: u64 = message
            .position
            .try_into()
            .map_err(|_| eyre!("Outbox position {} does not fit in u64", message.position))?;

        let node_interface = INodeInterface::new(NODE_INTERFACE, &self.l2_provider);
        let result = node_interface
            .constructOutboxProof(size, leaf)
            .call()
            .await
            .wrap_err_with(|| format!("Failed to construct outbox proof for position {}", leaf))?;

        Ok(OutboxProof {
            elements: result.proof,
        })
    }
}

/// Parse an `L2ToL1Tx` log into a message envelope.
///
/// Indexed topics:
///   topics[1] = destination (address)
///   topics[2] = message hash
///   topics[3] = position in the send accumulator
///
/// Non-indexed data (abi encoded):
///   caller, arbBlockNum, ethBlockNum, timestamp, callvalue,
///   offset + length + bytes of the payload
pub fn parse_l2_to_l1_tx_log(log: &Log) -> Option<L2ToL1Message> {
    let topics = log.topics();
    if topics.len() < 4 {
        return None;
    }

    let destination = Address::from_word(topics[1]);
    let position = U256::from_be_bytes(topics[3].0);

    let data = log.data().data.as_ref();
    if data.len() < 224 {
        return None;
    }

    let caller = Address::from_slice(&data[12..32]);
    let l2_block = U256::from_be_slice(&data[32..64]);
    let l1_block = U256::from_be_slice(&data[64..96]);
    let timestamp = U256::from_be_slice(&data[96..128]);
    let callvalue = U256::from_be_slice(&data[128..160]);

    let payload_len: usize = U256::from_be_slice(&data[192..224]).try_into().ok()?;
    if data.len() < 224 + payload_len {
        return None;
    }
    let payload = Bytes::copy_from_slice(&data[224..224 + payload_len]);

    Some(L2ToL1Message {
        position,
        caller,
        destination,
        l2_block,
        l1_block,
        timestamp,
        callvalue,
        data: payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::LogData;

    fn l2_to_l1_log(position: u64, payload: &[u8]) -> Log {
        let mut data = Vec::new();
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(Address::repeat_byte(0xAA).as_slice());
        data.extend_from_slice(&word); // caller
        data.extend_from_slice(&U256::from(1234u64).to_be_bytes::<32>()); // arbBlockNum
        data.extend_from_slice(&U256::from(99u64).to_be_bytes::<32>()); // ethBlockNum
        data.extend_from_slice(&U256::from(1_700_000_000u64).to_be_bytes::<32>()); // timestamp
        data.extend_from_slice(&U256::ZERO.to_be_bytes::<32>()); // callvalue
        data.extend_from_slice(&U256::from(192u64).to_be_bytes::<32>()); // offset
        data.extend_from_slice(&U256::from(payload.len() as u64).to_be_bytes::<32>()); // length
        data.extend_from_slice(payload);

        let topics = vec![
            contracts::l2_to_l1_tx_signature(),
            Address::repeat_byte(0xBB).into_word(),
            B256::repeat_byte(0xCC),
            B256::from(U256::from(position)),
        ];

        Log {
            inner: alloy::primitives::Log {
                address: ARB_SYS,
                data: LogData::new_unchecked(topics, data.into()),
            },
            block_hash: None,
            block_number: Some(1234),
            block_timestamp: None,
            transaction_hash: Some(B256::repeat_byte(0x11)),
            transaction_index: None,
            log_index: Some(0),
            removed: false,
        }
    }

    #[test]
    fn test_parse_l2_to_l1_tx_log() {
        let payload = vec![0xDE, 0xAD, 0xBE, 0xEF];
        let log = l2_to_l1_log(7, &payload);
        let message = parse_l2_to_l1_tx_log(&log).expect("should parse");

        assert_eq!(message.position, U256::from(7u64));
        assert_eq!(message.caller, Address::repeat_byte(0xAA));
        assert_eq!(message.destination, Address::repeat_byte(0xBB));
        assert_eq!(message.l2_block, U256::from(1234u64));
        assert_eq!(message.l1_block, U256::from(99u64));
        assert_eq!(message.callvalue, U256::ZERO);
        assert_eq!(message.data.as_ref(), payload.as_slice());
    }

    #[test]
    fn test_parse_rejects_truncated_data() {
        let mut log = l2_to_l1_log(1, &[0x01]);
        let topics = log.topics().to_vec();
        log.inner.data = LogData::new_unchecked(topics, vec![0u8; 64].into());
        assert!(parse_l2_to_l1_tx_log(&log).is_none());
    }

    #[test]
    fn test_parse_rejects_missing_topics() {
        let mut log = l2_to_l1_log(1, &[]);
        log.inner.data = LogData::new_unchecked(
            vec![contracts::l2_to_l1_tx_signature()],
            log.data().data.clone(),
        );
        assert!(parse_l2_to_l1_tx_log(&log).is_none());
    }

    #[test]
    fn test_parse_empty_payload() {
        let log = l2_to_l1_log(3, &[]);
        let message = parse_l2_to_l1_tx_log(&log).expect("should parse");
        assert!(message.data.is_empty());
    }
}
