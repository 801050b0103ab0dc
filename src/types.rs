//! Common types for cross-chain reconciliation and finalization
//!
//! Amounts are kept as raw `U256` base units everywhere except the
//! reporting layer, which converts to decimal-adjusted values.

#![allow(dead_code)]

use alloy::primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A source/destination token pair bridged by the gateway.
///
/// The adapter only operates on tokens it has a known pair for; tokens
/// without a pair are silently skipped during reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BridgeToken {
    /// Token address on the source (L1) chain
    pub l1: Address,
    /// Token address on the destination (L2) chain
    pub l2: Address,
}

/// Which side of the bridge a deposit event was observed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferSide {
    /// Deposit initiated on the source chain
    Initiated,
    /// Deposit finalized on the destination chain
    Finalized,
}

impl TransferSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferSide::Initiated => "initiated",
            TransferSide::Finalized => "finalized",
        }
    }
}

impl fmt::Display for TransferSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One bridge-crossing observation, decoded from a chain log.
///
/// Ordering within an (address, token) group is by
/// (block_number, log_index) ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositEvent {
    pub side: TransferSide,
    pub monitored: Address,
    /// L1 token the deposit moves; L1 deposit events do not index this
    /// field, so it is filtered client-side after decoding.
    pub l1_token: Address,
    pub amount: U256,
    pub block_number: u64,
    pub log_index: u64,
    pub tx_hash: B256,
}

/// An observation on the L2 chain that a withdrawal back toward L1 was
/// started. Multiple events may share a transaction hash; each gets a
/// sequence index equal to the count of prior events with that hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalInitiationEvent {
    pub tx_hash: B256,
    pub amount: U256,
    /// Token address on the L2 chain
    pub l2_token: Address,
}

/// Lifecycle state of an outbound L2-to-L1 message.
///
/// Transitions are externally driven and monotonic:
/// Unconfirmed -> Confirmed -> Executed. The relayer only observes
/// transitions; submitting the built execution call is what moves a
/// message from Confirmed to Executed on chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageStatus {
    /// Dispute window still open, or the message could not be located.
    /// Both are retryable on the next pass.
    Unconfirmed,
    /// Finality window elapsed; executable but not yet executed
    Confirmed,
    /// Already run on the L1 chain
    Executed,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Unconfirmed => "unconfirmed",
            MessageStatus::Confirmed => "confirmed",
            MessageStatus::Executed => "executed",
        }
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Envelope of one outbound L2-to-L1 message, as emitted at origination
/// time by the L2 system contract.
///
/// These are exactly the fields the outbox execution entrypoint takes;
/// no access to SDK internals is needed to rebuild the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct L2ToL1Message {
    /// Position in the outbox send accumulator
    pub position: U256,
    /// Origin sender on the L2 chain
    pub caller: Address,
    /// Destination address on the L1 chain
    pub destination: Address,
    /// L2 block number at origination
    pub l2_block: U256,
    /// L1 block number observed at origination
    pub l1_block: U256,
    /// Origination timestamp
    pub timestamp: U256,
    /// Native value attached to the message
    pub callvalue: U256,
    /// Opaque payload bytes
    pub data: Bytes,
}

/// Inclusion proof for one outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxProof {
    /// Merkle proof elements from leaf to accumulator root
    pub elements: Vec<B256>,
}

/// Outcome of resolving one withdrawal-initiation event.
///
/// `resolve_all` returns one of these per input event, in input order;
/// no event is dropped even when unresolved.
#[derive(Debug, Clone)]
pub struct ResolvedWithdrawal {
    pub event: WithdrawalInitiationEvent,
    /// Present when the message was located on the L2 chain
    pub message: Option<L2ToL1Message>,
    pub status: MessageStatus,
}

/// Fully-encoded payload needed to execute one Confirmed message.
/// Built fresh per finalization pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionCall {
    pub target: Address,
    pub calldata: Bytes,
}

/// Human-readable withdrawal record for observability and reporting.
#[derive(Debug, Clone, Serialize)]
pub struct WithdrawalSummary {
    pub l2_chain_id: u64,
    pub l1_token_symbol: String,
    /// Decimal-adjusted amount, e.g. "1.5" for 1500000 of a 6-decimal token
    pub amount: bigdecimal::BigDecimal,
}
