//! Contract ABI definitions for the gateway bridge and the rollup outbox
//!
//! Uses alloy's sol! macro to generate type-safe bindings. Deposit and
//! withdrawal events are decoded by hand from raw logs (see the parse
//! helpers next to their call sites); the signatures below are what the
//! log filters bind to.

#![allow(clippy::too_many_arguments)]

use alloy::primitives::{address, keccak256, Address, B256};
use alloy::sol;

/// L2 system contract emitting `L2ToL1Tx` for every outbound message
pub const ARB_SYS: Address = address!("0000000000000000000000000000000000000064");

/// L2 node interface exposing outbox proof construction
pub const NODE_INTERFACE: Address = address!("00000000000000000000000000000000000000C8");

sol! {
    /// L1 gateway router: entrypoint for moving tokens to the L2 chain
    #[sol(rpc)]
    contract L1GatewayRouter {
        /// Initiate a token deposit toward the L2 chain
        function outboundTransfer(
            address _token,
            address _to,
            uint256 _amount,
            uint256 _maxGas,
            uint256 _gasPriceBid,
            bytes calldata _data
        ) external payable returns (bytes memory);
    }

    /// L1 outbox: verifies and executes confirmed L2-to-L1 messages
    #[sol(rpc)]
    contract IOutbox {
        /// Execute one confirmed outbound message against its proof.
        /// Idempotent at the contract level: executing an already-spent
        /// position reverts safely.
        function executeTransaction(
            bytes32[] calldata proof,
            uint256 index,
            address l2Sender,
            address to,
            uint256 l2Block,
            uint256 l1Block,
            uint256 l2Timestamp,
            uint256 value,
            bytes calldata data
        ) external;

        /// Whether the message at the given position was executed
        function isSpent(uint256 index) external view returns (bool);
    }

    /// Rollup surface the relayer relies on for confirmation state.
    ///
    /// A message is executable once its position is below the send
    /// count covered by the latest confirmed assertion.
    #[sol(rpc)]
    contract IRollup {
        function confirmedSendCount() external view returns (uint256);
    }

    /// L2 node interface (virtual contract served by the node itself)
    #[sol(rpc)]
    contract INodeInterface {
        /// Build the merkle proof for the outbox leaf at `leaf`, against
        /// the send accumulator of size `size`
        function constructOutboxProof(uint64 size, uint64 leaf)
            external
            view
            returns (bytes32 send, bytes32 root, bytes32[] memory proof);
    }
}

/// keccak256("DepositInitiated(address,address,address,uint256,uint256)")
///
/// L1 gateway event. The token is NOT indexed, so L1 queries can only
/// filter by sender and must discard other tokens after decoding.
pub fn deposit_initiated_signature() -> B256 {
    keccak256(b"DepositInitiated(address,address,address,uint256,uint256)")
}

/// keccak256("DepositFinalized(address,address,address,uint256)")
///
/// L2 gateway event; token and recipient are both indexed.
pub fn deposit_finalized_signature() -> B256 {
    keccak256(b"DepositFinalized(address,address,address,uint256)")
}

/// keccak256("WithdrawalInitiated(address,address,address,uint256,uint256,uint256)")
pub fn withdrawal_initiated_signature() -> B256 {
    keccak256(b"WithdrawalInitiated(address,address,address,uint256,uint256,uint256)")
}

/// keccak256("L2ToL1Tx(address,address,uint256,uint256,uint256,uint256,uint256,uint256,bytes)")
pub fn l2_to_l1_tx_signature() -> B256 {
    keccak256(b"L2ToL1Tx(address,address,uint256,uint256,uint256,uint256,uint256,uint256,bytes)")
}
