//! Typed error taxonomy for the relay pipeline
//!
//! Operational call sites use `eyre` throughout; this enum carries the
//! failure classes the pipeline discriminates on. Reconciliation is
//! fail-fast for the whole pass, message resolution downgrades per-item
//! failures to `Unconfirmed`, and proof failures propagate per message.

use alloy::primitives::{Address, B256, U256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    /// A single message's receipt, status, or proof could not be obtained.
    /// Recovered locally by the resolver; never raised to the caller.
    #[error("transient lookup failure: {0}")]
    TransientLookup(String),

    /// A transaction that should contain an outbound message at the
    /// given sequence index does not. Protocol-level inconsistency.
    #[error("transaction {tx_hash} has {found} outbound messages, expected one at index {index}")]
    StructuralAnomaly {
        tx_hash: B256,
        index: u32,
        found: usize,
    },

    /// A log query failed during outstanding-transfer computation.
    /// Fatal to the reconciliation pass; no partial state is committed.
    #[error("reconciliation pass failed: {0}")]
    Reconciliation(String),

    /// A Confirmed message's outbox proof could not be fetched.
    #[error("proof unavailable for outbox position {position}: {reason}")]
    ProofUnavailable { position: U256, reason: String },

    /// A token with no configured gateway pair reached a code path that
    /// requires one. Expected (and skipped) in reconciliation, an error
    /// anywhere in finalization.
    #[error("no known gateway pair for token {0}")]
    UnsupportedToken(Address),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_anomaly_display() {
        let err = RelayError::StructuralAnomaly {
            tx_hash: B256::ZERO,
            index: 2,
            found: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains("index 2"));
        assert!(msg.contains("1 outbound messages"));
    }

    #[test]
    fn test_unsupported_token_display() {
        let err = RelayError::UnsupportedToken(Address::ZERO);
        assert!(err.to_string().contains("no known gateway pair"));
    }
}
