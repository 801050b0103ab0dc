//! Batch assembly and withdrawal reporting
//!
//! Packs the built execution calls into the multicall payload handed to
//! the submitter, together with one human-readable summary per
//! withdrawal. Summaries keep input order; amounts for the same token
//! are deliberately not netted here.

use alloy::primitives::U256;
use bigdecimal::BigDecimal;
use std::str::FromStr;
use std::sync::Arc;

use crate::chain::TokenRegistry;
use crate::error::RelayError;
use crate::types::{ExecutionCall, WithdrawalInitiationEvent, WithdrawalSummary};

/// Output of one finalization pass
#[derive(Debug, Clone)]
pub struct FinalizationBatch {
    pub calls: Vec<ExecutionCall>,
    pub summaries: Vec<WithdrawalSummary>,
}

pub struct BatchAssembler {
    registry: Arc<dyn TokenRegistry>,
    l2_chain_id: u64,
}

impl BatchAssembler {
    pub fn new(registry: Arc<dyn TokenRegistry>, l2_chain_id: u64) -> Self {
        Self {
            registry,
            l2_chain_id,
        }
    }

    pub fn assemble(
        &self,
        items: &[(WithdrawalInitiationEvent, ExecutionCall)],
    ) -> Result<FinalizationBatch, RelayError> {
        let mut calls = Vec::with_capacity(items.len());
        let mut summaries = Vec::with_capacity(items.len());

        for (event, call) in items {
            // Finalization tokens come from observed chain events, so a
            // missing pair is a configuration gap, not a skippable token.
            let info = self
                .registry
                .counterpart(event.l2_token)
                .ok_or(RelayError::UnsupportedToken(event.l2_token))?;

            summaries.push(WithdrawalSummary {
                l2_chain_id: self.l2_chain_id,
                l1_token_symbol: info.symbol,
                amount: decimal_adjusted(event.amount, info.decimals),
            });
            calls.push(call.clone());
        }

        Ok(FinalizationBatch { calls, summaries })
    }
}

/// Convert a raw base-unit amount to its decimal display value.
fn decimal_adjusted(amount: U256, decimals: u8) -> BigDecimal {
    // U256 renders as plain decimal digits, so the e-notation form
    // always parses
    BigDecimal::from_str(&format!("{}e-{}", amount, decimals)).unwrap_or_default()
}
