//! Token counterpart registry
//!
//! Resolves an L2 token to its canonical L1 counterpart with symbol and
//! decimals, for summary reporting. Built once from configuration and
//! injected where needed; no module-level lookup tables.

use alloy::primitives::Address;
use eyre::{Result, WrapErr};
use std::collections::HashMap;
use std::str::FromStr;

use crate::config::TokenPairEntry;

/// Canonical L1-side identity of a bridged token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub l1_token: Address,
    pub symbol: String,
    pub decimals: u8,
}

pub trait TokenRegistry: Send + Sync {
    /// L1 counterpart of an L2 token, when one is configured
    fn counterpart(&self, l2_token: Address) -> Option<TokenInfo>;
}

/// Immutable registry built from the configured token pairs
pub struct StaticTokenRegistry {
    by_l2: HashMap<Address, TokenInfo>,
}

impl StaticTokenRegistry {
    pub fn from_entries(entries: &[TokenPairEntry]) -> Result<Self> {
        let mut by_l2 = HashMap::new();
        for entry in entries {
            let l1_token = Address::from_str(&entry.l1_token)
                .wrap_err_with(|| format!("Invalid l1_token for {}", entry.symbol))?;
            let l2_token = Address::from_str(&entry.l2_token)
                .wrap_err_with(|| format!("Invalid l2_token for {}", entry.symbol))?;
            by_l2.insert(
                l2_token,
                TokenInfo {
                    l1_token,
                    symbol: entry.symbol.clone(),
                    decimals: entry.decimals,
                },
            );
        }
        Ok(Self { by_l2 })
    }
}

impl TokenRegistry for StaticTokenRegistry {
    fn counterpart(&self, l2_token: Address) -> Option<TokenInfo> {
        self.by_l2.get(&l2_token).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(symbol: &str, decimals: u8, l1: &str, l2: &str) -> TokenPairEntry {
        TokenPairEntry {
            symbol: symbol.to_string(),
            decimals,
            l1_token: l1.to_string(),
            l2_token: l2.to_string(),
            l1_gateway: "0x0000000000000000000000000000000000000021".to_string(),
            l2_gateway: "0x0000000000000000000000000000000000000022".to_string(),
        }
    }

    #[test]
    fn test_counterpart_lookup() {
        let registry = StaticTokenRegistry::from_entries(&[entry(
            "USDC",
            6,
            "0x0000000000000000000000000000000000000001",
            "0x0000000000000000000000000000000000000002",
        )])
        .unwrap();

        let info = registry
            .counterpart(Address::from_str("0x0000000000000000000000000000000000000002").unwrap())
            .expect("pair should be known");
        assert_eq!(info.symbol, "USDC");
        assert_eq!(info.decimals, 6);
        assert_eq!(
            info.l1_token,
            Address::from_str("0x0000000000000000000000000000000000000001").unwrap()
        );
    }

    #[test]
    fn test_unknown_token_returns_none() {
        let registry = StaticTokenRegistry::from_entries(&[]).unwrap();
        assert!(registry.counterpart(Address::ZERO).is_none());
    }

    #[test]
    fn test_invalid_address_rejected() {
        let bad = entry("BAD", 18, "not-an-address", "0x0000000000000000000000000000000000000002");
        assert!(StaticTokenRegistry::from_entries(&[bad]).is_err());
    }
}
