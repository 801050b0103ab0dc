#![allow(dead_code)]

use eyre::{eyre, Result, WrapErr};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::path::Path;

/// Main configuration for the relayer
#[derive(Debug, Clone)]
pub struct Config {
    pub l1: ChainConfig,
    pub l2: ChainConfig,
    pub bridge: BridgeConfig,
    pub relayer: RelayerConfig,
    pub submitter: SubmitterConfig,
}

/// Per-chain RPC configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    pub rpc_url: String,
    pub chain_id: u64,
}

/// Bridge contract addresses and the monitored token/address universe
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// L1 gateway router: deposits are submitted here
    pub l1_gateway_router: String,
    /// L1 outbox: withdrawal execution target
    pub outbox: String,
    /// Rollup contract queried for confirmation state
    pub rollup: String,
    /// Accounts whose cross-chain transfers are tracked
    pub monitored_addresses: Vec<String>,
    /// Known token pairs with their per-token gateway contracts
    pub tokens: Vec<TokenPairEntry>,
}

/// One bridged token pair, loaded from the token-pairs JSON document.
///
/// Per-token gateway addresses come from the gateway router's on-chain
/// registration; they are pinned in configuration so a pass never
/// depends on an extra round-trip per token.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenPairEntry {
    pub symbol: String,
    pub decimals: u8,
    pub l1_token: String,
    pub l2_token: String,
    pub l1_gateway: String,
    pub l2_gateway: String,
}

/// Polling and query-window configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RelayerConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// How far back the L1 deposit query looks, in blocks
    #[serde(default = "default_l1_lookback")]
    pub l1_lookback_blocks: u64,
    /// How far back the L2 deposit/withdrawal queries look, in blocks
    #[serde(default = "default_l2_lookback")]
    pub l2_lookback_blocks: u64,
    /// Maximum block span per eth_getLogs page
    #[serde(default = "default_log_page_size")]
    pub log_page_size: u64,
    #[serde(default = "default_api_port")]
    pub api_port: u16,
}

/// Transaction submission configuration
#[derive(Clone)]
pub struct SubmitterConfig {
    pub private_key: String,
}

/// Custom Debug that redacts private_key to prevent accidental log leakage.
impl fmt::Debug for SubmitterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmitterConfig")
            .field("private_key", &"<redacted>")
            .finish()
    }
}

fn default_poll_interval() -> u64 {
    15000
}

fn default_l1_lookback() -> u64 {
    7200
}

fn default_l2_lookback() -> u64 {
    100_000
}

fn default_log_page_size() -> u64 {
    10_000
}

fn default_api_port() -> u16 {
    9090
}

impl Config {
    /// Load configuration from environment variables.
    /// Loads .env file if present, then reads from environment.
    pub fn load() -> Result<Self> {
        Self::load_from_file(".env").or_else(|_| Self::load_from_env())
    }

    /// Load from a specific .env file path
    pub fn load_from_file(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            dotenvy::from_filename(path)
                .wrap_err_with(|| format!("Failed to load .env file from {}", path))?;
        }
        Self::load_from_env()
    }

    fn load_from_env() -> Result<Self> {
        let l1 = ChainConfig {
            rpc_url: env::var("L1_RPC_URL")
                .map_err(|_| eyre!("L1_RPC_URL environment variable is required"))?,
            chain_id: env::var("L1_CHAIN_ID")
                .map_err(|_| eyre!("L1_CHAIN_ID environment variable is required"))?
                .parse()
                .wrap_err("L1_CHAIN_ID must be a valid u64")?,
        };

        let l2 = ChainConfig {
            rpc_url: env::var("L2_RPC_URL")
                .map_err(|_| eyre!("L2_RPC_URL environment variable is required"))?,
            chain_id: env::var("L2_CHAIN_ID")
                .map_err(|_| eyre!("L2_CHAIN_ID environment variable is required"))?
                .parse()
                .wrap_err("L2_CHAIN_ID must be a valid u64")?,
        };

        let monitored_addresses = env::var("MONITORED_ADDRESSES")
            .map_err(|_| eyre!("MONITORED_ADDRESSES environment variable is required"))?
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let tokens = load_token_pairs()?;

        let bridge = BridgeConfig {
            l1_gateway_router: env::var("GATEWAY_ROUTER_ADDRESS")
                .map_err(|_| eyre!("GATEWAY_ROUTER_ADDRESS environment variable is required"))?,
            outbox: env::var("OUTBOX_ADDRESS")
                .map_err(|_| eyre!("OUTBOX_ADDRESS environment variable is required"))?,
            rollup: env::var("ROLLUP_ADDRESS")
                .map_err(|_| eyre!("ROLLUP_ADDRESS environment variable is required"))?,
            monitored_addresses,
            tokens,
        };

        let relayer = RelayerConfig {
            poll_interval_ms: env::var("POLL_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default_poll_interval()),
            l1_lookback_blocks: env::var("L1_LOOKBACK_BLOCKS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default_l1_lookback()),
            l2_lookback_blocks: env::var("L2_LOOKBACK_BLOCKS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default_l2_lookback()),
            log_page_size: env::var("LOG_PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default_log_page_size()),
            api_port: env::var("API_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default_api_port()),
        };

        let submitter = SubmitterConfig {
            private_key: env::var("SUBMITTER_PRIVATE_KEY")
                .map_err(|_| eyre!("SUBMITTER_PRIVATE_KEY environment variable is required"))?,
        };

        let config = Config {
            l1,
            l2,
            bridge,
            relayer,
            submitter,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.l1.rpc_url.is_empty() {
            return Err(eyre!("l1.rpc_url cannot be empty"));
        }
        if self.l2.rpc_url.is_empty() {
            return Err(eyre!("l2.rpc_url cannot be empty"));
        }

        for (name, addr) in [
            ("bridge.l1_gateway_router", &self.bridge.l1_gateway_router),
            ("bridge.outbox", &self.bridge.outbox),
            ("bridge.rollup", &self.bridge.rollup),
        ] {
            validate_address(name, addr)?;
        }

        if self.bridge.monitored_addresses.is_empty() {
            return Err(eyre!("at least one monitored address is required"));
        }
        for addr in &self.bridge.monitored_addresses {
            validate_address("bridge.monitored_addresses", addr)?;
        }

        if self.bridge.tokens.is_empty() {
            return Err(eyre!("at least one token pair is required"));
        }
        for entry in &self.bridge.tokens {
            validate_address("token.l1_token", &entry.l1_token)?;
            validate_address("token.l2_token", &entry.l2_token)?;
            validate_address("token.l1_gateway", &entry.l1_gateway)?;
            validate_address("token.l2_gateway", &entry.l2_gateway)?;
            if entry.symbol.is_empty() {
                return Err(eyre!("token pair {} has an empty symbol", entry.l1_token));
            }
            if entry.decimals > 36 {
                return Err(eyre!(
                    "token {} has implausible decimals {}",
                    entry.symbol,
                    entry.decimals
                ));
            }
        }

        if self.submitter.private_key.len() != 66 || !self.submitter.private_key.starts_with("0x") {
            return Err(eyre!(
                "submitter.private_key must be 66 chars (0x + 64 hex chars)"
            ));
        }

        if self.relayer.log_page_size == 0 {
            return Err(eyre!("relayer.log_page_size cannot be zero"));
        }
        if self.relayer.l1_lookback_blocks == 0 || self.relayer.l2_lookback_blocks == 0 {
            return Err(eyre!("lookback windows cannot be zero"));
        }

        Ok(())
    }
}

/// Token pairs load from TOKEN_PAIRS (inline JSON array) or
/// TOKEN_PAIRS_FILE (path to a JSON document).
fn load_token_pairs() -> Result<Vec<TokenPairEntry>> {
    let raw = if let Ok(inline) = env::var("TOKEN_PAIRS") {
        inline
    } else {
        let path = env::var("TOKEN_PAIRS_FILE")
            .map_err(|_| eyre!("TOKEN_PAIRS or TOKEN_PAIRS_FILE is required"))?;
        std::fs::read_to_string(&path)
            .wrap_err_with(|| format!("Failed to read token pairs file {}", path))?
    };

    serde_json::from_str(&raw).wrap_err("Failed to parse token pairs JSON")
}

fn validate_address(name: &str, addr: &str) -> Result<()> {
    if addr.len() != 42 || !addr.starts_with("0x") {
        return Err(eyre!(
            "{} must be a valid hex address (42 chars with 0x prefix), got {:?}",
            name,
            addr
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            l1: ChainConfig {
                rpc_url: "http://localhost:8545".to_string(),
                chain_id: 1,
            },
            l2: ChainConfig {
                rpc_url: "http://localhost:8547".to_string(),
                chain_id: 42161,
            },
            bridge: BridgeConfig {
                l1_gateway_router: "0x0000000000000000000000000000000000000001".to_string(),
                outbox: "0x0000000000000000000000000000000000000002".to_string(),
                rollup: "0x0000000000000000000000000000000000000003".to_string(),
                monitored_addresses: vec![
                    "0x0000000000000000000000000000000000000004".to_string()
                ],
                tokens: vec![TokenPairEntry {
                    symbol: "USDC".to_string(),
                    decimals: 6,
                    l1_token: "0x0000000000000000000000000000000000000005".to_string(),
                    l2_token: "0x0000000000000000000000000000000000000006".to_string(),
                    l1_gateway: "0x0000000000000000000000000000000000000007".to_string(),
                    l2_gateway: "0x0000000000000000000000000000000000000008".to_string(),
                }],
            },
            relayer: RelayerConfig {
                poll_interval_ms: 15000,
                l1_lookback_blocks: 7200,
                l2_lookback_blocks: 100_000,
                log_page_size: 10_000,
                api_port: 9090,
            },
            submitter: SubmitterConfig {
                private_key:
                    "0x0000000000000000000000000000000000000000000000000000000000000001"
                        .to_string(),
            },
        }
    }

    #[test]
    fn test_defaults() {
        assert_eq!(default_poll_interval(), 15000);
        assert_eq!(default_l1_lookback(), 7200);
        assert_eq!(default_l2_lookback(), 100_000);
        assert_eq!(default_log_page_size(), 10_000);
        assert_eq!(default_api_port(), 9090);
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_invalid_private_key_rejected() {
        let mut config = valid_config();
        config.submitter.private_key = "0x123".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_outbox_address_rejected() {
        let mut config = valid_config();
        config.bridge.outbox = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_monitored_addresses_rejected() {
        let mut config = valid_config();
        config.bridge.monitored_addresses.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let mut config = valid_config();
        config.relayer.log_page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_implausible_decimals_rejected() {
        let mut config = valid_config();
        config.bridge.tokens[0].decimals = 77;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_token_pairs_json_parses() {
        let raw = r#"[{
            "symbol": "WETH",
            "decimals": 18,
            "l1_token": "0x0000000000000000000000000000000000000010",
            "l2_token": "0x0000000000000000000000000000000000000011",
            "l1_gateway": "0x0000000000000000000000000000000000000012",
            "l2_gateway": "0x0000000000000000000000000000000000000013"
        }]"#;
        let entries: Vec<TokenPairEntry> = serde_json::from_str(raw).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].symbol, "WETH");
        assert_eq!(entries[0].decimals, 18);
    }

    #[test]
    fn test_submitter_debug_redacts_key() {
        let config = valid_config();
        let debug = format!("{:?}", config.submitter);
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("0000000000000001"));
    }
}
