//! Paginated chain log queries
//!
//! Wraps `eth_getLogs` behind a trait so reconciliation and scanning can
//! be exercised against mocks. Queries are chunked into bounded block
//! ranges; logs come back in ascending (block number, log index) order,
//! which both the node and the chunk ordering guarantee.

use alloy::primitives::{Address, B256};
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::rpc::types::{Filter, Log};
use alloy::transports::http::{Client, Http};
use async_trait::async_trait;
use eyre::{Result, WrapErr};

/// One log query: a contract, an event signature, optional indexed
/// topics, and an inclusive block range.
#[derive(Debug, Clone)]
pub struct LogQuerySpec {
    pub contract: Address,
    pub event_signature: B256,
    pub topic1: Option<B256>,
    pub topic2: Option<B256>,
    pub topic3: Option<B256>,
    pub from_block: u64,
    pub to_block: u64,
}

impl LogQuerySpec {
    pub fn new(contract: Address, event_signature: B256, from_block: u64, to_block: u64) -> Self {
        Self {
            contract,
            event_signature,
            topic1: None,
            topic2: None,
            topic3: None,
            from_block,
            to_block,
        }
    }

    pub fn with_topic1(mut self, topic: B256) -> Self {
        self.topic1 = Some(topic);
        self
    }

    pub fn with_topic3(mut self, topic: B256) -> Self {
        self.topic3 = Some(topic);
        self
    }
}

#[async_trait]
pub trait LogQueryService: Send + Sync {
    /// Current chain tip
    async fn latest_block(&self) -> Result<u64>;

    /// Fetch all matching logs, paginated internally
    async fn query(&self, spec: &LogQuerySpec) -> Result<Vec<Log>>;
}

/// Log query client backed by an HTTP provider
pub struct EvmLogClient {
    provider: RootProvider<Http<Client>>,
    page_size: u64,
}

impl EvmLogClient {
    pub fn new(rpc_url: &str, page_size: u64) -> Result<Self> {
        let url = rpc_url.parse().wrap_err("Failed to parse RPC URL")?;
        let provider = ProviderBuilder::new().on_http(url);
        Ok(Self {
            provider,
            page_size: page_size.max(1),
        })
    }
}

#[async_trait]
impl LogQueryService for EvmLogClient {
    async fn latest_block(&self) -> Result<u64> {
        self.provider
            .get_block_number()
            .await
            .wrap_err("Failed to get block number")
    }

    async fn query(&self, spec: &LogQuerySpec) -> Result<Vec<Log>> {
        let mut all_logs = Vec::new();

        for (from, to) in page_ranges(spec.from_block, spec.to_block, self.page_size) {
            let mut filter = Filter::new()
                .address(spec.contract)
                .event_signature(spec.event_signature)
                .from_block(from)
                .to_block(to);
            if let Some(topic) = spec.topic1 {
                filter = filter.topic1(topic);
            }
            if let Some(topic) = spec.topic2 {
                filter = filter.topic2(topic);
            }
            if let Some(topic) = spec.topic3 {
                filter = filter.topic3(topic);
            }

            let logs = self.provider.get_logs(&filter).await.wrap_err_with(|| {
                format!("Failed to get logs from block {} to {}", from, to)
            })?;
            all_logs.extend(logs);
        }

        Ok(all_logs)
    }
}

/// Split an inclusive block range into pages of at most `page_size`.
fn page_ranges(from: u64, to: u64, page_size: u64) -> Vec<(u64, u64)> {
    let mut ranges = Vec::new();
    let mut current = from;
    while current <= to {
        let end = std::cmp::min(current.saturating_add(page_size - 1), to);
        ranges.push((current, end));
        if end == u64::MAX {
            break;
        }
        current = end + 1;
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_ranges_exact_fit() {
        assert_eq!(page_ranges(0, 19, 10), vec![(0, 9), (10, 19)]);
    }

    #[test]
    fn test_page_ranges_partial_last_page() {
        assert_eq!(page_ranges(100, 125, 10), vec![(100, 109), (110, 119), (120, 125)]);
    }

    #[test]
    fn test_page_ranges_single_block() {
        assert_eq!(page_ranges(5, 5, 10), vec![(5, 5)]);
    }

    #[test]
    fn test_page_ranges_empty_when_inverted() {
        assert!(page_ranges(10, 9, 10).is_empty());
    }

    #[test]
    fn test_spec_builder_sets_topics() {
        let spec = LogQuerySpec::new(Address::ZERO, B256::ZERO, 0, 10)
            .with_topic1(B256::repeat_byte(1))
            .with_topic3(B256::repeat_byte(3));
        assert!(spec.topic1.is_some());
        assert!(spec.topic2.is_none());
        assert!(spec.topic3.is_some());
    }
}
