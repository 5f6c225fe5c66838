//! Pagination aggregation pipeline
//!
//! ```text
//! VirtualPager ── resolve partitions ──┬── collector (one partition)
//!                                      └── aggregator (many partitions)
//!                                                │
//!                                  SliceFetcher ─┴─ SliceCache
//!                                        │
//!                                  SearchProvider ── CredentialCache
//! ```

use crate::prelude::*;
use async_trait::async_trait;
use marquee_core::entity::{CatalogEntity, Slice};

pub mod aggregator;
pub mod cache;
pub mod collector;
pub mod credential;
pub mod fetcher;
pub mod pager;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{CacheStats, SliceCache, SliceKey};
pub use credential::{CredentialCache, CredentialSource, IssuedToken};
pub use fetcher::SliceFetcher;
pub use pager::VirtualPager;
pub use view::{LoadOutcome, LoadedPage, ViewController};

/// Upstream catalog that can be searched by offset and limit
#[async_trait]
pub trait SearchProvider: Send + Sync {
    type Entity: CatalogEntity;

    /// Short name used in log lines
    fn name(&self) -> &str;

    /// Fetch `limit` entities of `query` starting at `offset`.
    ///
    /// Implementations never return more than `limit` items.
    async fn search(
        &self,
        query: &str,
        market: &str,
        offset: usize,
        limit: usize,
    ) -> CatalogResult<Slice<Self::Entity>>;

    /// Drop anything the provider memoizes on its own.
    async fn clear_cache(&self) {}

    /// Statistics for the provider's own cache, when it keeps one.
    async fn cache_stats(&self) -> Option<CacheStats> {
        None
    }
}

/// One partition as seen by the collector
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionRef {
    pub market: String,
    pub query: String,
}

impl PartitionRef {
    pub fn new(market: &str, query: &str) -> Self {
        Self {
            market: market.to_string(),
            query: query.to_string(),
        }
    }

    pub fn key(&self) -> String {
        marquee_core::partition::partition_key(&self.market, &self.query)
    }
}
