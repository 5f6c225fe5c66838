//! Virtual pager
//!
//! Serves arbitrary `(page, page_size)` windows and top-N listings on top of
//! a provider whose native batch size is unrelated to the caller's page size.

use super::aggregator::aggregate;
use super::collector::{collect, collect_from};
use super::{CacheStats, PartitionRef, SearchProvider, SliceCache, SliceFetcher};
use crate::prelude::*;
use marquee_core::entity::PageResult;
use marquee_core::paging::{hinted_target, window, PageRequest, DEFAULT_BUFFER_FACTOR};
use marquee_core::partition::{resolve_partitions, CatalogConfig, QuerySelector};
use marquee_core::rank::{dedup_by_id, rank};
use std::sync::Arc;

#[derive(Debug)]
pub struct VirtualPager<P: SearchProvider> {
    fetcher: SliceFetcher<P>,
    config: CatalogConfig,
}

impl<P: SearchProvider> VirtualPager<P> {
    pub fn new(provider: Arc<P>, cache: Arc<SliceCache<P::Entity>>, config: CatalogConfig) -> Self {
        Self {
            fetcher: SliceFetcher::new(provider, cache),
            config,
        }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn cache(&self) -> &SliceCache<P::Entity> {
        self.fetcher.cache()
    }

    /// Forget every cached slice and total, including the provider's own
    /// memoized pages.
    pub async fn clear_caches(&self) {
        self.cache().clear().await;
        self.fetcher.provider().clear_cache().await;
    }

    pub async fn provider_cache_stats(&self) -> Option<CacheStats> {
        self.fetcher.provider().cache_stats().await
    }

    fn max_batch(&self) -> usize {
        self.config.provider_max_batch
    }

    /// The `limit` best-ranked entities for the selected partitions.
    ///
    /// `fetch_hint` bounds a single-partition walk to that many native
    /// batches; the walk still ends once `limit` entities are in hand. With a
    /// hint, a zero `limit` returns the whole ranked window.
    pub async fn top_n(
        &self,
        limit: usize,
        market: Option<&str>,
        selector: &QuerySelector,
        fetch_hint: Option<usize>,
    ) -> CatalogResult<Vec<P::Entity>> {
        let market = self.config.market_or_default(market);
        let partitions = resolve_partitions(selector, &self.config);

        let merged = if partitions.is_aggregate() {
            aggregate(
                &self.fetcher,
                &market,
                &partitions.queries,
                self.max_batch(),
                limit,
                DEFAULT_BUFFER_FACTOR,
            )
            .await?
        } else {
            let target = match fetch_hint {
                Some(pages) => hinted_target(limit, pages, self.max_batch()),
                None => limit,
            };
            let partition = PartitionRef::new(&market, &partitions.queries[0]);
            collect(&self.fetcher, &partition, self.max_batch(), target).await?
        };

        let mut ranked = rank(merged);
        if limit > 0 {
            ranked.truncate(limit);
        }
        Ok(ranked)
    }

    /// One virtual page of the selected partitions.
    pub async fn page(
        &self,
        request: PageRequest,
        market: Option<&str>,
        selector: &QuerySelector,
    ) -> CatalogResult<PageResult<P::Entity>> {
        let market = self.config.market_or_default(market);
        let partitions = resolve_partitions(selector, &self.config);

        if partitions.is_aggregate() {
            self.aggregate_page(request, &market, &partitions.queries)
                .await
        } else {
            let partition = PartitionRef::new(&market, &partitions.queries[0]);
            self.partition_page(request, &partition).await
        }
    }

    async fn partition_page(
        &self,
        request: PageRequest,
        partition: &PartitionRef,
    ) -> CatalogResult<PageResult<P::Entity>> {
        let key = partition.key();
        let start = request.start_index();
        let known = self.cache().known_total(&key).await;

        if let Some(total) = known {
            if start >= total {
                log::debug!("page {} of {key} is past the known total {total}", request.page);
                return Ok(PageResult {
                    items: Vec::new(),
                    total_results: total,
                });
            }
        }

        let collected = collect_from(
            &self.fetcher,
            partition,
            self.max_batch(),
            start,
            request.page_size,
        )
        .await?;

        if let Some(total) = collected.total {
            self.cache().record_total(&key, total).await;
        }

        let mut items = dedup_by_id(collected.items);
        items.truncate(request.page_size);
        let total_results = collected
            .total
            .or(known)
            .unwrap_or(start + items.len());

        Ok(PageResult {
            items,
            total_results,
        })
    }

    async fn aggregate_page(
        &self,
        request: PageRequest,
        market: &str,
        queries: &[String],
    ) -> CatalogResult<PageResult<P::Entity>> {
        let required = request.end_index();
        let merged = aggregate(
            &self.fetcher,
            market,
            queries,
            self.max_batch(),
            required,
            DEFAULT_BUFFER_FACTOR,
        )
        .await?;

        let ranked = rank(merged);
        Ok(PageResult {
            items: window(&ranked, request.start_index(), request.page_size),
            // retrieved-so-far count, grows as deeper pages are requested
            total_results: ranked.len(),
        })
    }
}
