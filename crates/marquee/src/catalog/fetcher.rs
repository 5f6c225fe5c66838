use super::{PartitionRef, SearchProvider, SliceCache, SliceKey};
use crate::prelude::*;
use marquee_core::entity::Slice;
use std::sync::Arc;

/// Fetches upstream slices through the shared slice cache
#[derive(Debug)]
pub struct SliceFetcher<P: SearchProvider> {
    provider: Arc<P>,
    cache: Arc<SliceCache<P::Entity>>,
}

impl<P: SearchProvider> Clone for SliceFetcher<P> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            cache: self.cache.clone(),
        }
    }
}

impl<P: SearchProvider> SliceFetcher<P> {
    pub fn new(provider: Arc<P>, cache: Arc<SliceCache<P::Entity>>) -> Self {
        Self { provider, cache }
    }

    pub fn cache(&self) -> &SliceCache<P::Entity> {
        &self.cache
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Return the slice for `(partition, offset, limit)`, calling upstream on
    /// a cache miss and recording the partition total it reports.
    pub async fn fetch_slice(
        &self,
        partition: &PartitionRef,
        offset: usize,
        limit: usize,
    ) -> CatalogResult<Slice<P::Entity>> {
        let partition_key = partition.key();
        let key = SliceKey::new(&partition_key, offset, limit);

        if let Some(slice) = self.cache.get(&key).await {
            log::debug!("slice cache hit: {partition_key} offset={offset} limit={limit}");
            return Ok(slice);
        }

        log::debug!(
            "{} search: {partition_key} offset={offset} limit={limit}",
            self.provider.name()
        );
        let mut slice = self
            .provider
            .search(&partition.query, &partition.market, offset, limit)
            .await?;
        slice.items.truncate(limit);

        self.cache.insert(key, slice.clone()).await;
        self.cache.record_total(&partition_key, slice.total).await;

        Ok(slice)
    }
}
