//! Single-partition collection
//!
//! Walks one partition in offset-contiguous batches no larger than the
//! provider's maximum, stopping at the target or on an empty or short batch.
//! Paginated walks also stop once the offset passes the reported total.

use super::{PartitionRef, SearchProvider, SliceFetcher};
use crate::prelude::*;
use marquee_core::paging::batch_size;

/// Entities gathered from one partition plus the freshest total seen
#[derive(Debug, Clone, PartialEq)]
pub struct Collected<E> {
    pub items: Vec<E>,
    pub total: Option<usize>,
}

/// Collect up to `target` entities starting at `start`, trusting the
/// reported total to end the walk.
///
/// No sorting or deduplication happens here.
pub async fn collect_from<P: SearchProvider>(
    fetcher: &SliceFetcher<P>,
    partition: &PartitionRef,
    max_batch: usize,
    start: usize,
    target: usize,
) -> CatalogResult<Collected<P::Entity>> {
    walk(fetcher, partition, max_batch, start, target, true).await
}

/// Collect up to `target` entities from the beginning of a partition.
///
/// The reported total is ignored here, since an upstream that omits it
/// reports 0.
pub async fn collect<P: SearchProvider>(
    fetcher: &SliceFetcher<P>,
    partition: &PartitionRef,
    max_batch: usize,
    target: usize,
) -> CatalogResult<Vec<P::Entity>> {
    walk(fetcher, partition, max_batch, 0, target, false)
        .await
        .map(|collected| collected.items)
}

async fn walk<P: SearchProvider>(
    fetcher: &SliceFetcher<P>,
    partition: &PartitionRef,
    max_batch: usize,
    start: usize,
    target: usize,
    stop_at_total: bool,
) -> CatalogResult<Collected<P::Entity>> {
    let mut items = Vec::new();
    let mut total = None;
    let mut offset = start;

    if max_batch == 0 {
        return Ok(Collected { items, total });
    }

    while items.len() < target {
        let limit = batch_size(max_batch, target - items.len());
        let slice = fetcher.fetch_slice(partition, offset, limit).await?;
        total = Some(slice.total);

        let received = slice.items.len();
        if received == 0 {
            break;
        }
        items.extend(slice.items);
        offset += received;

        if received < limit || (stop_at_total && offset >= slice.total) {
            break;
        }
    }

    Ok(Collected { items, total })
}
