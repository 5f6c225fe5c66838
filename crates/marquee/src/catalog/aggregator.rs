//! Multi-partition aggregation
//!
//! Partitions are visited one after another. Each is over-fetched by the
//! buffer factor so that ids shared between partitions do not leave the
//! merged set short, and the walk stops as soon as enough unique entities
//! have been gathered.

use super::collector::collect;
use super::{PartitionRef, SearchProvider, SliceFetcher};
use crate::prelude::*;
use marquee_core::entity::CatalogEntity;
use marquee_core::paging::{aggregate_threshold, per_partition_target};
use std::collections::HashSet;

/// Merge the partitions into one id-unique list, first occurrence wins.
///
/// Any partition failure fails the whole call.
pub async fn aggregate<P: SearchProvider>(
    fetcher: &SliceFetcher<P>,
    market: &str,
    partitions: &[String],
    max_batch: usize,
    required: usize,
    buffer_factor: f64,
) -> CatalogResult<Vec<P::Entity>> {
    let per_partition = per_partition_target(required, buffer_factor, max_batch);
    let threshold = aggregate_threshold(required, max_batch);

    let mut seen = HashSet::new();
    let mut registry = Vec::new();

    for query in partitions {
        let partition = PartitionRef::new(market, query);
        let items = collect(fetcher, &partition, max_batch, per_partition).await?;

        let before = registry.len();
        for item in items {
            if seen.insert(item.id().clone()) {
                registry.push(item);
            }
        }
        log::debug!(
            "partition {} added {} unique entities ({} total)",
            partition.key(),
            registry.len() - before,
            registry.len()
        );

        if registry.len() >= threshold {
            break;
        }
    }

    Ok(registry)
}
