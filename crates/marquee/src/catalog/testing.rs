//! In-memory provider used by the pipeline tests.

use super::{SearchProvider, SliceCache, SliceFetcher};
use crate::config::CacheSettings;
use crate::prelude::*;
use async_trait::async_trait;
use marquee_core::entity::{Artist, Slice};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

pub fn artist(id: &str, popularity: u32) -> Artist {
    Artist {
        id: id.to_string(),
        name: Some(f!("Artist {id}")),
        popularity: Some(popularity),
        genres: Vec::new(),
        images: Vec::new(),
        extra: Default::default(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockProvider {
    partitions: HashMap<String, Vec<Artist>>,
    failing: Vec<String>,
    calls: Arc<AtomicUsize>,
    calls_by_query: Arc<Mutex<HashMap<String, usize>>>,
    gate: Option<Arc<Semaphore>>,
    hide_total: bool,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Partition with `total` artists whose popularity is scrambled but
    /// deterministic, ids `"{query}-{index}"`.
    pub fn with_partition(self, query: &str, total: usize) -> Self {
        let items = (0..total)
            .map(|i| artist(&f!("{query}-{i}"), ((i * 37) % 101) as u32))
            .collect();
        self.with_items(query, items)
    }

    pub fn with_items(mut self, query: &str, items: Vec<Artist>) -> Self {
        self.partitions.insert(query.to_string(), items);
        self
    }

    pub fn with_failing_partition(mut self, query: &str) -> Self {
        self.failing.push(query.to_string());
        self
    }

    /// Every search waits for a permit on `gate` before answering.
    pub fn with_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Answer every search with a total of 0, as when the upstream omits it.
    pub fn without_total(mut self) -> Self {
        self.hide_total = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, query: &str) -> usize {
        self.calls_by_query
            .lock()
            .map(|calls| calls.get(query).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

#[async_trait]
impl SearchProvider for MockProvider {
    type Entity = Artist;

    fn name(&self) -> &str {
        "mock"
    }

    async fn search(
        &self,
        query: &str,
        _market: &str,
        offset: usize,
        limit: usize,
    ) -> CatalogResult<Slice<Artist>> {
        if let Some(gate) = &self.gate {
            let _permit = gate
                .acquire()
                .await
                .map_err(|e| Error::Upstream(e.to_string()))?;
        }

        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut calls) = self.calls_by_query.lock() {
            *calls.entry(query.to_string()).or_default() += 1;
        }

        if self.failing.iter().any(|q| q == query) {
            return Err(Error::Upstream(f!("search for {query} returned HTTP 500")));
        }

        let items = self.partitions.get(query).cloned().unwrap_or_default();
        Ok(Slice {
            total: if self.hide_total { 0 } else { items.len() },
            items: marquee_core::paging::window(&items, offset, limit),
        })
    }
}

pub fn fetcher(provider: &MockProvider) -> SliceFetcher<MockProvider> {
    SliceFetcher::new(
        Arc::new(provider.clone()),
        Arc::new(SliceCache::new(CacheSettings::default())),
    )
}
