//! Slice cache and partition totals
//!
//! Both maps are owned by a [`SliceCache`] handle that is injected into the
//! fetcher, so every pager (and every test) gets its own isolated cache.
//! Slices are immutable once stored: the first writer for a key wins.
//! Partition totals are overwritten by the most recent upstream answer.
//!
//! Growth is bounded by `max_entries` per map with least-recently-used
//! eviction, and entries older than the optional TTL are dropped on access.

use crate::config::CacheSettings;
use marquee_core::entity::Slice;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;
use tokio::sync::RwLock;

/// Identity of one upstream slice
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SliceKey {
    pub partition_key: String,
    pub offset: usize,
    pub limit: usize,
}

impl SliceKey {
    pub fn new(partition_key: &str, offset: usize, limit: usize) -> Self {
        Self {
            partition_key: partition_key.to_string(),
            offset,
            limit,
        }
    }
}

#[derive(Debug)]
struct Entry<T> {
    value: T,
    created_at: Instant,
    last_used: u64,
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub evictions: usize,
    pub slices: usize,
    pub partitions: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug)]
pub struct SliceCache<E> {
    settings: CacheSettings,
    slices: RwLock<HashMap<SliceKey, Entry<Slice<E>>>>,
    totals: RwLock<HashMap<String, Entry<usize>>>,
    clock: AtomicU64,
    hits: AtomicUsize,
    misses: AtomicUsize,
    evictions: AtomicUsize,
}

impl<E: Clone> SliceCache<E> {
    pub fn new(settings: CacheSettings) -> Self {
        Self {
            settings,
            slices: RwLock::new(HashMap::new()),
            totals: RwLock::new(HashMap::new()),
            clock: AtomicU64::new(0),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
            evictions: AtomicUsize::new(0),
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn is_expired<T>(&self, entry: &Entry<T>) -> bool {
        self.settings
            .ttl
            .is_some_and(|ttl| entry.created_at.elapsed() > ttl)
    }

    /// Look up a slice, refreshing its recency on a hit.
    pub async fn get(&self, key: &SliceKey) -> Option<Slice<E>> {
        let mut slices = self.slices.write().await;

        let expired = match slices.get(key) {
            Some(entry) => self.is_expired(entry),
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        if expired {
            slices.remove(key);
            self.evictions.fetch_add(1, Ordering::Relaxed);
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        let tick = self.tick();
        let entry = slices.get_mut(key)?;
        entry.last_used = tick;
        self.hits.fetch_add(1, Ordering::Relaxed);
        Some(entry.value.clone())
    }

    /// Store a slice unless a live entry already exists for the key.
    pub async fn insert(&self, key: SliceKey, slice: Slice<E>) {
        let mut slices = self.slices.write().await;

        if let Some(existing) = slices.get(&key) {
            if !self.is_expired(existing) {
                return;
            }
        }

        if !slices.contains_key(&key) && slices.len() >= self.settings.max_entries {
            let evicted = evict_one(&mut *slices, |e| self.is_expired(e));
            self.evictions.fetch_add(evicted, Ordering::Relaxed);
        }

        let tick = self.tick();
        slices.insert(
            key,
            Entry {
                value: slice,
                created_at: Instant::now(),
                last_used: tick,
            },
        );
    }

    /// Last total reported upstream for a partition
    pub async fn known_total(&self, partition_key: &str) -> Option<usize> {
        let totals = self.totals.read().await;
        totals
            .get(partition_key)
            .filter(|entry| !self.is_expired(entry))
            .map(|entry| entry.value)
    }

    /// Overwrite the total for a partition with the latest upstream value
    pub async fn record_total(&self, partition_key: &str, total: usize) {
        let mut totals = self.totals.write().await;

        if !totals.contains_key(partition_key) && totals.len() >= self.settings.max_entries {
            let evicted = evict_one(&mut *totals, |e| self.is_expired(e));
            self.evictions.fetch_add(evicted, Ordering::Relaxed);
        }

        let tick = self.tick();
        totals.insert(
            partition_key.to_string(),
            Entry {
                value: total,
                created_at: Instant::now(),
                last_used: tick,
            },
        );
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            slices: self.slices.read().await.len(),
            partitions: self.totals.read().await.len(),
        }
    }

    pub async fn clear(&self) {
        let mut slices = self.slices.write().await;
        let mut totals = self.totals.write().await;
        let evicted = slices.len() + totals.len();
        slices.clear();
        totals.clear();
        self.evictions.fetch_add(evicted, Ordering::Relaxed);
    }
}

/// Drop every expired entry, or the least recently used one when none has
/// expired. Returns the number of entries removed.
fn evict_one<K, T>(map: &mut HashMap<K, Entry<T>>, is_expired: impl Fn(&Entry<T>) -> bool) -> usize
where
    K: Clone + Eq + std::hash::Hash,
{
    let before = map.len();
    map.retain(|_, entry| !is_expired(entry));
    if map.len() < before {
        return before - map.len();
    }

    let oldest = map
        .iter()
        .min_by_key(|(_, entry)| entry.last_used)
        .map(|(key, _)| key.clone());

    match oldest {
        Some(key) => {
            map.remove(&key);
            1
        }
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn cache(max_entries: usize, ttl: Option<Duration>) -> SliceCache<u32> {
        SliceCache::new(CacheSettings { max_entries, ttl })
    }

    fn slice(items: Vec<u32>, total: usize) -> Slice<u32> {
        Slice { items, total }
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let cache = cache(8, None);
        let key = SliceKey::new("US|genre:pop", 0, 2);

        assert!(cache.get(&key).await.is_none());
        cache.insert(key.clone(), slice(vec![1, 2], 10)).await;
        assert_eq!(cache.get(&key).await, Some(slice(vec![1, 2], 10)));

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.slices, 1);
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[tokio::test]
    async fn test_first_writer_wins() {
        let cache = cache(8, None);
        let key = SliceKey::new("p", 0, 2);

        cache.insert(key.clone(), slice(vec![1, 2], 10)).await;
        cache.insert(key.clone(), slice(vec![9, 9], 99)).await;

        assert_eq!(cache.get(&key).await, Some(slice(vec![1, 2], 10)));
    }

    #[tokio::test]
    async fn test_keys_differ_by_limit() {
        let cache = cache(8, None);
        cache.insert(SliceKey::new("p", 0, 2), slice(vec![1, 2], 10)).await;
        assert!(cache.get(&SliceKey::new("p", 0, 3)).await.is_none());
    }

    #[tokio::test]
    async fn test_evicts_least_recently_used() {
        let cache = cache(2, None);
        let a = SliceKey::new("p", 0, 1);
        let b = SliceKey::new("p", 1, 1);
        let c = SliceKey::new("p", 2, 1);

        cache.insert(a.clone(), slice(vec![0], 3)).await;
        cache.insert(b.clone(), slice(vec![1], 3)).await;
        // touch `a` so `b` becomes the eviction candidate
        cache.get(&a).await;
        cache.insert(c.clone(), slice(vec![2], 3)).await;

        assert!(cache.get(&a).await.is_some());
        assert!(cache.get(&b).await.is_none());
        assert!(cache.get(&c).await.is_some());
        assert_eq!(cache.stats().await.evictions, 1);
    }

    #[tokio::test]
    async fn test_expired_entries_are_dropped() {
        let cache = cache(8, Some(Duration::from_millis(10)));
        let key = SliceKey::new("p", 0, 1);
        cache.insert(key.clone(), slice(vec![1], 1)).await;
        cache.record_total("p", 1).await;

        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(cache.get(&key).await.is_none());
        assert_eq!(cache.known_total("p").await, None);
        assert_eq!(cache.stats().await.slices, 0);
    }

    #[tokio::test]
    async fn test_totals_last_writer_wins() {
        let cache = cache(8, None);
        assert_eq!(cache.known_total("US|genre:pop").await, None);

        cache.record_total("US|genre:pop", 120).await;
        cache.record_total("US|genre:pop", 121).await;

        assert_eq!(cache.known_total("US|genre:pop").await, Some(121));
        assert_eq!(cache.stats().await.partitions, 1);
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = cache(8, None);
        cache.insert(SliceKey::new("p", 0, 1), slice(vec![1], 1)).await;
        cache.record_total("p", 1).await;
        cache.clear().await;

        let stats = cache.stats().await;
        assert_eq!(stats.slices, 0);
        assert_eq!(stats.partitions, 0);
    }
}
