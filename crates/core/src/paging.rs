//! Virtual page arithmetic
//!
//! Pure helpers that map a caller's `(page, page_size)` onto upstream
//! offsets, batch sizes and per-partition targets.

/// Page size used when the caller sends none or a non-positive one
pub const DEFAULT_PAGE_SIZE: usize = 60;

/// Number of entities returned by top-N listings by default
pub const DEFAULT_TOP_LIMIT: usize = 6;

/// Per-partition over-fetch used in aggregate mode
pub const DEFAULT_BUFFER_FACTOR: f64 = 2.0;

/// A normalized virtual page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-indexed, never zero
    pub page: usize,
    pub page_size: usize,
}

impl PageRequest {
    /// Clamp the page to at least 1 and fall back to the default page size
    /// when the requested one is missing or non-positive.
    pub fn normalize(page: Option<i64>, page_size: Option<i64>) -> Self {
        let page = page.unwrap_or(1).max(1) as usize;
        let page_size = match page_size {
            Some(size) if size > 0 => size as usize,
            _ => DEFAULT_PAGE_SIZE,
        };
        Self { page, page_size }
    }

    /// Index of the first entity on this page
    pub fn start_index(&self) -> usize {
        (self.page - 1).saturating_mul(self.page_size)
    }

    /// One past the index of the last entity on this page
    pub fn end_index(&self) -> usize {
        self.start_index().saturating_add(self.page_size)
    }
}

/// Normalize a top-N limit; missing or non-positive limits become `fallback`.
pub fn normalize_limit(limit: Option<i64>, fallback: usize) -> usize {
    match limit {
        Some(l) if l > 0 => l as usize,
        _ => fallback,
    }
}

/// Size of the next upstream batch
pub fn batch_size(max_batch: usize, remaining: usize) -> usize {
    max_batch.min(remaining)
}

/// How many entities to collect from each partition in aggregate mode:
/// `clamp(ceil(required * buffer_factor), max_batch, max_batch * 10)`.
pub fn per_partition_target(required: usize, buffer_factor: f64, max_batch: usize) -> usize {
    let buffered = (required as f64 * buffer_factor).ceil();
    let buffered = if buffered.is_finite() && buffered > 0.0 {
        buffered as usize
    } else {
        0
    };
    buffered.clamp(max_batch, max_batch.saturating_mul(10))
}

/// Registry size at which aggregation stops visiting further partitions
pub fn aggregate_threshold(required: usize, max_batch: usize) -> usize {
    required.max(max_batch)
}

/// Entities to collect for a top-N walk limited to `pages` native batches.
///
/// Batches stop as soon as `limit` entities are in hand, so the walk covers
/// `ceil(limit / max_batch)` batches at most, never more than `pages`. A zero
/// `limit` asks for the whole hinted window.
pub fn hinted_target(limit: usize, pages: usize, max_batch: usize) -> usize {
    let window = pages.max(1).saturating_mul(max_batch);
    if limit == 0 || max_batch == 0 {
        return window;
    }
    window.min(limit.div_ceil(max_batch).saturating_mul(max_batch))
}

/// Number of pages needed to show `total` entities, never less than one
pub fn total_pages(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 1;
    }
    total.div_ceil(page_size).max(1)
}

/// Copy out `items[start..start + len]`, clipped to the available range.
pub fn window<T: Clone>(items: &[T], start: usize, len: usize) -> Vec<T> {
    if start >= items.len() {
        return Vec::new();
    }
    let end = start.saturating_add(len).min(items.len());
    items[start..end].to_vec()
}

/// Native pages (1-indexed, inclusive) covering `[offset, offset + limit)` on
/// a backend with a fixed page size. `None` when nothing is requested.
pub fn native_page_span(offset: usize, limit: usize, native_size: usize) -> Option<(usize, usize)> {
    if limit == 0 || native_size == 0 {
        return None;
    }
    let first = offset / native_size + 1;
    let last = (offset + limit).div_ceil(native_size);
    Some((first, last))
}
